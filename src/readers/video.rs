use std::sync::Arc;

use log::debug;

use super::{MetadataProbe, PageReader, ReaderKind, extension};
use crate::error::ReaderError;
use crate::page::{Page, RenderOptions, Renderable};

const EXTENSIONS: &[&str] = &["mp4", "webm", "ogg", "mov", "mkv", "avi"];

pub const KIND: ReaderKind = ReaderKind {
    name: "video",
    can_handle: VideoReader::can_handle,
    build,
};

fn build(url: &str, probe: Arc<dyn MetadataProbe>) -> Box<dyn PageReader> {
    Box::new(VideoReader::new(url, probe))
}

/// A single page sized to the video's frame
pub struct VideoReader {
    url: String,
    probe: Arc<dyn MetadataProbe>,
}

impl VideoReader {
    pub fn new(url: impl Into<String>, probe: Arc<dyn MetadataProbe>) -> Self {
        Self {
            url: url.into(),
            probe,
        }
    }

    pub fn can_handle(url: &str) -> bool {
        EXTENSIONS.contains(&extension(url).as_str())
    }
}

impl PageReader for VideoReader {
    fn pages(&self) -> Result<Vec<Page>, ReaderError> {
        let size = self.probe.dimensions(&self.url)?;
        debug!("Video {} is {}x{}", self.url, size.width, size.height);

        let src = self.url.clone();
        let page = Page::new(size.width, size.height, move |options: &RenderOptions| {
            Renderable::Video {
                src: src.clone(),
                controls: options.controls,
                autoplay: options.autoplay,
                muted: options.muted,
                looping: options.looping,
            }
        });
        Ok(vec![page])
    }
}
