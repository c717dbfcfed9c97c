use std::sync::Arc;

use super::{MetadataProbe, PageReader, ReaderKind, extension};
use crate::error::ReaderError;
use crate::page::{Page, RenderOptions, Renderable};

const EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "aac", "flac", "webm", "m4a", "opus"];

/// Size of a stock audio control strip
pub const AUDIO_WIDTH: f64 = 400.0;
pub const AUDIO_HEIGHT: f64 = 54.0;

pub const KIND: ReaderKind = ReaderKind {
    name: "audio",
    can_handle: AudioReader::can_handle,
    build,
};

fn build(url: &str, _probe: Arc<dyn MetadataProbe>) -> Box<dyn PageReader> {
    Box::new(AudioReader::new(url))
}

/// A single fixed-size page holding an audio player
#[derive(Clone, Debug)]
pub struct AudioReader {
    url: String,
}

impl AudioReader {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn can_handle(url: &str) -> bool {
        EXTENSIONS.contains(&extension(url).as_str())
    }
}

impl PageReader for AudioReader {
    fn pages(&self) -> Result<Vec<Page>, ReaderError> {
        let src = self.url.clone();
        let page = Page::new(AUDIO_WIDTH, AUDIO_HEIGHT, move |options: &RenderOptions| {
            Renderable::Audio {
                src: src.clone(),
                controls: options.controls,
                autoplay: options.autoplay,
                looping: options.looping,
            }
        });
        Ok(vec![page])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_size_and_playback_options() {
        let pages = AudioReader::new("podcast.mp3").pages().unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!((pages[0].width, pages[0].height), (400.0, 54.0));

        let options = RenderOptions {
            looping: true,
            ..RenderOptions::default()
        };
        assert_eq!(
            pages[0].render(&options),
            Renderable::Audio {
                src: "podcast.mp3".into(),
                controls: true,
                autoplay: false,
                looping: true,
            }
        );
    }
}
