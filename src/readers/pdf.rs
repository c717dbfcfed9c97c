use std::path::PathBuf;
use std::sync::Arc;

use log::debug;
use mupdf::Document;

use super::{MetadataProbe, PageReader, ReaderKind, extension, local_path};
use crate::error::ReaderError;
use crate::page::{Page, RenderOptions, Renderable};

pub const KIND: ReaderKind = ReaderKind {
    name: "pdf",
    can_handle: PdfReader::can_handle,
    build,
};

fn build(url: &str, _probe: Arc<dyn MetadataProbe>) -> Box<dyn PageReader> {
    Box::new(PdfReader::new(url))
}

/// Reads page sizes at scale 1; rasterizing is left to the presentation layer
#[derive(Clone, Debug)]
pub struct PdfReader {
    url: String,
}

impl PdfReader {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn can_handle(url: &str) -> bool {
        extension(url) == "pdf"
    }

    // Documents are not shared across threads, so each call opens its own
    fn open(&self) -> Result<(PathBuf, Document), ReaderError> {
        let path = local_path(&self.url)
            .ok_or_else(|| ReaderError::decode(&self.url, "remote PDFs are not supported"))?;
        let doc = Document::open(path.to_string_lossy().as_ref())?;
        Ok((path, doc))
    }

    fn page_at(&self, doc: &Document, index: usize) -> Result<Page, ReaderError> {
        let page = doc.load_page(index as i32)?;
        let bounds = page.bounds()?;
        let (width, height) = (
            f64::from(bounds.x1 - bounds.x0),
            f64::from(bounds.y1 - bounds.y0),
        );

        let src = self.url.clone();
        Ok(Page::new(width, height, move |options: &RenderOptions| {
            Renderable::PdfPage {
                src: src.clone(),
                index,
                scale: options.scale,
            }
        }))
    }
}

impl PageReader for PdfReader {
    fn pages(&self) -> Result<Vec<Page>, ReaderError> {
        let (path, doc) = self.open()?;
        let count = doc.page_count()?.max(0) as usize;
        debug!("Opened {path:?}: {count} pages");
        (0..count).map(|index| self.page_at(&doc, index)).collect()
    }

    fn page(&self, index: usize) -> Result<Page, ReaderError> {
        let (_, doc) = self.open()?;
        let count = doc.page_count()?.max(0) as usize;
        if index >= count {
            return Err(ReaderError::PageOutOfRange { index, count });
        }
        self.page_at(&doc, index)
    }
}
