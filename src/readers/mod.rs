pub mod audio;
pub mod image;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod video;
pub mod youtube;

use std::path::PathBuf;
use std::sync::Arc;

use log::debug;
use url::Url;

use crate::error::ReaderError;
use crate::geometry::Size;
use crate::page::Page;

pub use audio::AudioReader;
pub use image::ImageReader;
#[cfg(feature = "pdf")]
pub use pdf::PdfReader;
pub use video::VideoReader;
pub use youtube::YoutubeReader;

/// Produces the pages of one source
pub trait PageReader: Send + Sync {
    fn pages(&self) -> Result<Vec<Page>, ReaderError>;

    fn page(&self, index: usize) -> Result<Page, ReaderError> {
        let pages = self.pages()?;
        let count = pages.len();
        pages
            .into_iter()
            .nth(index)
            .ok_or(ReaderError::PageOutOfRange { index, count })
    }
}

/// Intrinsic dimensions of media this crate cannot decode itself
pub trait MetadataProbe: Send + Sync {
    fn dimensions(&self, url: &str) -> Result<Size, ReaderError>;
}

/// Reports no metadata for anything
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProbe;

impl MetadataProbe for NoProbe {
    fn dimensions(&self, url: &str) -> Result<Size, ReaderError> {
        Err(ReaderError::MetadataUnavailable(url.to_string()))
    }
}

/// Reports the same dimensions for every URL
#[derive(Clone, Copy, Debug)]
pub struct FixedProbe(pub Size);

impl MetadataProbe for FixedProbe {
    fn dimensions(&self, _url: &str) -> Result<Size, ReaderError> {
        Ok(self.0)
    }
}

pub type ReaderBuilder = fn(&str, Arc<dyn MetadataProbe>) -> Box<dyn PageReader>;

/// A reader type: which URLs it accepts and how to build one
#[derive(Clone, Copy)]
pub struct ReaderKind {
    pub name: &'static str,
    pub can_handle: fn(&str) -> bool,
    pub build: ReaderBuilder,
}

impl std::fmt::Debug for ReaderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ReaderKind").field(&self.name).finish()
    }
}

/// Reader kinds in selection order
pub fn default_kinds() -> Vec<ReaderKind> {
    let mut kinds = Vec::with_capacity(5);
    #[cfg(feature = "pdf")]
    kinds.push(pdf::KIND);
    kinds.extend([image::KIND, video::KIND, audio::KIND, youtube::KIND]);
    kinds
}

/// Picks the first reader kind whose `can_handle` accepts a URL
pub struct ReaderRegistry {
    kinds: Vec<ReaderKind>,
    probe: Arc<dyn MetadataProbe>,
}

impl ReaderRegistry {
    pub fn new(probe: impl MetadataProbe + 'static) -> Self {
        Self::with_kinds(default_kinds(), probe)
    }

    pub fn with_kinds(kinds: Vec<ReaderKind>, probe: impl MetadataProbe + 'static) -> Self {
        Self {
            kinds,
            probe: Arc::new(probe),
        }
    }

    pub fn kinds(&self) -> &[ReaderKind] {
        &self.kinds
    }

    /// First kind whose probe accepts `url`
    pub fn select(&self, url: &str) -> Result<&ReaderKind, ReaderError> {
        self.kinds
            .iter()
            .find(|kind| (kind.can_handle)(url))
            .ok_or_else(|| ReaderError::NoReader(url.to_string()))
    }

    pub fn open(&self, url: &str) -> Result<Box<dyn PageReader>, ReaderError> {
        let kind = self.select(url)?;
        debug!("Using {} reader for {url}", kind.name);
        Ok((kind.build)(url, Arc::clone(&self.probe)))
    }

    /// One reader per URL; several are wrapped in a `CompositeReader`
    pub fn open_all<S: AsRef<str>>(&self, urls: &[S]) -> Result<Box<dyn PageReader>, ReaderError> {
        let mut readers = urls
            .iter()
            .map(|url| self.open(url.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        if readers.len() == 1 {
            if let Some(reader) = readers.pop() {
                return Ok(reader);
            }
        }
        Ok(Box::new(CompositeReader::new(readers)))
    }
}

impl Default for ReaderRegistry {
    fn default() -> Self {
        Self::new(NoProbe)
    }
}

/// Pages of several readers, flattened in order
pub struct CompositeReader {
    readers: Vec<Box<dyn PageReader>>,
}

impl CompositeReader {
    pub fn new(readers: Vec<Box<dyn PageReader>>) -> Self {
        Self { readers }
    }
}

impl PageReader for CompositeReader {
    fn pages(&self) -> Result<Vec<Page>, ReaderError> {
        let mut pages = Vec::new();
        for reader in &self.readers {
            pages.extend(reader.pages()?);
        }
        Ok(pages)
    }
}

fn url_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) if parsed.scheme().len() > 1 => parsed.path().to_string(),
        _ => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    }
}

/// Lower-cased extension of the URL's last path segment, ignoring query and fragment
pub fn extension(url: &str) -> String {
    let path = url_path(url);
    let name = path.rsplit(['/', '\\']).next().unwrap_or_default();
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Filesystem path for plain paths and `file://` URLs; `None` for remote sources
pub fn local_path(url: &str) -> Option<PathBuf> {
    match Url::parse(url) {
        Ok(parsed) if parsed.scheme() == "file" => parsed.to_file_path().ok(),
        Ok(parsed) if parsed.scheme().len() > 1 => None,
        _ => Some(PathBuf::from(url)),
    }
}
