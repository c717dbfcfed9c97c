use std::sync::Arc;

use log::{debug, warn};

use super::{MetadataProbe, PageReader, ReaderKind, extension, local_path};
use crate::error::ReaderError;
use crate::geometry::Size;
use crate::page::{Page, image_renderer};

const EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "svg", "bmp", "avif", "ico",
];

pub const KIND: ReaderKind = ReaderKind {
    name: "image",
    can_handle: ImageReader::can_handle,
    build,
};

fn build(url: &str, probe: Arc<dyn MetadataProbe>) -> Box<dyn PageReader> {
    Box::new(ImageReader::new(url, probe))
}

/// A single page at the image's natural size.
///
/// Local files are measured from their header; remote images go through the probe.
pub struct ImageReader {
    url: String,
    probe: Arc<dyn MetadataProbe>,
}

impl ImageReader {
    pub fn new(url: impl Into<String>, probe: Arc<dyn MetadataProbe>) -> Self {
        Self {
            url: url.into(),
            probe,
        }
    }

    pub fn can_handle(url: &str) -> bool {
        EXTENSIONS.contains(&extension(url).as_str())
    }

    fn natural_size(&self) -> Result<Size, ReaderError> {
        let Some(path) = local_path(&self.url) else {
            return self.probe.dimensions(&self.url);
        };

        // Header read only, no pixel decoding
        match imagesize::size(&path) {
            Ok(size) => {
                debug!("Image {path:?} size: {}x{}", size.width, size.height);
                Ok(Size::new(size.width as f64, size.height as f64))
            }
            Err(e) => {
                warn!("Failed to get image size from {path:?}: {e}");
                Err(ReaderError::decode(path, e.to_string()))
            }
        }
    }
}

impl PageReader for ImageReader {
    fn pages(&self) -> Result<Vec<Page>, ReaderError> {
        let size = self.natural_size()?;
        Ok(vec![Page::new(
            size.width,
            size.height,
            image_renderer(self.url.clone()),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{RenderOptions, Renderable};
    use crate::readers::{FixedProbe, NoProbe};
    use std::io::Write;

    /// Signature plus IHDR chunk; enough for a header-only size read
    fn png_header(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes
    }

    #[test]
    fn measures_local_png() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(&png_header(320, 240)).unwrap();
        let url = file.path().to_string_lossy().into_owned();

        let pages = ImageReader::new(url.clone(), Arc::new(NoProbe)).pages().unwrap();
        assert_eq!((pages[0].width, pages[0].height), (320.0, 240.0));
        assert_eq!(
            pages[0].render(&RenderOptions::default()),
            Renderable::Image { src: url }
        );
    }

    #[test]
    fn unreadable_local_file_is_a_decode_error() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"plain text").unwrap();
        let reader = ImageReader::new(file.path().to_string_lossy(), Arc::new(NoProbe));
        assert!(matches!(reader.pages(), Err(ReaderError::Decode { .. })));
    }

    #[test]
    fn remote_images_use_probe() {
        let probe = Arc::new(FixedProbe(Size::new(800.0, 600.0)));
        let reader = ImageReader::new("https://example.com/cover.webp", probe);
        let page = reader.page(0).unwrap();
        assert_eq!((page.width, page.height), (800.0, 600.0));
    }
}
