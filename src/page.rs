use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Options passed to a page's renderer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Raster scale for documents (usually the current zoom)
    pub scale: f64,
    pub controls: bool,
    pub autoplay: bool,
    pub muted: bool,
    #[serde(rename = "loop")]
    pub looping: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            controls: true,
            autoplay: false,
            muted: false,
            looping: false,
        }
    }
}

/// Declarative description of what a page displays.
///
/// The presentation layer turns this into real pixels; the viewer core
/// never looks inside.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Renderable {
    Image {
        src: String,
    },
    PdfPage {
        src: String,
        index: usize,
        scale: f64,
    },
    Video {
        src: String,
        controls: bool,
        autoplay: bool,
        muted: bool,
        looping: bool,
    },
    Audio {
        src: String,
        controls: bool,
        autoplay: bool,
        looping: bool,
    },
    Embed {
        src: String,
    },
}

/// Produces a renderable for a page
pub trait PageRenderer: Send + Sync {
    fn render(&self, options: &RenderOptions) -> Renderable;
}

impl<F> PageRenderer for F
where
    F: Fn(&RenderOptions) -> Renderable + Send + Sync,
{
    fn render(&self, options: &RenderOptions) -> Renderable {
        self(options)
    }
}

/// One renderable unit with intrinsic dimensions
#[derive(Clone)]
pub struct Page {
    pub width: f64,
    pub height: f64,
    renderer: Arc<dyn PageRenderer>,
}

impl Page {
    pub fn new(width: f64, height: f64, renderer: impl PageRenderer + 'static) -> Self {
        Self {
            width,
            height,
            renderer: Arc::new(renderer),
        }
    }

    pub fn render(&self, options: &RenderOptions) -> Renderable {
        self.renderer.render(options)
    }

    /// Same renderer, rescaled intrinsic size
    #[must_use]
    pub fn scaled(&self, scale: f64) -> Self {
        Self {
            width: self.width * scale,
            height: self.height * scale,
            renderer: Arc::clone(&self.renderer),
        }
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Which intrinsic dimension to align across pages
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Width,
    Height,
}

/// Rescale every page so `dimension` matches the first page, keeping aspect ratio.
///
/// Fewer than two pages, or `None`, passes the list through untouched.
pub fn normalize_pages(pages: Vec<Page>, dimension: Option<Dimension>) -> Vec<Page> {
    let Some(dimension) = dimension else {
        return pages;
    };
    if pages.len() <= 1 {
        return pages;
    }

    let (ref_width, ref_height) = (pages[0].width, pages[0].height);
    pages
        .into_iter()
        .map(|page| {
            let scale = match dimension {
                Dimension::Width => ref_width / page.width,
                Dimension::Height => ref_height / page.height,
            };
            if scale == 1.0 || !scale.is_finite() {
                page
            } else {
                page.scaled(scale)
            }
        })
        .collect()
}

/// Renderer for a still image at `src`
pub(crate) fn image_renderer(src: String) -> impl PageRenderer {
    move |_: &RenderOptions| Renderable::Image { src: src.clone() }
}
