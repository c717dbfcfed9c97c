use serde::{Deserialize, Serialize};

use crate::geometry::{Insets, Rect, Size};

/// How a programmatic scroll should move
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollBehavior {
    Auto,
    #[default]
    Smooth,
    Instant,
}

/// A `scrollTo` request; `None` leaves that axis alone
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollRequest {
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub behavior: ScrollBehavior,
}

/// Pointer cursor shown over the canvas
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Cursor {
    #[default]
    Default,
    Grab,
    Grabbing,
}

/// The scrollable container hosting every page
pub trait Canvas {
    /// Position and size in viewport coordinates
    fn bounding_rect(&self) -> Rect;

    /// Inner size excluding scrollbars, including padding
    fn client_size(&self) -> Size;

    fn padding(&self) -> Insets;

    /// Space left for content once padding and (reserved) scrollbars are removed
    fn content_box(&self) -> Size {
        let client = self.client_size();
        let padding = self.padding();
        Size::new(
            client.width - padding.horizontal(),
            client.height - padding.vertical(),
        )
    }

    fn scroll_left(&self) -> f64;

    fn scroll_top(&self) -> f64;

    fn set_scroll_left(&mut self, value: f64);

    fn set_scroll_top(&mut self, value: f64);

    fn scroll_to(&mut self, request: ScrollRequest);

    fn set_cursor(&mut self, cursor: Cursor);
}

/// The wrapping element of a single page
pub trait PageElement {
    fn bounding_rect(&self) -> Rect;
}
