use std::cell::RefCell;
use std::rc::Rc;

use crate::canvas::{Canvas, Cursor, PageElement, ScrollRequest};
use crate::geometry::{Insets, Rect, Size};
use crate::viewer::Direction;

#[derive(Debug)]
struct CanvasState {
    rect: Rect,
    padding: Insets,
    scroll_left: f64,
    scroll_top: f64,
    /// Scrollable extent; unbounded until set
    content: Option<Size>,
    cursor: Cursor,
    requests: Vec<ScrollRequest>,
}

impl CanvasState {
    fn clamp_left(&self, value: f64) -> f64 {
        let max = self
            .content
            .map_or(f64::INFINITY, |c| (c.width - self.rect.width).max(0.0));
        value.clamp(0.0, max)
    }

    fn clamp_top(&self, value: f64) -> f64 {
        let max = self
            .content
            .map_or(f64::INFINITY, |c| (c.height - self.rect.height).max(0.0));
        value.clamp(0.0, max)
    }
}

/// In-memory canvas for the CLI and tests.
///
/// Handles are cheap clones sharing one state, so a test can keep one and
/// hand another to the viewer.
#[derive(Clone, Debug)]
pub struct HeadlessCanvas {
    state: Rc<RefCell<CanvasState>>,
}

impl HeadlessCanvas {
    pub fn new(rect: Rect) -> Self {
        Self {
            state: Rc::new(RefCell::new(CanvasState {
                rect,
                padding: Insets::default(),
                scroll_left: 0.0,
                scroll_top: 0.0,
                content: None,
                cursor: Cursor::Default,
                requests: Vec::new(),
            })),
        }
    }

    #[must_use]
    pub fn with_padding(self, padding: Insets) -> Self {
        self.state.borrow_mut().padding = padding;
        self
    }

    /// A boxed handle sharing this canvas, for `Viewer::attach_canvas`
    pub fn boxed(&self) -> Box<dyn Canvas> {
        Box::new(self.clone())
    }

    pub fn set_content_size(&self, size: Size) {
        self.state.borrow_mut().content = Some(size);
    }

    pub fn resize(&self, width: f64, height: f64) {
        let mut state = self.state.borrow_mut();
        state.rect.width = width;
        state.rect.height = height;
    }

    /// Move the scroll offsets directly, as a user scrolling would
    pub fn scroll_to_position(&self, left: f64, top: f64) {
        let mut state = self.state.borrow_mut();
        state.scroll_left = state.clamp_left(left);
        state.scroll_top = state.clamp_top(top);
    }

    pub fn scroll_position(&self) -> (f64, f64) {
        let state = self.state.borrow();
        (state.scroll_left, state.scroll_top)
    }

    pub fn cursor(&self) -> Cursor {
        self.state.borrow().cursor
    }

    /// Every `scroll_to` request received, oldest first
    pub fn scroll_requests(&self) -> Vec<ScrollRequest> {
        self.state.borrow().requests.clone()
    }

    /// An element positioned at `content_rect` in scroll-content coordinates
    pub fn element(&self, content_rect: Rect) -> HeadlessElement {
        HeadlessElement {
            canvas: Rc::clone(&self.state),
            content_rect,
        }
    }

    /// Lay `sizes` out one after another along `direction`, starting at the padding edge.
    ///
    /// Also records the resulting scrollable content size.
    pub fn stack(&self, sizes: &[Size], direction: Direction, gap: f64) -> Vec<HeadlessElement> {
        let padding = self.state.borrow().padding;
        let rects = stack_layout(sizes, direction, gap, padding);

        let (mut width, mut height) = (0.0_f64, 0.0_f64);
        for rect in &rects {
            width = width.max(rect.right() + padding.right);
            height = height.max(rect.bottom() + padding.bottom);
        }
        self.set_content_size(Size::new(width, height));

        rects.into_iter().map(|rect| self.element(rect)).collect()
    }
}

impl Canvas for HeadlessCanvas {
    fn bounding_rect(&self) -> Rect {
        self.state.borrow().rect
    }

    fn client_size(&self) -> Size {
        let rect = self.state.borrow().rect;
        Size::new(rect.width, rect.height)
    }

    fn padding(&self) -> Insets {
        self.state.borrow().padding
    }

    fn scroll_left(&self) -> f64 {
        self.state.borrow().scroll_left
    }

    fn scroll_top(&self) -> f64 {
        self.state.borrow().scroll_top
    }

    fn set_scroll_left(&mut self, value: f64) {
        let mut state = self.state.borrow_mut();
        state.scroll_left = state.clamp_left(value);
    }

    fn set_scroll_top(&mut self, value: f64) {
        let mut state = self.state.borrow_mut();
        state.scroll_top = state.clamp_top(value);
    }

    // No animation: smooth requests land immediately
    fn scroll_to(&mut self, request: ScrollRequest) {
        let mut state = self.state.borrow_mut();
        state.requests.push(request);
        if let Some(left) = request.left {
            state.scroll_left = state.clamp_left(left);
        }
        if let Some(top) = request.top {
            state.scroll_top = state.clamp_top(top);
        }
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.state.borrow_mut().cursor = cursor;
    }
}

/// A page element that moves with its canvas's scroll offset
#[derive(Clone, Debug)]
pub struct HeadlessElement {
    canvas: Rc<RefCell<CanvasState>>,
    content_rect: Rect,
}

impl HeadlessElement {
    pub fn boxed(&self) -> Box<dyn PageElement> {
        Box::new(self.clone())
    }

    pub fn content_rect(&self) -> Rect {
        self.content_rect
    }
}

impl PageElement for HeadlessElement {
    fn bounding_rect(&self) -> Rect {
        let canvas = self.canvas.borrow();
        Rect::new(
            canvas.rect.x + self.content_rect.x - canvas.scroll_left,
            canvas.rect.y + self.content_rect.y - canvas.scroll_top,
            self.content_rect.width,
            self.content_rect.height,
        )
    }
}

/// Positions for `sizes` stacked along `direction` with `gap` between them
pub fn stack_layout(sizes: &[Size], direction: Direction, gap: f64, padding: Insets) -> Vec<Rect> {
    let mut offset = match direction {
        Direction::Vertical => padding.top,
        Direction::Horizontal => padding.left,
    };

    sizes
        .iter()
        .map(|size| {
            let rect = match direction {
                Direction::Vertical => Rect::new(padding.left, offset, size.width, size.height),
                Direction::Horizontal => Rect::new(offset, padding.top, size.width, size.height),
            };
            offset += match direction {
                Direction::Vertical => size.height,
                Direction::Horizontal => size.width,
            } + gap;
            rect
        })
        .collect()
}
