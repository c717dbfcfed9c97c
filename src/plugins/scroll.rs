use log::debug;
use serde::Deserialize;

use super::{Plugin, unhandled};
use crate::canvas::{Cursor, ScrollBehavior, ScrollRequest};
use crate::command::{Command, CommandKind, CommandOutput};
use crate::error::ViewerError;
use crate::event::{EventKind, EventPayload, EventTarget, Key, ViewerEvent};
use crate::geometry::{Axis, Rect};
use crate::plugins::page::ScrollAnchor;
use crate::storage::{ScrollState, StorageValue};
use crate::viewer::{PluginContext, ViewerState};

const LISTENED: [EventKind; 7] = [
    EventKind::KeyDown,
    EventKind::KeyUp,
    EventKind::PointerEnter,
    EventKind::PointerLeave,
    EventKind::PointerDown,
    EventKind::PointerMove,
    EventKind::PointerUp,
];

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScrollOptions {
    /// Holding this key over the canvas enables drag temporarily
    pub drag_key: Option<Key>,
    pub drag_enabled: bool,
    pub default_align: ScrollAnchor,
    pub default_behavior: ScrollBehavior,
}

impl ScrollOptions {
    pub fn space_to_drag() -> Self {
        Self {
            drag_key: Some(Key::Space),
            ..Self::default()
        }
    }
}

/// Scroll offset that aligns `page` with `canvas` at `align` along `axis`.
///
/// Both rects are in viewport coordinates; `scroll` is the canvas's
/// current offset on that axis.
pub fn alignment_offset(
    canvas: &Rect,
    page: &Rect,
    scroll: f64,
    axis: Axis,
    align: ScrollAnchor,
) -> f64 {
    let delta = page.start(axis) - canvas.start(axis) + scroll;
    match align {
        ScrollAnchor::Start => delta,
        ScrollAnchor::Center => delta - canvas.extent(axis) / 2.0 + page.extent(axis) / 2.0,
        ScrollAnchor::End => delta - canvas.extent(axis) + page.extent(axis),
    }
}

/// Drag is either enabled permanently or held on by a configured key while
/// the pointer is over the canvas. The cursor mirrors the drag state but is
/// not part of the storage slice.
#[derive(Default)]
pub struct ScrollPlugin {
    options: ScrollOptions,
    pointer_over: bool,
    key_held: bool,
    last_x: f64,
    last_y: f64,
}

impl ScrollPlugin {
    pub const NAME: &'static str = "scroll";

    const COMMANDS: &'static [CommandKind] = &[
        CommandKind::EnableDrag,
        CommandKind::DisableDrag,
        CommandKind::ToggleDrag,
        CommandKind::ScrollToPage,
        CommandKind::SetScrollX,
        CommandKind::SetScrollY,
        CommandKind::SetScroll,
        CommandKind::GetScrollX,
        CommandKind::GetScrollY,
    ];

    pub fn new(options: ScrollOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    fn current(state: &ViewerState) -> ScrollState {
        state
            .storage(Self::NAME)
            .and_then(StorageValue::as_scroll)
            .unwrap_or_default()
    }

    fn can_drag(&self, state: &ViewerState) -> bool {
        self.key_held || Self::current(state).drag_enabled
    }

    fn set_cursor(ctx: &mut PluginContext<'_>, cursor: Cursor) {
        if let Some(canvas) = ctx.canvas_mut() {
            canvas.set_cursor(cursor);
        }
    }

    fn idle_cursor(drag_possible: bool) -> Cursor {
        if drag_possible { Cursor::Grab } else { Cursor::Default }
    }

    fn stop_dragging(ctx: &mut PluginContext<'_>) {
        let state = Self::current(ctx);
        if state.dragging {
            ctx.update_storage(StorageValue::Scroll(ScrollState {
                dragging: false,
                ..state
            }));
        }
    }

    fn scroll_to(
        &self,
        ctx: &mut PluginContext<'_>,
        left: Option<f64>,
        top: Option<f64>,
        behavior: Option<ScrollBehavior>,
    ) {
        let behavior = behavior.unwrap_or(self.options.default_behavior);
        if let Some(canvas) = ctx.canvas_mut() {
            canvas.scroll_to(ScrollRequest {
                left,
                top,
                behavior,
            });
        }
    }

    fn scroll_to_page(
        &self,
        ctx: &mut PluginContext<'_>,
        page: usize,
        align: Option<ScrollAnchor>,
        behavior: Option<ScrollBehavior>,
    ) -> CommandOutput {
        let (Some(canvas), Some(element)) = (ctx.canvas(), ctx.page_element(page)) else {
            debug!("scrollToPage({page}) skipped: canvas or page element missing");
            return CommandOutput::None;
        };

        let axis = ctx.direction().axis();
        let scroll = match axis {
            Axis::Horizontal => canvas.scroll_left(),
            Axis::Vertical => canvas.scroll_top(),
        };
        let offset = alignment_offset(
            &canvas.bounding_rect(),
            &element.bounding_rect(),
            scroll,
            axis,
            align.unwrap_or(self.options.default_align),
        );

        match axis {
            Axis::Horizontal => self.scroll_to(ctx, Some(offset), None, behavior),
            Axis::Vertical => self.scroll_to(ctx, None, Some(offset), behavior),
        }
        ctx.invoke_if_present(Command::SetPage(page));
        CommandOutput::Offset(offset)
    }

    fn on_key_down(&mut self, key: Key, target: EventTarget, ctx: &mut PluginContext<'_>) {
        if self.options.drag_key != Some(key) || target == EventTarget::TextInput {
            return;
        }
        if !self.pointer_over || self.key_held {
            return;
        }
        self.key_held = true;
        Self::set_cursor(ctx, Cursor::Grab);
    }

    fn on_key_up(&mut self, key: Key, ctx: &mut PluginContext<'_>) {
        if self.options.drag_key != Some(key) || !self.key_held {
            return;
        }
        self.key_held = false;
        Self::stop_dragging(ctx);
        let enabled = Self::current(ctx).drag_enabled;
        Self::set_cursor(ctx, Self::idle_cursor(enabled));
    }

    fn on_pointer_leave(&mut self, ctx: &mut PluginContext<'_>) {
        self.pointer_over = false;
        Self::stop_dragging(ctx);
        let enabled = Self::current(ctx).drag_enabled;
        Self::set_cursor(ctx, Self::idle_cursor(enabled));
    }

    fn on_pointer_down(&mut self, x: f64, y: f64, ctx: &mut PluginContext<'_>) {
        if !self.can_drag(ctx) {
            return;
        }
        let state = Self::current(ctx);
        ctx.update_storage(StorageValue::Scroll(ScrollState {
            dragging: true,
            ..state
        }));
        self.last_x = x;
        self.last_y = y;
        Self::set_cursor(ctx, Cursor::Grabbing);
    }

    fn on_pointer_move(&mut self, x: f64, y: f64, ctx: &mut PluginContext<'_>) {
        if !Self::current(ctx).dragging {
            return;
        }
        let Some(canvas) = ctx.canvas_mut() else {
            return;
        };
        // Content follows the pointer
        let left = canvas.scroll_left() - (x - self.last_x);
        let top = canvas.scroll_top() - (y - self.last_y);
        canvas.set_scroll_left(left);
        canvas.set_scroll_top(top);
        self.last_x = x;
        self.last_y = y;
    }

    fn on_pointer_up(&mut self, ctx: &mut PluginContext<'_>) {
        if !Self::current(ctx).dragging {
            return;
        }
        Self::stop_dragging(ctx);
        let drag_possible = self.can_drag(ctx);
        Self::set_cursor(ctx, Self::idle_cursor(drag_possible));
    }
}

impl Plugin for ScrollPlugin {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn commands(&self) -> &'static [CommandKind] {
        Self::COMMANDS
    }

    fn initial_storage(&self) -> StorageValue {
        StorageValue::Scroll(ScrollState {
            drag_enabled: self.options.drag_enabled,
            dragging: false,
        })
    }

    fn execute(
        &mut self,
        command: &Command,
        ctx: &mut PluginContext<'_>,
    ) -> Result<CommandOutput, ViewerError> {
        match command {
            Command::EnableDrag => {
                let state = Self::current(ctx);
                ctx.update_storage(StorageValue::Scroll(ScrollState {
                    drag_enabled: true,
                    ..state
                }));
                Self::set_cursor(ctx, Cursor::Grab);
            }
            Command::DisableDrag => {
                ctx.update_storage(StorageValue::Scroll(ScrollState {
                    drag_enabled: false,
                    dragging: false,
                }));
                Self::set_cursor(ctx, Cursor::Default);
            }
            Command::ToggleDrag => {
                if Self::current(ctx).drag_enabled {
                    ctx.invoke(Command::DisableDrag);
                } else {
                    ctx.invoke(Command::EnableDrag);
                }
            }
            Command::ScrollToPage {
                page,
                align,
                behavior,
            } => return Ok(self.scroll_to_page(ctx, *page, *align, *behavior)),
            Command::SetScrollX { x, behavior } => self.scroll_to(ctx, Some(*x), None, *behavior),
            Command::SetScrollY { y, behavior } => self.scroll_to(ctx, None, Some(*y), *behavior),
            Command::SetScroll { x, y, behavior } => {
                self.scroll_to(ctx, Some(*x), Some(*y), *behavior)
            }
            Command::GetScrollX => {
                let x = ctx.canvas().map_or(0.0, |c| c.scroll_left());
                return Ok(CommandOutput::Offset(x));
            }
            Command::GetScrollY => {
                let y = ctx.canvas().map_or(0.0, |c| c.scroll_top());
                return Ok(CommandOutput::Offset(y));
            }
            other => return unhandled(Self::NAME, other),
        }
        Ok(CommandOutput::None)
    }

    fn on_pages_loaded(&mut self, ctx: &mut PluginContext<'_>) {
        for kind in LISTENED {
            ctx.listen(kind);
        }
        if Self::current(ctx).drag_enabled {
            Self::set_cursor(ctx, Cursor::Grab);
        }
    }

    fn handle_event(&mut self, event: &ViewerEvent, ctx: &mut PluginContext<'_>) {
        match event.payload {
            EventPayload::KeyDown { key, target } => self.on_key_down(key, target, ctx),
            EventPayload::KeyUp { key } => self.on_key_up(key, ctx),
            EventPayload::PointerEnter { target } => {
                if ctx.canvas().is_some() && target == EventTarget::Canvas {
                    self.pointer_over = true;
                }
            }
            EventPayload::PointerLeave { target } => {
                if ctx.canvas().is_some() && target == EventTarget::Canvas {
                    self.on_pointer_leave(ctx);
                }
            }
            EventPayload::PointerDown { x, y } => self.on_pointer_down(x, y, ctx),
            EventPayload::PointerMove { x, y } => self.on_pointer_move(x, y, ctx),
            EventPayload::PointerUp => self.on_pointer_up(ctx),
            EventPayload::Scroll | EventPayload::Wheel => {}
        }
    }

    fn on_cleanup(&mut self, ctx: &mut PluginContext<'_>) {
        ctx.unlisten_all();
        self.pointer_over = false;
        self.key_held = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::headless::HeadlessCanvas;
    use crate::page::{Page, RenderOptions, Renderable};
    use crate::plugins::PluginSpec;
    use crate::viewer::{Direction, Viewer};

    fn page(width: f64, height: f64) -> Page {
        Page::new(width, height, |_: &RenderOptions| Renderable::Image {
            src: "p.png".into(),
        })
    }

    fn scroll_viewer(options: ScrollOptions) -> (Viewer, HeadlessCanvas) {
        let canvas = HeadlessCanvas::new(Rect::new(0.0, 0.0, 300.0, 300.0));
        let mut viewer = Viewer::new(vec![PluginSpec::Scroll(options)], Direction::Vertical);
        viewer.attach_canvas(canvas.boxed());
        viewer.set_pages(vec![page(500.0, 500.0); 4]);
        let sizes = vec![Size::new(500.0, 500.0); 4];
        for (i, element) in canvas.stack(&sizes, Direction::Vertical, 0.0).iter().enumerate() {
            viewer.attach_page_element(i, element.boxed());
        }
        viewer.on_pages_ready();
        (viewer, canvas)
    }

    #[test]
    fn alignment_offsets() {
        let canvas = Rect::new(0.0, 50.0, 200.0, 400.0);
        let page = Rect::new(0.0, 250.0, 200.0, 100.0);
        let axis = Axis::Vertical;
        assert_eq!(alignment_offset(&canvas, &page, 30.0, axis, ScrollAnchor::Start), 230.0);
        assert_eq!(alignment_offset(&canvas, &page, 30.0, axis, ScrollAnchor::Center), 80.0);
        assert_eq!(alignment_offset(&canvas, &page, 30.0, axis, ScrollAnchor::End), -70.0);
    }

    #[test]
    fn drag_moves_content_with_pointer() {
        let (mut viewer, canvas) = scroll_viewer(ScrollOptions::default());
        viewer.execute(Command::EnableDrag).unwrap();
        assert_eq!(canvas.cursor(), Cursor::Grab);
        canvas.scroll_to_position(100.0, 400.0);

        viewer.dispatch(&ViewerEvent::pointer_down(50.0, 50.0));
        assert!(viewer.scroll_state().unwrap().dragging);
        assert_eq!(canvas.cursor(), Cursor::Grabbing);

        viewer.dispatch(&ViewerEvent::pointer_move(40.0, 20.0));
        assert_eq!(canvas.scroll_position(), (110.0, 430.0));

        viewer.dispatch(&ViewerEvent::pointer_up());
        assert_eq!(
            viewer.scroll_state(),
            Some(ScrollState {
                drag_enabled: true,
                dragging: false
            })
        );
        assert_eq!(canvas.cursor(), Cursor::Grab);

        viewer.dispatch(&ViewerEvent::pointer_move(0.0, 0.0));
        assert_eq!(canvas.scroll_position(), (110.0, 430.0));
    }

    #[test]
    fn pointer_down_without_drag_does_nothing() {
        let (mut viewer, canvas) = scroll_viewer(ScrollOptions::default());
        viewer.dispatch(&ViewerEvent::pointer_down(50.0, 50.0));
        viewer.dispatch(&ViewerEvent::pointer_move(0.0, 0.0));
        assert!(!viewer.scroll_state().unwrap().dragging);
        assert_eq!(canvas.scroll_position(), (0.0, 0.0));
    }

    #[test]
    fn drag_key_works_only_over_canvas_and_outside_text_inputs() {
        let (mut viewer, canvas) = scroll_viewer(ScrollOptions::space_to_drag());

        viewer.dispatch(&ViewerEvent::key_down(Key::Space, EventTarget::Canvas));
        viewer.dispatch(&ViewerEvent::pointer_down(0.0, 0.0));
        assert!(!viewer.scroll_state().unwrap().dragging);

        viewer.dispatch(&ViewerEvent::pointer_enter(EventTarget::Canvas));
        viewer.dispatch(&ViewerEvent::key_down(Key::Space, EventTarget::TextInput));
        viewer.dispatch(&ViewerEvent::pointer_down(0.0, 0.0));
        assert!(!viewer.scroll_state().unwrap().dragging);

        viewer.dispatch(&ViewerEvent::key_down(Key::Space, EventTarget::Canvas));
        assert_eq!(canvas.cursor(), Cursor::Grab);
        viewer.dispatch(&ViewerEvent::pointer_down(0.0, 0.0));
        assert!(viewer.scroll_state().unwrap().dragging);

        // Releasing the key ends the drag
        viewer.dispatch(&ViewerEvent::key_up(Key::Space));
        assert!(!viewer.scroll_state().unwrap().dragging);
        assert_eq!(canvas.cursor(), Cursor::Default);
    }

    #[test]
    fn leaving_canvas_ends_drag() {
        let (mut viewer, canvas) = scroll_viewer(ScrollOptions {
            drag_enabled: true,
            ..ScrollOptions::default()
        });
        assert_eq!(canvas.cursor(), Cursor::Grab);
        viewer.dispatch(&ViewerEvent::pointer_enter(EventTarget::Canvas));
        viewer.dispatch(&ViewerEvent::pointer_down(0.0, 0.0));

        // Leaving a page element is not leaving the canvas
        viewer.dispatch(&ViewerEvent::pointer_leave(EventTarget::Page(0)));
        assert!(viewer.scroll_state().unwrap().dragging);

        viewer.dispatch(&ViewerEvent::pointer_leave(EventTarget::Canvas));
        assert!(!viewer.scroll_state().unwrap().dragging);
        assert_eq!(canvas.cursor(), Cursor::Grab);
    }

    #[test]
    fn toggle_drag_flips_and_disable_clears_dragging() {
        let (mut viewer, canvas) = scroll_viewer(ScrollOptions::default());
        viewer.execute(Command::ToggleDrag).unwrap();
        assert!(viewer.scroll_state().unwrap().drag_enabled);

        viewer.dispatch(&ViewerEvent::pointer_down(0.0, 0.0));
        viewer.execute(Command::ToggleDrag).unwrap();
        assert_eq!(viewer.scroll_state(), Some(ScrollState::default()));
        assert_eq!(canvas.cursor(), Cursor::Default);
    }

    #[test]
    fn scroll_to_page_center_vertical() {
        let (mut viewer, canvas) = scroll_viewer(ScrollOptions::default());
        canvas.scroll_to_position(0.0, 120.0);

        let out = viewer
            .execute(Command::ScrollToPage {
                page: 2,
                align: Some(ScrollAnchor::Center),
                behavior: Some(ScrollBehavior::Instant),
            })
            .unwrap();

        // page top relative to canvas (1000 - 120) + scroll 120 - 150 + 250
        assert_eq!(out, CommandOutput::Offset(1100.0));
        let request = canvas.scroll_requests().pop().unwrap();
        assert_eq!(request.top, Some(1100.0));
        assert_eq!(request.left, None);
        assert_eq!(request.behavior, ScrollBehavior::Instant);
    }

    #[test]
    fn scroll_to_page_center_horizontal() {
        let canvas = HeadlessCanvas::new(Rect::new(0.0, 0.0, 150.0, 150.0));
        let mut viewer = Viewer::new(
            vec![PluginSpec::scroll(), PluginSpec::page()],
            Direction::Horizontal,
        );
        viewer.attach_canvas(canvas.boxed());
        viewer.set_pages(vec![page(100.0, 100.0); 3]);
        let sizes = vec![Size::new(100.0, 100.0); 3];
        for (i, element) in canvas.stack(&sizes, Direction::Horizontal, 10.0).iter().enumerate() {
            viewer.attach_page_element(i, element.boxed());
        }
        viewer.on_pages_ready();

        let out = viewer
            .execute(Command::ScrollToPage {
                page: 2,
                align: Some(ScrollAnchor::Center),
                behavior: Some(ScrollBehavior::Instant),
            })
            .unwrap();

        // page left 220 - 75 + 50
        assert_eq!(out, CommandOutput::Offset(195.0));
        let request = canvas.scroll_requests().pop().unwrap();
        assert_eq!(request.left, Some(195.0));
        assert_eq!(request.top, None);
        // Content is 320 wide
        assert_eq!(canvas.scroll_position(), (170.0, 0.0));
        assert_eq!(viewer.page(), Some(2));
    }

    #[test]
    fn scroll_to_missing_page_is_a_no_op() {
        let (mut viewer, canvas) = scroll_viewer(ScrollOptions::default());
        let out = viewer.execute(Command::scroll_to_page(9)).unwrap();
        assert_eq!(out, CommandOutput::None);
        assert!(canvas.scroll_requests().is_empty());
    }

    #[test]
    fn raw_scroll_accessors_use_default_behavior() {
        let (mut viewer, canvas) = scroll_viewer(ScrollOptions {
            default_behavior: ScrollBehavior::Auto,
            ..ScrollOptions::default()
        });
        viewer
            .execute(Command::SetScroll {
                x: 0.0,
                y: 75.0,
                behavior: None,
            })
            .unwrap();
        viewer
            .execute(Command::SetScrollY {
                y: 80.0,
                behavior: None,
            })
            .unwrap();

        assert_eq!(
            viewer.execute(Command::GetScrollY).unwrap(),
            CommandOutput::Offset(80.0)
        );
        assert_eq!(
            viewer.execute(Command::GetScrollX).unwrap(),
            CommandOutput::Offset(0.0)
        );
        assert!(canvas
            .scroll_requests()
            .iter()
            .all(|r| r.behavior == ScrollBehavior::Auto));
    }
}
