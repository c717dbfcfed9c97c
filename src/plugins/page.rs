use std::time::{Duration, Instant};

use log::debug;
use serde::{Deserialize, Serialize};

use super::{Plugin, unhandled};
use crate::command::{Command, CommandKind, CommandOutput};
use crate::error::ViewerError;
use crate::event::{EventKind, EventPayload, ViewerEvent};
use crate::geometry::{Axis, Rect};
use crate::storage::StorageValue;
use crate::viewer::{PluginContext, ViewerState};

/// Quiet period after the last programmatic scroll before tracking resumes
pub const SETTLE_DELAY: Duration = Duration::from_millis(150);

/// Reference line through the canvas (or page edge for alignment)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollAnchor {
    #[default]
    Start,
    Center,
    End,
}

impl ScrollAnchor {
    /// Position of this anchor on `rect` along `axis`
    pub fn position(self, rect: &Rect, axis: Axis) -> f64 {
        match self {
            Self::Start => rect.start(axis),
            Self::Center => rect.start(axis) + rect.extent(axis) / 2.0,
            Self::End => rect.end(axis),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PageOptions {
    pub initial_page: usize,
    pub track_scroll: bool,
    pub scroll_anchor: ScrollAnchor,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            initial_page: 0,
            track_scroll: true,
            scroll_anchor: ScrollAnchor::Start,
        }
    }
}

pub struct PagePlugin {
    options: PageOptions,
    /// Set by `setPage`; scroll events stop updating the page until cleared
    suppressed: bool,
    settle_deadline: Option<Instant>,
}

impl PagePlugin {
    pub const NAME: &'static str = "page";

    const COMMANDS: &'static [CommandKind] = &[CommandKind::SetPage, CommandKind::GetPage];

    pub fn new(options: PageOptions) -> Self {
        Self {
            options,
            suppressed: false,
            settle_deadline: None,
        }
    }

    fn current(state: &ViewerState) -> usize {
        state
            .storage(Self::NAME)
            .and_then(StorageValue::as_page)
            .unwrap_or_default()
    }

    /// Index of the page nearest the anchor line, if any element is attached
    pub fn closest_page(state: &ViewerState, anchor: ScrollAnchor) -> Option<usize> {
        let canvas = state.canvas()?;
        let axis = state.direction().axis();
        let anchor_pos = anchor.position(&canvas.bounding_rect(), axis);

        let mut closest = None;
        let mut closest_dist = f64::INFINITY;
        for index in 0..state.page_element_count() {
            let Some(element) = state.page_element(index) else {
                continue;
            };
            let dist = element.bounding_rect().distance_along(axis, anchor_pos);
            if dist < closest_dist {
                closest_dist = dist;
                closest = Some(index);
            }
        }
        closest
    }

    fn on_wheel(&mut self) {
        if self.suppressed {
            self.suppressed = false;
            self.settle_deadline = None;
        }
    }

    fn on_scroll(&mut self, at: Instant, ctx: &mut PluginContext<'_>) {
        if self.suppressed {
            match self.settle_deadline {
                // The settle timer would have fired before this event
                Some(deadline) if at >= deadline => {
                    self.suppressed = false;
                    self.settle_deadline = None;
                }
                _ => {
                    self.settle_deadline = Some(at + SETTLE_DELAY);
                    return;
                }
            }
        }

        let Some(closest) = Self::closest_page(ctx, self.options.scroll_anchor) else {
            return;
        };
        if closest != Self::current(ctx) {
            debug!("Current page -> {closest}");
            ctx.update_storage(StorageValue::Page(closest));
        }
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }
}

impl Plugin for PagePlugin {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn commands(&self) -> &'static [CommandKind] {
        Self::COMMANDS
    }

    fn initial_storage(&self) -> StorageValue {
        StorageValue::Page(self.options.initial_page)
    }

    fn execute(
        &mut self,
        command: &Command,
        ctx: &mut PluginContext<'_>,
    ) -> Result<CommandOutput, ViewerError> {
        match command {
            Command::SetPage(page) => {
                self.suppressed = true;
                self.settle_deadline = None;
                ctx.update_storage(StorageValue::Page(*page));
                Ok(CommandOutput::None)
            }
            Command::GetPage => Ok(CommandOutput::Page(Self::current(ctx))),
            other => unhandled(Self::NAME, other),
        }
    }

    fn on_pages_loaded(&mut self, ctx: &mut PluginContext<'_>) {
        if self.options.track_scroll && ctx.canvas().is_some() {
            ctx.listen(EventKind::Scroll);
            ctx.listen(EventKind::Wheel);
        }
    }

    fn handle_event(&mut self, event: &ViewerEvent, ctx: &mut PluginContext<'_>) {
        match event.payload {
            EventPayload::Wheel => self.on_wheel(),
            EventPayload::Scroll => self.on_scroll(event.at, ctx),
            _ => {}
        }
    }

    fn on_cleanup(&mut self, ctx: &mut PluginContext<'_>) {
        ctx.unlisten_all();
        self.settle_deadline = None;
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
    use std::cell::Cell;
    use std::rc::Rc;

    fn page(width: f64, height: f64) -> Page {
        Page::new(width, height, |_: &RenderOptions| Renderable::Image {
            src: "p.png".into(),
        })
    }

    /// Three 100x200 pages stacked with a 10px gap in a 150x150 canvas
    fn tracked_viewer(options: PageOptions, direction: Direction) -> (Viewer, HeadlessCanvas) {
        let canvas = HeadlessCanvas::new(Rect::new(0.0, 0.0, 150.0, 150.0));
        let mut viewer = Viewer::new(vec![PluginSpec::Page(options)], direction);
        viewer.attach_canvas(canvas.boxed());
        viewer.set_pages(vec![page(100.0, 200.0); 3]);

        let sizes = vec![Size::new(100.0, 200.0); 3];
        for (i, element) in canvas.stack(&sizes, direction, 10.0).iter().enumerate() {
            viewer.attach_page_element(i, element.boxed());
        }
        viewer.on_pages_ready();
        (viewer, canvas)
    }

    #[test]
    fn tracks_page_at_start_anchor_with_single_notification() {
        let (mut viewer, canvas) = tracked_viewer(PageOptions::default(), Direction::Vertical);
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        viewer.subscribe(PagePlugin::NAME, move |_| counter.set(counter.get() + 1));

        // Page 2 spans 420..620 in content space
        canvas.scroll_to_position(0.0, 430.0);
        viewer.dispatch(&ViewerEvent::scroll());
        viewer.dispatch(&ViewerEvent::scroll());

        assert_eq!(viewer.page(), Some(2));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn gap_between_pages_picks_nearest_edge() {
        let (mut viewer, canvas) = tracked_viewer(PageOptions::default(), Direction::Vertical);
        // Anchor at 207: 7px past page 0, 3px before page 1
        canvas.scroll_to_position(0.0, 207.0);
        viewer.dispatch(&ViewerEvent::scroll());
        assert_eq!(viewer.page(), Some(1));
    }

    #[test]
    fn center_and_end_anchors() {
        let options = PageOptions {
            scroll_anchor: ScrollAnchor::End,
            ..PageOptions::default()
        };
        let (mut viewer, canvas) = tracked_viewer(options, Direction::Vertical);
        // End anchor at 150 + 80 = 230 falls inside page 1
        canvas.scroll_to_position(0.0, 80.0);
        viewer.dispatch(&ViewerEvent::scroll());
        assert_eq!(viewer.page(), Some(1));

        let options = PageOptions {
            scroll_anchor: ScrollAnchor::Center,
            ..PageOptions::default()
        };
        let (mut viewer, canvas) = tracked_viewer(options, Direction::Horizontal);
        // Horizontal strip: page 1 spans 110..210, center anchor at 75 + 100 = 175
        canvas.scroll_to_position(100.0, 0.0);
        viewer.dispatch(&ViewerEvent::scroll());
        assert_eq!(viewer.page(), Some(1));
    }

    #[test]
    fn set_page_suppresses_tracking_until_wheel() {
        let (mut viewer, canvas) = tracked_viewer(PageOptions::default(), Direction::Vertical);
        viewer.execute(Command::SetPage(2)).unwrap();

        canvas.scroll_to_position(0.0, 0.0);
        viewer.dispatch(&ViewerEvent::scroll());
        assert_eq!(viewer.page(), Some(2));

        viewer.dispatch(&ViewerEvent::wheel());
        viewer.dispatch(&ViewerEvent::scroll());
        assert_eq!(viewer.page(), Some(0));
    }

    #[test]
    fn set_page_suppression_lifts_after_settle_delay() {
        let (mut viewer, _canvas) = tracked_viewer(PageOptions::default(), Direction::Vertical);
        viewer.execute(Command::SetPage(2)).unwrap();

        let start = Instant::now();
        let scroll_at = |offset_ms| {
            ViewerEvent::at(EventPayload::Scroll, start + Duration::from_millis(offset_ms))
        };

        viewer.dispatch(&scroll_at(0));
        viewer.dispatch(&scroll_at(100));
        // 100ms after the last scroll: still settling
        viewer.dispatch(&scroll_at(200));
        assert_eq!(viewer.page(), Some(2));

        viewer.dispatch(&scroll_at(400));
        assert_eq!(viewer.page(), Some(0));
    }

    #[test]
    fn no_listeners_without_tracking_or_after_destroy() {
        let options = PageOptions {
            track_scroll: false,
            ..PageOptions::default()
        };
        let (viewer, _canvas) = tracked_viewer(options, Direction::Vertical);
        assert_eq!(viewer.listener_count(), 0);

        let (mut viewer, canvas) = tracked_viewer(PageOptions::default(), Direction::Vertical);
        assert_eq!(viewer.listener_count(), 2);
        viewer.destroy();
        assert_eq!(viewer.listener_count(), 0);

        canvas.scroll_to_position(0.0, 430.0);
        viewer.dispatch(&ViewerEvent::scroll());
        assert_eq!(viewer.page(), Some(0));
    }

    #[test]
    fn get_page_and_initial_page() {
        let mut viewer = Viewer::new(
            vec![PluginSpec::Page(PageOptions {
                initial_page: 4,
                ..PageOptions::default()
            })],
            Direction::Vertical,
        );
        assert_eq!(viewer.execute(Command::GetPage).unwrap(), CommandOutput::Page(4));
    }
}
