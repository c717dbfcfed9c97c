use std::fmt;
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Deserializer};

use super::{Plugin, unhandled};
use crate::canvas::Canvas;
use crate::command::{Command, CommandKind, CommandOutput};
use crate::error::ViewerError;
use crate::page::Page;
use crate::storage::StorageValue;
use crate::viewer::{ContainerProps, PluginContext, ViewerState};

pub const DEFAULT_MIN_ZOOM: f64 = 0.1;
pub const DEFAULT_MAX_ZOOM: f64 = 10.0;
pub const DEFAULT_ZOOM_STEP: f64 = 0.25;

/// Strategy for deriving a zoom level from page and viewport geometry
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitMode {
    /// Whole page visible
    #[default]
    Fit,
    /// Fill the viewport, cropping if needed
    Cover,
    FitWidth,
    FitHeight,
}

impl FitMode {
    fn scale(self, scale_x: f64, scale_y: f64) -> f64 {
        match self {
            Self::Fit => scale_x.min(scale_y),
            Self::Cover => scale_x.max(scale_y),
            Self::FitWidth => scale_x,
            Self::FitHeight => scale_y,
        }
    }
}

pub type ZoomFn = Arc<dyn Fn(&Page, &dyn Canvas) -> f64 + Send + Sync>;

/// Where the zoom level starts
#[derive(Clone)]
pub enum InitialZoom {
    Level(f64),
    /// Resolved once pages are loaded
    Fit(FitMode),
    /// Resolved once pages are loaded, from the first page and the canvas
    Custom(ZoomFn),
}

impl fmt::Debug for InitialZoom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Level(level) => f.debug_tuple("Level").field(level).finish(),
            Self::Fit(mode) => f.debug_tuple("Fit").field(mode).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for InitialZoom {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Level(f64),
            Fit(FitMode),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Level(level) => Self::Level(level),
            Repr::Fit(mode) => Self::Fit(mode),
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ZoomOptions {
    pub initial_zoom: Option<InitialZoom>,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_step: f64,
}

impl Default for ZoomOptions {
    fn default() -> Self {
        Self {
            initial_zoom: None,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            zoom_step: DEFAULT_ZOOM_STEP,
        }
    }
}

impl ZoomOptions {
    pub fn with_initial(initial: InitialZoom) -> Self {
        Self {
            initial_zoom: Some(initial),
            ..Self::default()
        }
    }

    fn initial_fit_mode(&self) -> Option<FitMode> {
        match self.initial_zoom {
            Some(InitialZoom::Fit(mode)) => Some(mode),
            _ => None,
        }
    }
}

/// Scroll adjustment applied on the frame after a zoom change
#[derive(Clone, Copy, Debug)]
struct Recenter {
    center_x: f64,
    center_y: f64,
    ratio: f64,
}

pub struct ZoomPlugin {
    options: ZoomOptions,
    pending: Option<Recenter>,
}

impl ZoomPlugin {
    pub const NAME: &'static str = "zoom";

    const COMMANDS: &'static [CommandKind] = &[
        CommandKind::SetZoom,
        CommandKind::GetZoom,
        CommandKind::ZoomIn,
        CommandKind::ZoomOut,
        CommandKind::ResetZoom,
        CommandKind::ZoomToFit,
    ];

    pub fn new(options: ZoomOptions) -> Self {
        Self {
            options,
            pending: None,
        }
    }

    pub fn clamp(&self, level: f64) -> f64 {
        level.min(self.options.max_zoom).max(self.options.min_zoom)
    }

    fn current(state: &ViewerState) -> f64 {
        state
            .storage(Self::NAME)
            .and_then(StorageValue::as_zoom)
            .unwrap_or(1.0)
    }

    /// Fit scale of the first page inside the canvas content box
    fn fit_zoom(state: &ViewerState, mode: FitMode) -> Option<f64> {
        let canvas = state.canvas()?;
        let page = state.pages().first()?;
        let available = canvas.content_box();
        Some(mode.scale(
            available.width / page.width,
            available.height / page.height,
        ))
    }

    fn set_zoom(&mut self, level: f64, ctx: &mut PluginContext<'_>) {
        let old = Self::current(ctx);
        let new = self.clamp(level);
        if old == new {
            return;
        }

        let Some(canvas) = ctx.canvas() else {
            ctx.update_storage(StorageValue::Zoom(new));
            return;
        };

        let client = canvas.client_size();
        let center_x = canvas.scroll_left() + client.width / 2.0;
        let center_y = canvas.scroll_top() + client.height / 2.0;

        ctx.update_storage(StorageValue::Zoom(new));
        debug!("Zoom {old} -> {new}");

        // A deferred initial zoom starts at 0; there is no position to keep
        if old <= 0.0 {
            return;
        }
        let ratio = new / old;
        // Several changes before one frame: keep the first center, compose ratios
        self.pending = Some(match self.pending {
            Some(pending) => Recenter {
                ratio: pending.ratio * ratio,
                ..pending
            },
            None => Recenter {
                center_x,
                center_y,
                ratio,
            },
        });
        ctx.request_animation_frame();
    }

    fn step_target(current: f64, delta: f64) -> f64 {
        let next = current + delta;
        let crosses_one = (current < 1.0 && next > 1.0) || (current > 1.0 && next < 1.0);
        if crosses_one { 1.0 } else { next }
    }
}

impl Plugin for ZoomPlugin {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn commands(&self) -> &'static [CommandKind] {
        Self::COMMANDS
    }

    fn initial_storage(&self) -> StorageValue {
        StorageValue::Zoom(match self.options.initial_zoom {
            None => 1.0,
            Some(InitialZoom::Level(level)) => level,
            Some(InitialZoom::Fit(_) | InitialZoom::Custom(_)) => 0.0,
        })
    }

    fn execute(
        &mut self,
        command: &Command,
        ctx: &mut PluginContext<'_>,
    ) -> Result<CommandOutput, ViewerError> {
        match command {
            Command::SetZoom(level) => self.set_zoom(*level, ctx),
            Command::GetZoom => return Ok(CommandOutput::Zoom(Self::current(ctx))),
            Command::ZoomIn(step) => {
                let delta = step.unwrap_or(self.options.zoom_step);
                ctx.invoke(Command::SetZoom(Self::step_target(Self::current(ctx), delta)));
            }
            Command::ZoomOut(step) => {
                let delta = step.unwrap_or(self.options.zoom_step);
                ctx.invoke(Command::SetZoom(Self::step_target(Self::current(ctx), -delta)));
            }
            Command::ResetZoom => ctx.invoke(Command::SetZoom(1.0)),
            Command::ZoomToFit(mode) => {
                let mode = mode
                    .or_else(|| self.options.initial_fit_mode())
                    .unwrap_or_default();
                match Self::fit_zoom(ctx, mode) {
                    Some(zoom) => ctx.invoke(Command::SetZoom(zoom)),
                    None => debug!("zoomToFit({mode:?}) skipped: no canvas or pages"),
                }
            }
            other => return unhandled(Self::NAME, other),
        }
        Ok(CommandOutput::None)
    }

    fn container_props(
        &self,
        mut props: ContainerProps,
        page: &Page,
        state: &ViewerState,
    ) -> ContainerProps {
        let zoom = Self::current(state);
        props.style.width = Some(page.width * zoom);
        props.style.height = Some(page.height * zoom);
        props
    }

    fn on_pages_loaded(&mut self, ctx: &mut PluginContext<'_>) {
        let resolved = match &self.options.initial_zoom {
            Some(InitialZoom::Fit(mode)) => Self::fit_zoom(ctx, *mode),
            Some(InitialZoom::Custom(compute)) => match (ctx.canvas(), ctx.pages().first()) {
                (Some(canvas), Some(page)) => Some(compute(page, canvas)),
                _ => None,
            },
            Some(InitialZoom::Level(_)) | None => return,
        };

        match resolved {
            Some(zoom) => {
                let zoom = self.clamp(zoom);
                debug!("Initial zoom resolved to {zoom}");
                ctx.update_storage(StorageValue::Zoom(zoom));
            }
            None => debug!("Initial zoom left unresolved: no canvas or pages"),
        }
    }

    fn on_animation_frame(&mut self, ctx: &mut PluginContext<'_>) {
        let Some(recenter) = self.pending.take() else {
            return;
        };
        let Some(canvas) = ctx.canvas_mut() else {
            return;
        };
        let client = canvas.client_size();
        canvas.set_scroll_left((recenter.center_x * recenter.ratio - client.width / 2.0).max(0.0));
        canvas.set_scroll_top((recenter.center_y * recenter.ratio - client.height / 2.0).max(0.0));
    }

    fn on_cleanup(&mut self, ctx: &mut PluginContext<'_>) {
        self.pending = None;
        ctx.cancel_animation_frame();
    }
}
