pub mod download;
pub mod page;
pub mod scroll;
pub mod zoom;

use crate::command::{Command, CommandKind, CommandOutput};
use crate::error::ViewerError;
use crate::event::ViewerEvent;
use crate::page::Page;
use crate::storage::StorageValue;
use crate::viewer::{ContainerProps, PluginContext, ViewerState};

pub use download::{DownloadOptions, DownloadPlugin, HttpTransport, LocalTransport, Transport};
pub use page::{PageOptions, PagePlugin, ScrollAnchor};
pub use scroll::{ScrollOptions, ScrollPlugin};
pub use zoom::{FitMode, InitialZoom, ZoomOptions, ZoomPlugin};

/// A unit of behavior contributing commands, a storage slice and hooks
pub trait Plugin {
    /// Key into the storage namespace and subscriber lists
    fn name(&self) -> &'static str;

    /// Commands this plugin answers; read once when the viewer is built
    fn commands(&self) -> &'static [CommandKind];

    /// Initial value of the storage slice; read once when the viewer is built
    fn initial_storage(&self) -> StorageValue {
        StorageValue::Empty
    }

    fn execute(
        &mut self,
        command: &Command,
        ctx: &mut PluginContext<'_>,
    ) -> Result<CommandOutput, ViewerError>;

    fn container_props(
        &self,
        props: ContainerProps,
        _page: &Page,
        _state: &ViewerState,
    ) -> ContainerProps {
        props
    }

    fn on_pages_loaded(&mut self, _ctx: &mut PluginContext<'_>) {}

    fn on_pages_changed(&mut self, _ctx: &mut PluginContext<'_>) {}

    fn on_cleanup(&mut self, _ctx: &mut PluginContext<'_>) {}

    fn handle_event(&mut self, _event: &ViewerEvent, _ctx: &mut PluginContext<'_>) {}

    fn on_animation_frame(&mut self, _ctx: &mut PluginContext<'_>) {}
}

/// A plugin type paired with its configuration
pub enum PluginSpec {
    Zoom(ZoomOptions),
    Page(PageOptions),
    Scroll(ScrollOptions),
    Download(DownloadOptions),
    Custom(Box<dyn Plugin>),
}

impl PluginSpec {
    pub fn zoom() -> Self {
        Self::Zoom(ZoomOptions::default())
    }

    pub fn page() -> Self {
        Self::Page(PageOptions::default())
    }

    pub fn scroll() -> Self {
        Self::Scroll(ScrollOptions::default())
    }

    pub fn custom(plugin: impl Plugin + 'static) -> Self {
        Self::Custom(Box::new(plugin))
    }

    pub fn into_plugin(self) -> Box<dyn Plugin> {
        match self {
            Self::Zoom(options) => Box::new(ZoomPlugin::new(options)),
            Self::Page(options) => Box::new(PagePlugin::new(options)),
            Self::Scroll(options) => Box::new(ScrollPlugin::new(options)),
            Self::Download(options) => Box::new(DownloadPlugin::new(options)),
            Self::Custom(plugin) => plugin,
        }
    }
}

impl From<ZoomOptions> for PluginSpec {
    fn from(options: ZoomOptions) -> Self {
        Self::Zoom(options)
    }
}

impl From<PageOptions> for PluginSpec {
    fn from(options: PageOptions) -> Self {
        Self::Page(options)
    }
}

impl From<ScrollOptions> for PluginSpec {
    fn from(options: ScrollOptions) -> Self {
        Self::Scroll(options)
    }
}

impl From<DownloadOptions> for PluginSpec {
    fn from(options: DownloadOptions) -> Self {
        Self::Download(options)
    }
}

/// Reached only if the viewer routes a command to a plugin that never registered it
pub(crate) fn unhandled(plugin: &str, command: &Command) -> Result<CommandOutput, ViewerError> {
    log::warn!("Plugin '{plugin}' received unexpected command {}", command.kind());
    Err(ViewerError::CommandNotRegistered(command.kind()))
}
