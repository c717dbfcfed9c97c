pub mod canvas;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod geometry;
pub mod headless;
pub mod host;
pub mod page;
pub mod plugins;
pub mod readers;
pub mod storage;
pub mod viewer;

pub use canvas::{Canvas, Cursor, PageElement, ScrollBehavior, ScrollRequest};
pub use command::{Command, CommandKind, CommandOutput};
pub use error::{ReaderError, ViewerError};
pub use event::{EventKind, EventPayload, EventTarget, Key, ViewerEvent};
pub use geometry::{Axis, Insets, Rect, Size};
pub use host::{HostOptions, ViewerHost};
pub use page::{Dimension, Page, PageRenderer, RenderOptions, Renderable};
pub use plugins::{Plugin, PluginSpec};
pub use readers::{MetadataProbe, PageReader, ReaderRegistry};
pub use storage::{ScrollState, StorageValue, SubscriptionId};
pub use viewer::{ContainerProps, ContainerStyle, Direction, PluginContext, Viewer, ViewerState};
