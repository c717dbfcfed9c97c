//! The viewer: plugin coordinator, command namespace and storage bus.
//!
//! A [`Viewer`] owns one instance per configured plugin. Commands are
//! routed by [`CommandKind`] to whichever plugin registered that kind
//! last. Plugins touch shared state only through a [`PluginContext`],
//! whose `update_storage` is the single write path for a storage slice
//! and always notifies that slice's subscribers.

use std::collections::{BTreeMap, HashMap};
use std::ops::Deref;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::canvas::{Canvas, PageElement};
use crate::command::{Command, CommandKind, CommandOutput};
use crate::error::ViewerError;
use crate::event::{EventKind, ViewerEvent};
use crate::geometry::Axis;
use crate::page::Page;
use crate::plugins::{Plugin, PluginSpec};
use crate::storage::{Callback, StorageValue, SubscriptionId, Subscribers};

/// Layout direction of the page strip
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Vertical,
    Horizontal,
}

impl Direction {
    pub fn axis(self) -> Axis {
        match self {
            Self::Vertical => Axis::Vertical,
            Self::Horizontal => Axis::Horizontal,
        }
    }
}

/// Slot a page's wrapping element should be attached to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PageRef(pub usize);

/// Style applied to a page container
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ContainerStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<(f64, f64)>,
    /// Free-form properties added by plugins (`box-shadow`, `opacity`, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

/// Props threaded through every plugin before the host applies them
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContainerProps {
    pub element_ref: PageRef,
    pub style: ContainerStyle,
}

impl ContainerProps {
    /// Base props for a page: intrinsic size and aspect ratio
    pub fn for_page(index: usize, page: &Page) -> Self {
        Self {
            element_ref: PageRef(index),
            style: ContainerStyle {
                width: Some(page.width),
                height: Some(page.height),
                aspect_ratio: Some((page.width, page.height)),
                extra: BTreeMap::new(),
            },
        }
    }
}

/// Shared state plugins read through their context
pub struct ViewerState {
    storage: HashMap<&'static str, StorageValue>,
    commands: HashMap<CommandKind, usize>,
    pages: Vec<Page>,
    page_elements: Vec<Option<Box<dyn PageElement>>>,
    canvas: Option<Box<dyn Canvas>>,
    direction: Direction,
    subscribers: Subscribers,
    listeners: Vec<(usize, EventKind)>,
    frame_requests: Vec<usize>,
}

impl ViewerState {
    pub fn storage(&self, plugin_name: &str) -> Option<&StorageValue> {
        self.storage.get(plugin_name)
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn canvas(&self) -> Option<&dyn Canvas> {
        self.canvas.as_deref()
    }

    pub fn page_element(&self, index: usize) -> Option<&dyn PageElement> {
        self.page_elements.get(index)?.as_deref()
    }

    pub fn page_element_count(&self) -> usize {
        self.page_elements.len()
    }

    pub fn has_command(&self, kind: CommandKind) -> bool {
        self.commands.contains_key(&kind)
    }
}

/// A command queued by a plugin while it handles something else
#[derive(Debug)]
pub(crate) enum Invocation {
    /// Must be registered; missing is an error
    Required(Command),
    /// Skipped quietly when nobody registered it
    IfPresent(Command),
}

/// A plugin's handle on the viewer while one of its hooks runs
pub struct PluginContext<'a> {
    state: &'a mut ViewerState,
    index: usize,
    name: &'static str,
    queue: &'a mut Vec<Invocation>,
}

impl PluginContext<'_> {
    /// Write this plugin's slice and notify its subscribers
    pub fn update_storage(&mut self, value: StorageValue) {
        self.state.storage.insert(self.name, value);
        self.state.subscribers.emit(self.name, &value);
    }

    pub fn canvas_mut(&mut self) -> Option<&mut (dyn Canvas + 'static)> {
        self.state.canvas.as_deref_mut()
    }

    /// Run `command` through the namespace once this hook returns
    pub fn invoke(&mut self, command: Command) {
        self.queue.push(Invocation::Required(command));
    }

    /// Like `invoke`, but a missing command is not an error
    pub fn invoke_if_present(&mut self, command: Command) {
        self.queue.push(Invocation::IfPresent(command));
    }

    pub fn listen(&mut self, kind: EventKind) {
        let entry = (self.index, kind);
        if !self.state.listeners.contains(&entry) {
            self.state.listeners.push(entry);
        }
    }

    pub fn unlisten_all(&mut self) {
        let index = self.index;
        self.state.listeners.retain(|(owner, _)| *owner != index);
    }

    /// Ask for `on_animation_frame` on the next frame
    pub fn request_animation_frame(&mut self) {
        if !self.state.frame_requests.contains(&self.index) {
            self.state.frame_requests.push(self.index);
        }
    }

    pub fn cancel_animation_frame(&mut self) {
        let index = self.index;
        self.state.frame_requests.retain(|owner| *owner != index);
    }
}

impl Deref for PluginContext<'_> {
    type Target = ViewerState;

    fn deref(&self) -> &ViewerState {
        &*self.state
    }
}

/// Coordinates a set of plugins over one scroll canvas
pub struct Viewer {
    state: ViewerState,
    plugins: Vec<Box<dyn Plugin>>,
    pages_loaded_once: bool,
    destroyed: bool,
}

impl Viewer {
    /// Instantiate plugins in order; later plugins win command and slice collisions
    pub fn new(specs: Vec<PluginSpec>, direction: Direction) -> Self {
        let mut state = ViewerState {
            storage: HashMap::new(),
            commands: HashMap::new(),
            pages: Vec::new(),
            page_elements: Vec::new(),
            canvas: None,
            direction,
            subscribers: Subscribers::default(),
            listeners: Vec::new(),
            frame_requests: Vec::new(),
        };

        let mut plugins: Vec<Box<dyn Plugin>> = Vec::with_capacity(specs.len());
        for (index, spec) in specs.into_iter().enumerate() {
            let plugin = spec.into_plugin();
            let name = plugin.name();

            for &kind in plugin.commands() {
                if let Some(previous) = state.commands.insert(kind, index) {
                    debug!("Command {kind} from plugin #{previous} overridden by '{name}'");
                }
            }
            if state.storage.insert(name, plugin.initial_storage()).is_some() {
                debug!("Storage slice '{name}' overridden by plugin #{index}");
            }

            plugins.push(plugin);
        }

        debug!(
            "Viewer created with plugins [{}]",
            plugins
                .iter()
                .map(|p| p.name())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Self {
            state,
            plugins,
            pages_loaded_once: false,
            destroyed: false,
        }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn direction(&self) -> Direction {
        self.state.direction
    }

    pub fn pages(&self) -> &[Page] {
        &self.state.pages
    }

    pub fn storage(&self, plugin_name: &str) -> Option<&StorageValue> {
        self.state.storage(plugin_name)
    }

    pub fn zoom(&self) -> Option<f64> {
        self.storage("zoom").and_then(StorageValue::as_zoom)
    }

    pub fn page(&self) -> Option<usize> {
        self.storage("page").and_then(StorageValue::as_page)
    }

    pub fn scroll_state(&self) -> Option<crate::storage::ScrollState> {
        self.storage("scroll").and_then(StorageValue::as_scroll)
    }

    pub fn has_command(&self, kind: CommandKind) -> bool {
        self.state.has_command(kind)
    }

    pub fn attach_canvas(&mut self, canvas: Box<dyn Canvas>) {
        self.state.canvas = Some(canvas);
    }

    pub fn detach_canvas(&mut self) -> Option<Box<dyn Canvas>> {
        self.state.canvas.take()
    }

    pub fn canvas(&self) -> Option<&dyn Canvas> {
        self.state.canvas()
    }

    /// Attach the wrapping element for page `index`; ignored past the page list
    pub fn attach_page_element(&mut self, index: usize, element: Box<dyn PageElement>) {
        match self.state.page_elements.get_mut(index) {
            Some(slot) => *slot = Some(element),
            None => debug!("Ignoring element for page {index} (have {})", self.state.pages.len()),
        }
    }

    pub fn detach_page_element(&mut self, index: usize) {
        if let Some(slot) = self.state.page_elements.get_mut(index) {
            *slot = None;
        }
    }

    pub fn subscribe(
        &mut self,
        plugin_name: &'static str,
        callback: impl FnMut(&StorageValue) + 'static,
    ) -> SubscriptionId {
        let callback: Callback = Box::new(callback);
        self.state.subscribers.subscribe(plugin_name, callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.state.subscribers.unsubscribe(id)
    }

    /// Notify every subscriber of `plugin_name` with its current value
    pub fn emit(&mut self, plugin_name: &str) {
        let value = self
            .state
            .storage
            .get(plugin_name)
            .copied()
            .unwrap_or_default();
        self.state.subscribers.emit(plugin_name, &value);
    }

    /// Replace the page list, keeping element slots whose index survives
    pub fn set_pages(&mut self, pages: Vec<Page>) {
        let count = pages.len();
        self.state.pages = pages;
        self.state.page_elements.resize_with(count, || None);
    }

    /// "Loaded" hooks on the first call only, then "changed" hooks on every call
    pub fn on_pages_ready(&mut self) {
        if !self.pages_loaded_once {
            self.pages_loaded_once = true;
            self.each_plugin("pages loaded", |plugin, ctx| plugin.on_pages_loaded(ctx));
        }
        self.each_plugin("pages changed", |plugin, ctx| plugin.on_pages_changed(ctx));
    }

    /// Fold every plugin's container transform over `base`, in registration order
    pub fn container_props(&self, base: ContainerProps, page: &Page) -> ContainerProps {
        self.plugins
            .iter()
            .fold(base, |props, plugin| plugin.container_props(props, page, &self.state))
    }

    /// Run a command through the namespace
    pub fn execute(&mut self, command: Command) -> Result<CommandOutput, ViewerError> {
        let kind = command.kind();
        let index = *self
            .state
            .commands
            .get(&kind)
            .ok_or(ViewerError::CommandNotRegistered(kind))?;
        self.invoke(index, &command)
    }

    /// Route an input event to the plugins listening for its kind
    pub fn dispatch(&mut self, event: &ViewerEvent) {
        let kind = event.kind();
        let targets: Vec<usize> = self
            .state
            .listeners
            .iter()
            .filter(|(_, listened)| *listened == kind)
            .map(|(index, _)| *index)
            .collect();

        for index in targets {
            // An earlier handler may have detached this one
            if !self.state.listeners.contains(&(index, kind)) {
                continue;
            }
            self.with_plugin(index, "event", |plugin, ctx| plugin.handle_event(event, ctx));
        }
    }

    /// Deliver pending animation-frame callbacks; call after layout
    pub fn run_animation_frame(&mut self) {
        let requests = std::mem::take(&mut self.state.frame_requests);
        for index in requests {
            self.with_plugin(index, "animation frame", |plugin, ctx| {
                plugin.on_animation_frame(ctx)
            });
        }
    }

    pub fn has_pending_frame(&self) -> bool {
        !self.state.frame_requests.is_empty()
    }

    pub fn listener_count(&self) -> usize {
        self.state.listeners.len()
    }

    pub fn subscriber_count(&self, plugin_name: &str) -> usize {
        self.state.subscribers.count(plugin_name)
    }

    /// Run every cleanup hook, then drop all subscriptions. Later calls do nothing.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        self.each_plugin("cleanup", |plugin, ctx| plugin.on_cleanup(ctx));

        if !self.state.listeners.is_empty() {
            warn!(
                "{} listeners still attached after cleanup, dropping them",
                self.state.listeners.len()
            );
            self.state.listeners.clear();
        }
        self.state.frame_requests.clear();
        self.state.subscribers.clear();
        debug!("Viewer destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn invoke(&mut self, index: usize, command: &Command) -> Result<CommandOutput, ViewerError> {
        let Self { state, plugins, .. } = self;
        let plugin = &mut plugins[index];
        let mut queue = Vec::new();
        let output = {
            let mut ctx = PluginContext {
                state,
                index,
                name: plugin.name(),
                queue: &mut queue,
            };
            plugin.execute(command, &mut ctx)?
        };
        self.drain(queue)?;
        Ok(output)
    }

    fn drain(&mut self, queue: Vec<Invocation>) -> Result<(), ViewerError> {
        for invocation in queue {
            let (command, required) = match invocation {
                Invocation::Required(command) => (command, true),
                Invocation::IfPresent(command) => (command, false),
            };
            let kind = command.kind();
            match self.state.commands.get(&kind).copied() {
                Some(index) => {
                    self.invoke(index, &command)?;
                }
                None if required => return Err(ViewerError::CommandNotRegistered(kind)),
                None => debug!("Skipping {kind}: no plugin provides it"),
            }
        }
        Ok(())
    }

    fn with_plugin(
        &mut self,
        index: usize,
        hook: &str,
        f: impl FnOnce(&mut dyn Plugin, &mut PluginContext<'_>),
    ) {
        let Self { state, plugins, .. } = self;
        let plugin = &mut plugins[index];
        let mut queue = Vec::new();
        {
            let mut ctx = PluginContext {
                state,
                index,
                name: plugin.name(),
                queue: &mut queue,
            };
            f(plugin.as_mut(), &mut ctx);
        }
        if let Err(e) = self.drain(queue) {
            warn!("Command queued during {hook} failed: {e}");
        }
    }

    fn each_plugin(&mut self, hook: &str, mut f: impl FnMut(&mut dyn Plugin, &mut PluginContext<'_>)) {
        for index in 0..self.plugins.len() {
            self.with_plugin(index, hook, &mut f);
        }
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        self.destroy();
    }
}
