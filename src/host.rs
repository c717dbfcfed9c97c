//! Host glue: loads pages off-thread and feeds them to a viewer.
//!
//! A load runs `PageReader::pages` on a worker thread and reports back
//! over a flume channel. Each load gets a fresh channel and a generation
//! number; starting another load drops the previous receiver, so a slow
//! earlier result can never overwrite a newer one.

use std::sync::Arc;
use std::thread;

use log::{debug, info, warn};
use serde::Deserialize;

use crate::error::ReaderError;
use crate::page::{Dimension, Page, normalize_pages};
use crate::plugins::PluginSpec;
use crate::readers::PageReader;
use crate::viewer::{ContainerProps, Direction, Viewer};

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct HostOptions {
    pub direction: Direction,
    /// Rescale pages so this dimension matches the first page
    pub normalize: Option<Dimension>,
}

struct Loaded {
    generation: u64,
    result: Result<Vec<Page>, ReaderError>,
}

pub struct ViewerHost {
    reader: Arc<dyn PageReader>,
    viewer: Viewer,
    options: HostOptions,
    generation: u64,
    pending: Option<flume::Receiver<Loaded>>,
    error: Option<ReaderError>,
}

impl ViewerHost {
    pub fn new(reader: Box<dyn PageReader>, plugins: Vec<PluginSpec>, options: HostOptions) -> Self {
        Self {
            reader: Arc::from(reader),
            viewer: Viewer::new(plugins, options.direction),
            options,
            generation: 0,
            pending: None,
            error: None,
        }
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn viewer_mut(&mut self) -> &mut Viewer {
        &mut self.viewer
    }

    pub fn pages(&self) -> &[Page] {
        self.viewer.pages()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn error(&self) -> Option<&ReaderError> {
        self.error.as_ref()
    }

    /// Start loading pages; supersedes any load still in flight
    pub fn load(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        self.error = None;

        let (tx, rx) = flume::bounded(1);
        let reader = Arc::clone(&self.reader);
        let spawned = thread::Builder::new()
            .name(format!("page-loader-{generation}"))
            .spawn(move || {
                let result = reader.pages();
                if tx.send(Loaded { generation, result }).is_err() {
                    debug!("Load #{generation} finished after being superseded");
                }
            });

        match spawned {
            Ok(_) => {
                debug!("Load #{generation} started");
                self.pending = Some(rx);
            }
            Err(e) => {
                self.pending = None;
                self.fail(ReaderError::Io(e));
            }
        }
    }

    pub fn reload(&mut self) {
        self.load();
    }

    /// Apply a finished load, if any. Returns true when one was applied.
    pub fn poll(&mut self) -> bool {
        let Some(rx) = &self.pending else {
            return false;
        };
        match rx.try_recv() {
            Ok(loaded) => {
                self.apply(loaded);
                true
            }
            Err(flume::TryRecvError::Empty) => false,
            Err(flume::TryRecvError::Disconnected) => {
                self.abandon();
                true
            }
        }
    }

    /// Block until the current load finishes and apply it
    pub fn wait(&mut self) {
        let Some(rx) = &self.pending else {
            return;
        };
        match rx.recv() {
            Ok(loaded) => self.apply(loaded),
            Err(flume::RecvError::Disconnected) => self.abandon(),
        }
    }

    /// Base props for page `index`, transformed by every plugin
    pub fn container_props(&self, index: usize) -> Option<ContainerProps> {
        let page = self.viewer.pages().get(index)?;
        Some(
            self.viewer
                .container_props(ContainerProps::for_page(index, page), page),
        )
    }

    fn apply(&mut self, loaded: Loaded) {
        self.pending = None;
        if loaded.generation != self.generation {
            debug!(
                "Dropping result of load #{} (current is #{})",
                loaded.generation, self.generation
            );
            return;
        }

        match loaded.result {
            Ok(pages) => {
                let pages = normalize_pages(pages, self.options.normalize);
                info!("Loaded {} pages", pages.len());
                let ready = !pages.is_empty();
                self.viewer.set_pages(pages);
                if ready {
                    self.viewer.on_pages_ready();
                }
            }
            Err(e) => self.fail(e),
        }
    }

    // The worker died without reporting
    fn abandon(&mut self) {
        self.pending = None;
        self.fail(ReaderError::Io(std::io::Error::other(
            "page loader exited without a result",
        )));
    }

    fn fail(&mut self, e: ReaderError) {
        warn!("Error loading pages: {e}");
        self.viewer.set_pages(Vec::new());
        self.error = Some(e);
    }
}

impl Drop for ViewerHost {
    fn drop(&mut self) {
        self.viewer.destroy();
    }
}
