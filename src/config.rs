use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Deserialize;

use crate::host::HostOptions;
use crate::page::Dimension;
use crate::plugins::{DownloadOptions, PageOptions, PluginSpec, ScrollOptions, ZoomOptions};
use crate::viewer::Direction;

const CONFIG_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "mediaview";

#[derive(Debug, Deserialize)]
#[serde(tag = "plugin", rename_all = "snake_case")]
pub enum PluginConfig {
    Zoom(ZoomOptions),
    Page(PageOptions),
    Scroll(ScrollOptions),
    Download(DownloadOptions),
}

impl From<PluginConfig> for PluginSpec {
    fn from(config: PluginConfig) -> Self {
        match config {
            PluginConfig::Zoom(options) => options.into(),
            PluginConfig::Page(options) => options.into(),
            PluginConfig::Scroll(options) => options.into(),
            PluginConfig::Download(options) => options.into(),
        }
    }
}

/// Layout options and the plugin list, read from YAML:
///
/// ```yaml
/// direction: vertical
/// normalize: width
/// plugins:
///   - plugin: zoom
///     initial_zoom: fit-width
///   - plugin: page
///     scroll_anchor: center
///   - plugin: scroll
///     drag_key: space
/// ```
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub direction: Direction,
    pub normalize: Option<Dimension>,
    /// Registration order; later plugins win command collisions
    pub plugins: Vec<PluginConfig>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            direction: Direction::Vertical,
            normalize: None,
            plugins: vec![
                PluginConfig::Zoom(ZoomOptions::default()),
                PluginConfig::Page(PageOptions::default()),
                PluginConfig::Scroll(ScrollOptions::default()),
            ],
        }
    }
}

impl ViewerConfig {
    pub fn host_options(&self) -> HostOptions {
        HostOptions {
            direction: self.direction,
            normalize: self.normalize,
        }
    }

    pub fn into_specs(self) -> Vec<PluginSpec> {
        self.plugins.into_iter().map(PluginSpec::from).collect()
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(CONFIG_FILENAME))
}

pub fn load_config(path: &Path) -> Result<ViewerConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {path:?}"))?;
    let config = serde_yaml::from_str::<ViewerConfig>(&content)
        .with_context(|| format!("Failed to parse config file {path:?}"))?;
    debug!("Loaded config from {path:?}: {} plugins", config.plugins.len());
    Ok(config)
}

/// An explicit path must exist; otherwise the default location is optional
pub fn resolve_config(explicit: Option<&Path>) -> Result<ViewerConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match default_config_path() {
        Some(path) if path.exists() => load_config(&path),
        _ => {
            info!("No config file found, using defaults");
            Ok(ViewerConfig::default())
        }
    }
}
