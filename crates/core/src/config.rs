//! Plugin configuration
//!
//! TOML-backed settings with auto-generation of a default file and manual
//! reload. The one live setting, `multi_kill`, is mirrored into an atomic
//! cell that is re-read on every score computation, so editing and reloading
//! the config (or setting the value directly) takes effect immediately.

use std::path::PathBuf;
use std::sync::atomic::{AtomicI32, Ordering};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::policy::MultiKillMode;

/// Configuration system errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML content
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to serialize config to TOML
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Trait for plugin configuration types.
///
/// Configs are stored at `addons/ggscore/configs/{PLUGIN_NAME}.toml`
/// relative to the server root. Loading a missing file writes the default.
pub trait PluginConfig: Default + Serialize + DeserializeOwned + Send + Sync {
    /// The plugin name used for config file path resolution
    const PLUGIN_NAME: &'static str;

    /// Path of this plugin's config file
    fn path() -> PathBuf {
        PathBuf::from("addons/ggscore/configs").join(format!("{}.toml", Self::PLUGIN_NAME))
    }

    /// Load config from file, creating default if missing.
    fn load() -> ConfigResult<Self> {
        let path = Self::path();

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Self = toml::from_str(&content)?;
            tracing::debug!("Loaded config for {} from {:?}", Self::PLUGIN_NAME, path);
            Ok(config)
        } else {
            let default = Self::default();
            default.save()?;
            tracing::info!(
                "Created default config for {} at {:?}",
                Self::PLUGIN_NAME,
                path
            );
            Ok(default)
        }
    }

    /// Save config to file, creating parent directories as needed.
    fn save(&self) -> ConfigResult<()> {
        let path = Self::path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        tracing::debug!("Saved config for {} to {:?}", Self::PLUGIN_NAME, path);
        Ok(())
    }

    /// Reload config from file into self.
    fn reload(&mut self) -> ConfigResult<()> {
        let path = Self::path();
        let content = std::fs::read_to_string(&path)?;
        *self = toml::from_str(&content)?;
        tracing::debug!("Reloaded config for {} from {:?}", Self::PLUGIN_NAME, path);
        Ok(())
    }
}

/// Scoreboard plugin configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreboardConfig {
    /// Multi-kill scoring mode: 0 = disabled, 1 = show multi-kill progress
    /// on the death counter, 2 = show kills remaining. Any other value is
    /// treated as 0.
    pub multi_kill: i32,
}

impl Default for ScoreboardConfig {
    fn default() -> Self {
        Self { multi_kill: 0 }
    }
}

impl PluginConfig for ScoreboardConfig {
    const PLUGIN_NAME: &'static str = "gg_scoreboard";
}

/// Live multi-kill setting, re-read on every computation
static MULTI_KILL: AtomicI32 = AtomicI32::new(0);

/// The current multi-kill mode.
///
/// Out-of-range stored values degrade to [`MultiKillMode::Disabled`].
pub fn multi_kill_mode() -> MultiKillMode {
    MultiKillMode::from(MULTI_KILL.load(Ordering::Acquire))
}

/// Set the live multi-kill value
pub fn set_multi_kill(value: i32) {
    let old = MULTI_KILL.swap(value, Ordering::AcqRel);
    if old != value {
        tracing::info!("multi_kill changed: {} -> {}", old, value);
    }
}

/// Push a loaded config into the live cells
pub fn apply(config: &ScoreboardConfig) {
    set_multi_kill(config.multi_kill);
}
