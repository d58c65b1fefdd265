//! Navigation configuration — bus policy, dispatch timeout, labels, TUI rates.
//!
//! User-level config: `~/.gtdnav/config.yaml`
//! Project-level config: `.gtdnav/config.yaml` (overrides user keys)
//!
//! Both files are partial: missing keys keep their defaults. An explicit
//! `--config` path is strict (errors surface); the layered lookup is
//! lenient (bad files are logged and skipped).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use thiserror::Error;
use tracing::warn;

use crate::bus::DeliveryPolicy;
use crate::model::ActionFilter;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid YAML in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("YAML serialize error: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Event bus settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub delivery: DeliveryPolicy,
}

/// Affinity dispatcher settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// How long a marshaled action may take. 0 waits indefinitely.
    pub timeout_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { timeout_ms: 5000 }
    }
}

/// Navigation tree settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Dock tag the tree registers under on `AppInit`.
    pub dock: String,
    /// Label prefix of the inbox node.
    pub inbox_label: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            dock: "nav-tree".into(),
            inbox_label: "Inbox".into(),
        }
    }
}

/// Terminal front-end settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Owner-loop drain interval.
    pub tick_ms: u64,
    /// Frame interval.
    pub render_ms: u64,
    /// Messages kept in the activity log.
    pub activity_capacity: usize,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            tick_ms: 16,
            render_ms: 33,
            activity_capacity: 256,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    pub bus: BusConfig,
    pub dispatch: DispatchConfig,
    pub navigation: NavigationConfig,
    /// Filter active at startup.
    pub filter: ActionFilter,
    pub tui: TuiConfig,
}

/// Path to `~/.gtdnav/`.
fn dirs_path() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE")
            .ok()
            .map(|p| PathBuf::from(p).join(".gtdnav"))
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME")
            .ok()
            .map(|p| PathBuf::from(p).join(".gtdnav"))
    }
}

/// Path to the user-level config file.
pub fn user_config_path() -> Option<PathBuf> {
    dirs_path().map(|p| p.join("config.yaml"))
}

/// Path to the project-level config file.
pub fn project_config_path() -> PathBuf {
    PathBuf::from(".gtdnav").join("config.yaml")
}

fn read_yaml(path: &Path) -> ConfigResult<Value> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Overlay `top` onto `base`, recursing into mappings.
fn merge_yaml(base: &mut Value, top: Value) {
    match (base, top) {
        (Value::Mapping(base), Value::Mapping(top)) => {
            for (key, value) in top {
                match base.get_mut(&key) {
                    Some(slot) => merge_yaml(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (slot, value) => *slot = value,
    }
}

impl NavConfig {
    /// Load user + project config, falling back to defaults.
    pub fn load() -> Self {
        Self::load_layered(user_config_path().as_deref(), Some(&project_config_path()))
    }

    /// Merge the given files in order (later wins). Missing files are
    /// skipped silently; unreadable or invalid ones with a warning.
    pub fn load_layered(user: Option<&Path>, project: Option<&Path>) -> Self {
        let mut merged = Value::Mapping(Default::default());
        for path in [user, project].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            match read_yaml(path) {
                Ok(layer) => merge_yaml(&mut merged, layer),
                Err(e) => warn!("ignoring config: {e}"),
            }
        }
        serde_yaml::from_value(merged).unwrap_or_else(|e| {
            warn!("merged config invalid, using defaults: {e}");
            Self::default()
        })
    }

    /// Load a single file strictly.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let value = read_yaml(path)?;
        serde_yaml::from_value(value).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write this config as YAML, creating parent directories.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Dispatch timeout, `None` when unbounded.
    pub fn dispatch_timeout(&self) -> Option<Duration> {
        match self.dispatch.timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}
