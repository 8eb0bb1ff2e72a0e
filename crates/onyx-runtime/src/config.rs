#![forbid(unsafe_code)]

//! Session configuration loadable from TOML or JSON.
//!
//! Every field has a default, so an empty document is a valid config:
//!
//! ```toml
//! [sync]
//! enabled = true
//! debounce_ms = 3000
//! push_only_in_edit_mode = true
//! profile_id = "user-1"
//!
//! [storage]
//! path = "onyx-layouts.json"
//!
//! [grid]
//! breakpoint = "wide"
//!
//! [logging]
//! filter = "info,onyx.sync=debug"
//! json = false
//! ```

use std::path::{Path, PathBuf};

use onyx_core::Breakpoint;
use serde::{Deserialize, Serialize};
use web_time::Duration;

/// Default quiet period before a layout push, in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 3000;

/// Upper bound accepted for `sync.debounce_ms`.
pub const MAX_DEBOUNCE_MS: u64 = 600_000;

// ---------------------------------------------------------------------------
// Top-level OnyxConfig
// ---------------------------------------------------------------------------

/// Everything a [`DashboardSession`](crate::session::DashboardSession) needs
/// besides its collaborators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnyxConfig {
    pub sync: SyncConfig,
    pub storage: StorageConfig,
    pub grid: GridConfig,
    pub logging: LoggingConfig,
}

impl OnyxConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Load by extension (`.json` is JSON, anything else TOML) and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_file(path)?
        } else {
            Self::from_toml_file(path)?
        };
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Returns one message per problem; empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.sync.debounce_ms > MAX_DEBOUNCE_MS {
            errors.push(format!(
                "sync.debounce_ms must be at most {MAX_DEBOUNCE_MS}, got {}",
                self.sync.debounce_ms
            ));
        }
        if let Some(profile) = &self.sync.profile_id
            && profile.trim().is_empty()
        {
            errors.push("sync.profile_id must not be blank".to_string());
        }
        if let Some(path) = &self.storage.path
            && path.as_os_str().is_empty()
        {
            errors.push("storage.path must not be empty".to_string());
        }
        if let Err(err) = tracing_subscriber::EnvFilter::try_new(&self.logging.filter) {
            errors.push(format!("logging.filter is not a valid filter: {err}"));
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Remote write-back behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Master switch for load-on-mount and pushes. Default: true.
    pub enabled: bool,
    /// Trailing quiet period before a push. Default: 3000.
    pub debounce_ms: u64,
    /// Only schedule pushes for edits made in edit mode. Default: true.
    pub push_only_in_edit_mode: bool,
    /// Profile the remote copy belongs to; no profile means no sync.
    pub profile_id: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            push_only_in_edit_mode: true,
            profile_id: None,
        }
    }
}

impl SyncConfig {
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce_ms = u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile_id = Some(profile.into());
        self
    }
}

/// Local snapshot persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON snapshot file. `None` keeps layouts in memory only.
    pub path: Option<PathBuf>,
}

/// Grid presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Breakpoint used when packing the grid into rows. Default: wide.
    pub breakpoint: Breakpoint,
}

/// Tracing subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence. Default: "info".
    pub filter: String,
    /// Emit JSON lines instead of human-readable text. Default: false.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when loading a configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Json(serde_json::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
