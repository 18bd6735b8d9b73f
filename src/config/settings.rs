//! Client settings and configuration types.
//!
//! Settings are persisted to `~/.config/sendpulse/settings.json` (or the
//! platform equivalent) and can be overridden from the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default SendPulse REST API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.sendpulse.com";

/// Environment variable overriding [`ApiSettings::base_url`].
pub const ENV_API_BASE: &str = "SENDPULSE_API_BASE";
/// Environment variable overriding [`AuthSettings::user_id`].
pub const ENV_USER_ID: &str = "SENDPULSE_USER_ID";
/// Environment variable overriding [`AuthSettings::secret`].
pub const ENV_SECRET: &str = "SENDPULSE_SECRET";

/// Errors that can occur while loading or saving settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Top-level client settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// API endpoint configuration.
    pub api: ApiSettings,
    /// Credentials used to obtain access tokens.
    pub auth: AuthSettings,
}

/// API endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL every request path is appended to.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

/// API credentials.
///
/// When `user_id` and `secret` are both set they are used directly;
/// otherwise the credentials are read from the system keychain entry named
/// by `keychain_profile`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub user_id: Option<String>,
    pub secret: Option<String>,
    pub keychain_profile: Option<String>,
}

impl Settings {
    /// Returns the platform settings file location, if a home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "sendpulse", "sendpulse")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Loads settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Loads settings from `path` when it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Writes settings as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Applies `SENDPULSE_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from an arbitrary key lookup. Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(base_url) = get(ENV_API_BASE) {
            self.api.base_url = base_url;
        }
        if let Some(user_id) = get(ENV_USER_ID) {
            self.auth.user_id = Some(user_id);
        }
        if let Some(secret) = get(ENV_SECRET) {
            self.auth.secret = Some(secret);
        }
    }
}
