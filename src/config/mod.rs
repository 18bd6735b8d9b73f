//! Configuration and settings management.
//!
//! Settings are stored in the user's config directory as JSON and can be
//! overridden with `SENDPULSE_*` environment variables.

mod settings;

pub use settings::{
    ApiSettings, AuthSettings, Settings, SettingsError, DEFAULT_BASE_URL, ENV_API_BASE,
    ENV_SECRET, ENV_USER_ID,
};
