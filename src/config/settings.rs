//! Client Settings
//!
//! Connection settings for the chat server.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Base URL of the chat server
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model key used when the caller does not pick one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Whole-request timeout in seconds; generous, replies stream slowly
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Partial settings as read from one config file; unset fields keep the
/// value from earlier sources.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsPatch {
    pub base_url: Option<String>,
    pub default_model: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    300
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_model: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Settings {
    /// Fold a config file patch into these settings
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(base_url) = patch.base_url {
            self.base_url = base_url;
        }
        if let Some(model) = patch.default_model {
            self.default_model = Some(model);
        }
        if let Some(secs) = patch.connect_timeout_secs {
            self.connect_timeout_secs = secs;
        }
        if let Some(secs) = patch.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
    }

    /// Apply environment variable overrides (`YAPPER_BASE_URL`,
    /// `YAPPER_MODEL`); env vars win over every file source.
    pub fn apply_env(&mut self) {
        if let Ok(base_url) = std::env::var("YAPPER_BASE_URL") {
            self.base_url = base_url;
        }
        if let Ok(model) = std::env::var("YAPPER_MODEL") {
            self.default_model = Some(model);
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Base URL with any trailing slash removed
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
