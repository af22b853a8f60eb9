//! Runtime settings
//!
//! Read once at startup from the process environment, optionally overlaid by
//! `KEY=VALUE` files listed in `APP_ENV_FILES` (comma-separated). File values
//! win over process values.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_WS_PORT;
use crate::error::{GameError, Result};

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
    Production,
    #[default]
    Development,
    Test,
}

impl AppEnv {
    /// Map the many spellings in use onto the three environments; anything
    /// unknown (or unset) is development
    pub fn normalize(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("production" | "prd" | "prod") => AppEnv::Production,
            Some("test") => AppEnv::Test,
            _ => AppEnv::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppEnv::Production => "production",
            AppEnv::Development => "development",
            AppEnv::Test => "test",
        }
    }

    /// Log filter used when `RUST_LOG` is not set
    pub fn default_log_level(&self) -> &'static str {
        match self {
            AppEnv::Production => "info",
            AppEnv::Development | AppEnv::Test => "debug",
        }
    }
}

impl fmt::Display for AppEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub app_env: AppEnv,
    /// Mirror game events to a relay
    pub ws_enabled: bool,
    /// Port the relay listens on
    pub ws_port: u16,
    /// Relay URL the game connects to
    pub ws_address: String,
    pub gamepad_enabled: bool,
    /// Build metadata, reported at startup when present
    pub version: Option<String>,
    pub commit: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_env: AppEnv::Development,
            ws_enabled: false,
            ws_port: DEFAULT_WS_PORT,
            ws_address: format!("ws://127.0.0.1:{DEFAULT_WS_PORT}"),
            gamepad_enabled: true,
            version: None,
            commit: None,
        }
    }
}

impl Settings {
    /// Load from the process environment and any `APP_ENV_FILES`
    pub fn from_env() -> Result<Self> {
        let files = std::env::var("APP_ENV_FILES").unwrap_or_default();
        let mut overlay = HashMap::new();
        for file in files.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            load_env_file(Path::new(file), &mut overlay);
        }

        Self::from_lookup(|key| {
            overlay
                .get(key)
                .cloned()
                .or_else(|| std::env::var(key).ok())
        })
    }

    /// Build from an arbitrary key lookup
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let ws_port = match get("WS_PORT") {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| GameError::Config(format!("WS_PORT must be a port number, got {v:?}")))?,
            None => defaults.ws_port,
        };

        Ok(Self {
            app_env: AppEnv::normalize(get("APP_ENV").as_deref()),
            ws_enabled: parse_bool("WS_ENABLED", get("WS_ENABLED"), defaults.ws_enabled)?,
            ws_port,
            ws_address: get("WS_ADDRESS").unwrap_or_else(|| format!("ws://127.0.0.1:{ws_port}")),
            gamepad_enabled: parse_bool(
                "GAMEPAD_ENABLED",
                get("GAMEPAD_ENABLED"),
                defaults.gamepad_enabled,
            )?,
            version: get("GIT_RELEASE"),
            commit: get("GIT_COMMIT"),
        })
    }
}

fn parse_bool(key: &str, value: Option<String>, default: bool) -> Result<bool> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(GameError::Config(format!("{key} must be a boolean, got {value:?}"))),
    }
}

/// Parse `KEY=VALUE` lines; blank lines, `#` comments and lines without `=`
/// are skipped
pub fn parse_env_file(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .collect()
}

fn load_env_file(path: &Path, overlay: &mut HashMap<String, String>) {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            overlay.extend(parse_env_file(&content));
            log::debug!("env file loaded from {}", path.display());
        }
        Err(e) => log::debug!("env file {} not loaded: {e}", path.display()),
    }
}
