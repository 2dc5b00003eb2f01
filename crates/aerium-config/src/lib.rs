//! Shared configuration for the Aerium dashboard.
//!
//! TOML profiles merged with environment variables (`AERIUM_*`), plus the
//! on-disk session cache (the sessionStorage analog: last room, actuation
//! states). Both are best-effort — a missing or corrupt file degrades to
//! defaults, never to a startup failure.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use aerium_core::store::SessionSnapshot;
use aerium_core::MonitorConfig;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("unknown profile '{profile}'")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("failed to parse session cache: {0}")]
    SessionParse(#[from] toml::de::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            profiles: HashMap::new(),
        }
    }
}

/// A named backend profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL (e.g., "http://iaq.local:8000").
    pub server: String,

    /// Brand to open on launch (overrides the session cache).
    pub brand: Option<String>,

    /// Room to open on launch (overrides the session cache).
    pub room: Option<String>,

    /// Measurement poll cadence in seconds.
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,

    /// Prediction refresh cadence in seconds.
    #[serde(default = "default_prediction_secs")]
    pub prediction_secs: u64,

    /// Window query span in hours.
    #[serde(default = "default_window_hours")]
    pub window_hours: u32,

    /// Window aggregation step.
    #[serde(default = "default_window_step")]
    pub window_step: String,

    /// Whether to open the push channel.
    #[serde(default = "default_websocket")]
    pub websocket: bool,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_poll_secs() -> u64 {
    5
}
fn default_prediction_secs() -> u64 {
    60
}
fn default_window_hours() -> u32 {
    1
}
fn default_window_step() -> String {
    "1min".into()
}
fn default_websocket() -> bool {
    true
}
fn default_timeout() -> u64 {
    30
}

// ── Paths ───────────────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "aerium", "aerium").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Path of the session cache file, next to the config.
pub fn session_path() -> PathBuf {
    config_path().with_file_name("session.toml")
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("aerium");
    p
}

// ── Config loading / saving ─────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = config_path();

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("AERIUM_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

/// Resolve a profile by name, or the default one.
pub fn resolve_profile<'a>(
    config: &'a Config,
    name: Option<&'a str>,
) -> Result<(&'a str, &'a Profile), ConfigError> {
    let name = name
        .or(config.default_profile.as_deref())
        .unwrap_or("default");
    config
        .profiles
        .get(name)
        .map(|p| (name, p))
        .ok_or_else(|| ConfigError::UnknownProfile { profile: name.into() })
}

/// Build a [`MonitorConfig`] from a profile.
pub fn profile_to_monitor_config(profile: &Profile) -> Result<MonitorConfig, ConfigError> {
    let base_url: url::Url = profile
        .server
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "server".into(),
            reason: format!("invalid URL: {}", profile.server),
        })?;

    let mut config = MonitorConfig::new(base_url);
    config.poll_interval = Duration::from_secs(profile.poll_secs);
    config.prediction_interval = Duration::from_secs(profile.prediction_secs);
    config.window_hours = profile.window_hours;
    config.window_step = profile.window_step.clone();
    config.websocket_enabled = profile.websocket;
    config.timeout = Duration::from_secs(profile.timeout);
    Ok(config)
}

// ── Session cache ───────────────────────────────────────────────────

/// Load the session cache, if one was written this session. Corrupt or
/// absent files are just an empty session.
pub fn load_session() -> SessionSnapshot {
    let Ok(raw) = std::fs::read_to_string(session_path()) else {
        return SessionSnapshot::default();
    };
    toml::from_str(&raw).unwrap_or_default()
}

/// Persist the session cache (best-effort; failures are the caller's to
/// log, not to die on).
pub fn save_session(snapshot: &SessionSnapshot) -> Result<(), ConfigError> {
    let path = session_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(snapshot)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn profile(server: &str) -> Profile {
        Profile {
            server: server.into(),
            brand: None,
            room: None,
            poll_secs: default_poll_secs(),
            prediction_secs: default_prediction_secs(),
            window_hours: default_window_hours(),
            window_step: default_window_step(),
            websocket: default_websocket(),
            timeout: default_timeout(),
        }
    }

    #[test]
    fn profile_converts_to_monitor_config() {
        let mut p = profile("http://iaq.local:8000");
        p.poll_secs = 10;
        p.websocket = false;

        let config = profile_to_monitor_config(&p).unwrap();
        assert_eq!(config.base_url.as_str(), "http://iaq.local:8000/");
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert!(!config.websocket_enabled);
    }

    #[test]
    fn invalid_server_url_is_a_validation_error() {
        let p = profile("not a url");
        assert!(matches!(
            profile_to_monitor_config(&p),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn resolve_profile_falls_back_to_default_name() {
        let mut config = Config::default();
        config.profiles.insert("default".into(), profile("http://a"));
        config.profiles.insert("lab".into(), profile("http://b"));

        let (name, _) = resolve_profile(&config, None).unwrap();
        assert_eq!(name, "default");
        let (name, p) = resolve_profile(&config, Some("lab")).unwrap();
        assert_eq!(name, "lab");
        assert_eq!(p.server, "http://b");
        assert!(resolve_profile(&config, Some("nope")).is_err());
    }

    #[test]
    fn profile_defaults_fill_in_from_toml() {
        let p: Profile = toml::from_str(r#"server = "http://iaq.local:8000""#).unwrap();
        assert_eq!(p.poll_secs, 5);
        assert_eq!(p.window_step, "1min");
        assert!(p.websocket);
    }
}
