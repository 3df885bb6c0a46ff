use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::modules::cache::DEFAULT_STORE_NAME;
use crate::modules::engine::DEFAULT_HAPTIC_PULSE;
use crate::modules::gesture::DOUBLE_TAP_WINDOW;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";
pub const DEFAULT_STORE_DIR: &str = ".reaction";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct ReactionConfig {
    pub api_base: Url,
    pub http_timeout: Duration,
    pub store_dir: PathBuf,
    pub store_name: String,
    pub double_tap_window: Duration,
    pub haptic_pulse: Duration,
    pub session_token: Option<String>,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            api_base: Url::parse(DEFAULT_API_BASE).expect("default api base is a valid url"),
            http_timeout: Duration::from_secs(30),
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
            store_name: DEFAULT_STORE_NAME.to_string(),
            double_tap_window: DOUBLE_TAP_WINDOW,
            haptic_pulse: DEFAULT_HAPTIC_PULSE,
            session_token: None,
        }
    }
}

impl ReactionConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; unset or blank keys
    /// keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut cfg = Self::default();

        if let Some(v) = get("REACTION_API_BASE") {
            cfg.api_base = parse_base(&v)?;
        }
        if let Some(v) = get("REACTION_HTTP_TIMEOUT_SECS") {
            let secs = parse_u64("REACTION_HTTP_TIMEOUT_SECS", &v)?.clamp(5, 120);
            cfg.http_timeout = Duration::from_secs(secs);
        }
        if let Some(v) = get("REACTION_STORE_DIR") {
            cfg.store_dir = PathBuf::from(v);
        }
        if let Some(v) = get("REACTION_STORE_NAME") {
            cfg.store_name = v;
        }
        if let Some(v) = get("REACTION_DOUBLE_TAP_MS") {
            let ms = parse_u64("REACTION_DOUBLE_TAP_MS", &v)?.clamp(100, 1000);
            cfg.double_tap_window = Duration::from_millis(ms);
        }
        if let Some(v) = get("REACTION_HAPTIC_MS") {
            let ms = parse_u64("REACTION_HAPTIC_MS", &v)?.min(1000);
            cfg.haptic_pulse = Duration::from_millis(ms);
        }
        cfg.session_token = get("REACTION_SESSION_TOKEN");

        Ok(cfg)
    }
}

pub fn parse_base(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid {
        key: "REACTION_API_BASE",
        value: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid {
            key: "REACTION_API_BASE",
            value: raw.to_string(),
            reason: "scheme must be http or https".to_string(),
        });
    }
    Ok(url)
}

fn parse_u64(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
