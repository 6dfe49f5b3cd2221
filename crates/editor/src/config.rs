use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use guidebook_core::AutoSaveConfig;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} has invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Editor configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding one `<guide-id>.json` draft per guide.
    pub drafts_dir: PathBuf,
    pub autosave: AutoSaveConfig,
    /// Event bus channel capacity.
    pub event_bus_capacity: usize,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an explicit variable source.
    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = AutoSaveConfig::default();

        let autosave = AutoSaveConfig::default()
            .with_debounce(Duration::from_millis(parse_or(
                &lookup,
                "AUTOSAVE_DEBOUNCE_MS",
                millis(defaults.debounce),
            )?))
            .with_max_retries(parse_or(&lookup, "AUTOSAVE_MAX_RETRIES", defaults.max_retries)?)
            .with_retry_delay(Duration::from_millis(parse_or(
                &lookup,
                "AUTOSAVE_RETRY_DELAY_MS",
                millis(defaults.retry_delay),
            )?))
            .with_enabled(parse_flag(&lookup, "AUTOSAVE_ENABLED", defaults.enabled)?);

        Ok(Self {
            drafts_dir: lookup("GUIDEBOOK_DRAFTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./drafts")),
            autosave,
            event_bus_capacity: parse_or(&lookup, "EVENT_BUS_CAPACITY", 1024)?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

fn parse_flag(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw,
            reason: "expected true or false".to_string(),
        }),
    }
}
