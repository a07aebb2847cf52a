//! Runtime configuration.
//! Request-size, detection and cache limits are fixed constants; only the
//! transport and logging knobs can be overridden from the environment.

use std::time::Duration;

use crate::translate::{
    DETECT_LANGUAGE_LIMIT, MAX_CACHE_SIZE, MAX_TEXT_LENGTH, MIN_DETECT_LENGTH,
};

pub const DEFAULT_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";
pub const DEFAULT_CLIENT_ID: &str = "gtx";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const ENV_ENDPOINT: &str = "QUIZZET_TRANSLATE_ENDPOINT";
const ENV_CLIENT_ID: &str = "QUIZZET_TRANSLATE_CLIENT";
const ENV_TIMEOUT: &str = "QUIZZET_REQUEST_TIMEOUT_SECS";
const ENV_DETECTOR: &str = "QUIZZET_DETECTOR";
const ENV_LOG_FORMAT: &str = "QUIZZET_LOG_FORMAT";

/// Which language detector the service uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorKind {
    /// Ask the translation endpoint.
    Remote,
    /// whatlang, offline.
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{var} has unknown value {value:?} (expected one of: {expected})")]
    UnknownValue {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    pub endpoint: String,
    pub client_id: String,
    pub request_timeout: Duration,
    pub detector: DetectorKind,
    pub log_format: LogFormat,
    pub max_text_length: usize,
    pub detect_sample_chars: usize,
    pub min_detect_length: usize,
    pub cache_capacity: usize,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            detector: DetectorKind::Remote,
            log_format: LogFormat::Text,
            max_text_length: MAX_TEXT_LENGTH,
            detect_sample_chars: DETECT_LANGUAGE_LIMIT,
            min_detect_length: MIN_DETECT_LENGTH,
            cache_capacity: MAX_CACHE_SIZE,
        }
    }
}

impl TranslatorConfig {
    /// Defaults overlaid with `QUIZZET_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|v| !v.trim().is_empty()) {
            config.endpoint = endpoint.trim().to_string();
        }
        if let Some(client_id) = lookup(ENV_CLIENT_ID).filter(|v| !v.trim().is_empty()) {
            config.client_id = client_id.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_TIMEOUT) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or(ConfigError::InvalidNumber {
                    var: ENV_TIMEOUT,
                    value: raw.clone(),
                })?;
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = lookup(ENV_DETECTOR) {
            config.detector = match raw.trim().to_ascii_lowercase().as_str() {
                "remote" => DetectorKind::Remote,
                "local" => DetectorKind::Local,
                _ => {
                    return Err(ConfigError::UnknownValue {
                        var: ENV_DETECTOR,
                        value: raw,
                        expected: "remote, local",
                    })
                }
            };
        }
        if let Some(raw) = lookup(ENV_LOG_FORMAT) {
            config.log_format = match raw.trim().to_ascii_lowercase().as_str() {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => {
                    return Err(ConfigError::UnknownValue {
                        var: ENV_LOG_FORMAT,
                        value: raw,
                        expected: "text, json",
                    })
                }
            };
        }

        Ok(config)
    }
}
