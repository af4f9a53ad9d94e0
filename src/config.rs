//! Client configuration parsed from environment variables.

use std::path::PathBuf;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SESSION_FILE: &str = ".leave-session.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid base URL '{0}': expected http:// or https://")]
    InvalidBaseUrl(String),
    #[error("invalid value for {key}: {value}")]
    InvalidNumber { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub base_url: String,
    pub timeouts: AuthTimeouts,
    pub session_file: PathBuf,
}

impl AuthConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `LEAVE_API_BASE_URL`: default `http://127.0.0.1:5000`
    /// - `LEAVE_REQUEST_TIMEOUT_SECS`: default 30
    /// - `LEAVE_CONNECT_TIMEOUT_SECS`: default 10
    /// - `LEAVE_SESSION_FILE`: default `.leave-session.json`
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL has no http(s) scheme or a timeout is
    /// not a positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = normalize_base_url(
            &std::env::var("LEAVE_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_owned()),
        )?;
        let timeouts = AuthTimeouts {
            request_secs: env_parse_secs("LEAVE_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: env_parse_secs("LEAVE_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };
        let session_file = std::env::var_os("LEAVE_SESSION_FILE")
            .map_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE), PathBuf::from);

        Ok(Self { base_url, timeouts, session_file })
    }

    /// Replace the base URL (e.g. from a CLI flag).
    ///
    /// # Errors
    ///
    /// Returns an error if the URL has no http(s) scheme.
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.base_url = normalize_base_url(raw)?;
        Ok(self)
    }
}

/// Trim whitespace and trailing slashes; require an http(s) scheme.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidBaseUrl`] when the scheme or host is missing.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let has_host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .is_some_and(|rest| !rest.is_empty());
    if !has_host {
        return Err(ConfigError::InvalidBaseUrl(raw.to_owned()));
    }
    Ok(trimmed.to_owned())
}

fn env_parse_secs(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(v) if v > 0 => Ok(v),
            _ => Err(ConfigError::InvalidNumber { key, value: raw }),
        },
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
