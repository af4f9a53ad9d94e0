//! HTTP client for the backend's `/auth/*` routes.
//!
//! Thin `reqwest` wrapper. Status handling and body decoding live in pure
//! functions (`parse_login`, `parse_register`, `rejection_message`) so they
//! can be tested without a server.

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;

use std::time::Duration;

use super::AuthApi;
use super::types::{ApiError, ErrorBody, LoginResponse, RegisterResponse, User};
use crate::config::AuthConfig;

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpAuthApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAuthApi {
    /// Build a client against `config.base_url` with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the TLS/HTTP stack fails to
    /// initialize.
    pub fn new(config: &AuthConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.clone() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<T: serde::Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<(u16, String), ApiError> {
        let url = endpoint(&self.base_url, path);
        tracing::debug!(%url, "auth request");

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        tracing::debug!(%url, status, "auth response");
        Ok((status, text))
    }
}

#[async_trait::async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest { email, password };
        let (status, text) = self.post_json(LOGIN_PATH, &body).await?;
        parse_login(status, &text)
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, ApiError> {
        let body = RegisterRequest { name, email, password };
        let (status, text) = self.post_json(REGISTER_PATH, &body).await?;
        parse_register(status, &text)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(serde::Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(serde::Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

// =============================================================================
// PARSING
// =============================================================================

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Displayable text for a non-2xx reply: the body's `error` (or `message`)
/// string when present, otherwise the bare status.
fn rejection_message(status: u16, body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .error
        .or(parsed.message)
        .map(|m| m.trim().to_owned())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("request failed with status {status}"))
}

fn parse_login(status: u16, body: &str) -> Result<LoginResponse, ApiError> {
    if !is_success(status) {
        return Err(ApiError::Rejected { status, message: rejection_message(status, body) });
    }
    let resp: LoginResponse = serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))?;
    if resp.access_token.is_empty() {
        return Err(ApiError::Parse("empty access_token".to_owned()));
    }
    Ok(resp)
}

fn parse_register(status: u16, body: &str) -> Result<User, ApiError> {
    if !is_success(status) {
        return Err(ApiError::Rejected { status, message: rejection_message(status, body) });
    }
    let resp: RegisterResponse = serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))?;
    if let Some(message) = &resp.message {
        tracing::debug!(%message, user_id = resp.user.id, "registration accepted");
    }
    Ok(resp.user)
}
