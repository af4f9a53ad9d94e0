//! Wire DTOs and errors for the auth endpoints.
//!
//! `User` mirrors the backend's user payload; fields the client does not know
//! about are kept in `extra` so a stored session round-trips losslessly.

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;

use serde::{Deserialize, Serialize};

/// Shown when the request could not reach the server at all.
pub const NETWORK_FAILURE_MESSAGE: &str = "Unable to reach the server. Please try again.";
/// Shown when the server replied with something we could not read.
pub const MALFORMED_RESPONSE_MESSAGE: &str = "Unexpected response from the server.";

// =============================================================================
// USER
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    /// Unknown roles fall back to the least-privileged role.
    #[default]
    #[serde(other)]
    Employee,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Admin => "admin",
            Self::Employee => "employee",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Successful `/auth/login` reply.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: User,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("access_token", &"***")
            .field("user", &self.user)
            .finish()
    }
}

/// Successful `/auth/register` reply.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub user: User,
}

/// Error body the backend sends with non-2xx statuses.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// ERROR
// =============================================================================

/// Failures from an auth request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The server understood the request and refused it.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The request did not complete (connect failure, timeout, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The server reply could not be decoded.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// Text for the form's alert area.
    ///
    /// Rejections carry the server's own wording; transport failures get a
    /// generic sentence so raw error chains never reach the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            Self::Network(_) | Self::HttpClientBuild(_) => NETWORK_FAILURE_MESSAGE.to_owned(),
            Self::Parse(_) => MALFORMED_RESPONSE_MESSAGE.to_owned(),
        }
    }
}
