//! Auth backend boundary.
//!
//! DESIGN
//! ======
//! The controller depends only on the `AuthApi` trait so tests can drive it
//! with in-memory fakes. `HttpAuthApi` is the production implementation that
//! talks JSON to the leave-management backend.

pub mod http;
pub mod types;

pub use http::HttpAuthApi;
pub use types::{ApiError, LoginResponse, Role, User};

/// Requests the auth form issues against the backend.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for an access token and the user record.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] when the server refuses the
    /// credentials, and [`ApiError::Network`] / [`ApiError::Parse`] when the
    /// request cannot complete or the reply is malformed.
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError>;

    /// Create a new account and return the created user.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`AuthApi::login`]; a duplicate email is a rejection.
    async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, ApiError>;
}
