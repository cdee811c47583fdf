//! Session identity delegated to the external auth provider.
//!
//! The provider issues the bearer tokens; this service only verifies them and
//! reads the session user out. `auth_middleware` runs on every request and
//! injects a `SessionUser` when a valid token is present.

pub mod handlers;
pub mod jwt;
pub mod middleware;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use jwt::JwtAuthProvider;
pub use middleware::{auth_middleware, MaybeUser, RequireUser, SessionToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn from_claim(raw: Option<&str>) -> Self {
        match raw {
            Some("admin") => Role::Admin,
            _ => Role::User,
        }
    }
}

/// The user behind the current request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("session has been signed out")]
    SignedOut,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolves the session user for a bearer token.
    async fn current_user(&self, token: &str) -> Result<SessionUser, AuthError>;

    /// Ends the session; later lookups with the same token fail.
    async fn sign_out(&self, token: &str) -> Result<(), AuthError>;
}
