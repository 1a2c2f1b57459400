//! Identity resolution for incoming requests.
//!
//! Sessions are issued elsewhere; this module only resolves a bearer token
//! to the [`User`] owning it.

pub mod extract;

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use std::sync::Arc;

use crate::models::User;
use crate::storage::SessionStore;
use crate::utils::error::AppError;

pub use extract::{OptionalSessionUser, SessionUser};

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves the request to a user, or fails with [`AppError::AuthError`].
    async fn authenticate(&self, headers: &HeaderMap) -> Result<User, AppError>;
}

/// Token from an `Authorization: Bearer <token>` header value.
pub fn extract_bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Resolves bearer tokens through a [`SessionStore`].
pub struct SessionTokenProvider {
    sessions: Arc<dyn SessionStore>,
}

impl SessionTokenProvider {
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl IdentityProvider for SessionTokenProvider {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<User, AppError> {
        let header = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::AuthError("Missing Authorization header".to_string()))?;

        let token = extract_bearer_token(header).ok_or_else(|| {
            AppError::AuthError("Invalid Authorization header format".to_string())
        })?;

        self.sessions
            .find_session_user(token)
            .await?
            .ok_or_else(|| AppError::AuthError("Session is invalid or expired".to_string()))
    }
}
