use axum::{extract::FromRequestParts, http::request::Parts};

use crate::models::User;
use crate::state::AppState;
use crate::utils::error::AppError;

/// The authenticated caller. Rejects with `401` when no session resolves.
pub struct SessionUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        state.identity.authenticate(&parts.headers).await.map(SessionUser)
    }
}

/// The caller if a session resolves. Authentication failures yield `None`;
/// persistence failures still reject.
pub struct OptionalSessionUser(pub Option<User>);

#[axum::async_trait]
impl FromRequestParts<AppState> for OptionalSessionUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match state.identity.authenticate(&parts.headers).await {
            Ok(user) => Ok(OptionalSessionUser(Some(user))),
            Err(AppError::AuthError(_)) => Ok(OptionalSessionUser(None)),
            Err(e) => Err(e),
        }
    }
}
