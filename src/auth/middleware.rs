//! Authentication middleware

use crate::api::handlers::AppState;
use crate::auth::identity::{bearer_token, resolve, INVALID_CREDENTIALS};
use crate::core::error::{CuraError, Result};
use crate::db::models::Identity;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::ops::Deref;

/// Resolved caller, stored in request extensions by [`authenticate`]
#[derive(Clone, Debug)]
pub struct AuthUser(pub Identity);

impl Deref for AuthUser {
    type Target = Identity;

    fn deref(&self) -> &Identity {
        &self.0
    }
}

/// Authentication middleware
///
/// Resolves the bearer token to an active identity or short-circuits with 401.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = bearer_token(request.headers()).map(str::to_string);

    match resolve(&state.tokens, state.user_repo.as_ref(), token.as_deref()).await {
        Ok(identity) => {
            tracing::debug!(user_id = %identity.id, role = %identity.role, "Request authenticated");
            request.extensions_mut().insert(AuthUser(identity));
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(
                reason = e.reason(),
                path = %request.uri().path(),
                "Authentication failed"
            );
            CuraError::from(e).into_response()
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = CuraError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| CuraError::AuthenticationError(INVALID_CREDENTIALS.to_string()))
    }
}
