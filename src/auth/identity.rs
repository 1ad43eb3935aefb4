//! Identity resolution
//!
//! Turns a bearer token into the active [`Identity`] it names. Every token
//! failure and an unknown subject collapse into the same client-facing 401;
//! the precise reason only reaches the logs.

use crate::auth::roles::Role;
use crate::auth::token::{TokenService, VerificationError};
use crate::core::error::{CuraError, Result};
use crate::db::models::Identity;
use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use thiserror::Error;

/// Client message for every credential failure
pub const INVALID_CREDENTIALS: &str = "Could not validate credentials";

/// Storage the resolver and the auth handlers need
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>>;

    async fn find_identity_by_id(&self, id: &str) -> Result<Option<Identity>>;

    /// Persist a new active identity; a taken email is `CuraError::Conflict`
    async fn insert_identity(&self, email: &str, password_hash: &str, role: Role)
        -> Result<Identity>;
}

/// Why a request could not be tied to an identity
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error(transparent)]
    Token(#[from] VerificationError),

    #[error("token subject does not exist")]
    UnknownSubject,

    #[error("inactive user")]
    AccountInactive,

    #[error(transparent)]
    Store(#[from] CuraError),
}

impl AuthError {
    /// Short code used in log fields
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::Token(e) => e.reason(),
            AuthError::UnknownSubject => "unknown_subject",
            AuthError::AccountInactive => "inactive",
            AuthError::Store(_) => "store",
        }
    }
}

impl From<AuthError> for CuraError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AccountInactive => CuraError::AccountInactive,
            AuthError::Store(e) => e,
            _ => CuraError::AuthenticationError(INVALID_CREDENTIALS.to_string()),
        }
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
///
/// The scheme is matched case-insensitively; anything else yields `None`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Resolve a bearer token to an active identity
pub async fn resolve(
    tokens: &TokenService,
    store: &dyn IdentityStore,
    token: Option<&str>,
) -> std::result::Result<Identity, AuthError> {
    let token = token.ok_or(AuthError::MissingToken)?;
    let subject = tokens.verify(token)?;

    let identity = store
        .find_identity_by_id(&subject)
        .await?
        .ok_or(AuthError::UnknownSubject)?;

    if !identity.is_active {
        return Err(AuthError::AccountInactive);
    }

    Ok(identity)
}
