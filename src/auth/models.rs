//! Authentication request/response models

use crate::auth::password::validate_password;
use crate::auth::roles::Role;
use crate::core::error::{CuraError, Result};
use crate::db::models::Identity;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// Canonical form used for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Reject addresses that are obviously not emails
pub fn validate_email(email: &str) -> Result<()> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(CuraError::ValidationError("Invalid email address".to_string()))
    }
}

/// Register request
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub user_type: Role,
}

impl RegisterRequest {
    /// Validate fields, returning the normalized email
    pub fn validate(&self) -> Result<String> {
        let email = normalize_email(&self.email);
        validate_email(&email)?;
        validate_password(&self.password)?;
        Ok(email)
    }
}

/// Login form (OAuth2 password flow; `username` carries the email)
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Issued bearer token plus the identity it names
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserInfo,
}

impl TokenResponse {
    pub fn bearer(access_token: String, identity: &Identity) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            user: UserInfo::from(identity),
        }
    }
}

/// User info (without password)
#[derive(Debug, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub user_type: Role,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<&Identity> for UserInfo {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.clone(),
            email: identity.email.clone(),
            user_type: identity.role,
            is_active: identity.is_active,
            created_at: identity.created_at.clone(),
            updated_at: identity.updated_at.clone(),
        }
    }
}

/// Update current user request
#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub password: Option<String>,
}
