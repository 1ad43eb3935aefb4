//! Authentication API handlers

use crate::api::extract::{FormBody, JsonBody};
use crate::api::handlers::AppState;
use crate::auth::identity::IdentityStore;
use crate::auth::middleware::AuthUser;
use crate::auth::models::{
    normalize_email, LoginForm, RegisterRequest, TokenResponse, UpdateMeRequest, UserInfo,
};
use crate::auth::password::validate_password;
use crate::core::error::{CuraError, Result};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

fn bad_login() -> CuraError {
    CuraError::AuthenticationError("Incorrect email or password".to_string())
}

/// Handler for POST /api/auth/register - User registration
pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let email = req.validate()?;
    tracing::info!(email = %email, user_type = %req.user_type, "User registration attempt");

    if state.user_repo.find_identity_by_email(&email).await?.is_some() {
        tracing::warn!(email = %email, "Registration rejected: email already registered");
        return Err(CuraError::Conflict("Email already registered".to_string()));
    }

    let password_hash = state.hasher.hash_blocking(req.password).await?;

    // The UNIQUE constraint still catches a concurrent registration
    let identity = state
        .user_repo
        .insert_identity(&email, &password_hash, req.user_type)
        .await?;

    let token = state.tokens.issue_now(&identity.id)?;

    tracing::info!(
        user_id = %identity.id,
        role = %identity.role,
        "User registered successfully"
    );

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse::bearer(token, &identity)),
    ))
}

/// Handler for POST /api/auth/login - OAuth2 password-flow login
pub async fn login(
    State(state): State<AppState>,
    FormBody(form): FormBody<LoginForm>,
) -> Result<Json<TokenResponse>> {
    let email = normalize_email(&form.username);
    tracing::info!(email = %email, "Login attempt");

    let identity = match state.user_repo.find_identity_by_email(&email).await? {
        Some(identity) => identity,
        None => {
            state.hasher.verify_absent_blocking(form.password).await?;
            tracing::warn!(email = %email, reason = "unknown_email", "Login failed");
            return Err(bad_login());
        }
    };

    let valid = state
        .hasher
        .verify_blocking(form.password, identity.password_hash.clone())
        .await?;
    if !valid {
        tracing::warn!(user_id = %identity.id, reason = "wrong_password", "Login failed");
        return Err(bad_login());
    }

    if !identity.is_active {
        tracing::warn!(user_id = %identity.id, reason = "inactive", "Login failed");
        return Err(CuraError::AccountInactive);
    }

    let token = state.tokens.issue_now(&identity.id)?;
    tracing::info!(user_id = %identity.id, "Login successful");

    Ok(Json(TokenResponse::bearer(token, &identity)))
}

/// Handler for GET /api/auth/me - Get current user info
pub async fn get_me(user: AuthUser) -> Json<UserInfo> {
    Json(UserInfo::from(&user.0))
}

/// Handler for PATCH /api/auth/me - Update current user info
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(req): JsonBody<UpdateMeRequest>,
) -> Result<Json<UserInfo>> {
    tracing::info!(user_id = %user.id, "Updating current user info");

    if let Some(password) = req.password {
        validate_password(&password)?;
        let password_hash = state.hasher.hash_blocking(password).await?;
        state.user_repo.update_password(&user.id, &password_hash).await?;
        tracing::info!(user_id = %user.id, "Password changed");
    }

    let identity = state
        .user_repo
        .find_identity_by_id(&user.id)
        .await?
        .ok_or_else(|| CuraError::NotFound("User not found".to_string()))?;

    Ok(Json(UserInfo::from(&identity)))
}
