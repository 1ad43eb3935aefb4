use super::AppState;
use crate::api::extract::{JsonBody, QueryParams};
use crate::api::models::{AddFavoriteRequest, FavoriteQuery, MessageResponse};
use crate::auth::middleware::AuthUser;
use crate::auth::roles::{authorize, Operation};
use crate::core::error::{CuraError, Result};
use crate::db::models::Favorite;
use crate::db::repository::{new_id, now_timestamp};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

/// Handler for POST /api/favorites - Add a favorite
pub async fn add_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(req): JsonBody<AddFavoriteRequest>,
) -> Result<impl IntoResponse> {
    authorize(&user, Operation::ManageFavorites)?;
    req.validate()?;

    let favorite_type = req.favorite_type.as_str();
    if state
        .favorite_repo
        .exists(&user.id, favorite_type, &req.favorite_id)
        .await?
    {
        return Err(CuraError::Conflict("Already favorited".to_string()));
    }

    let favorite = Favorite {
        id: new_id(),
        user_id: user.id.clone(),
        favorite_type: favorite_type.to_string(),
        favorite_id: req.favorite_id,
        notes: req.notes,
        created_at: now_timestamp(),
    };

    state.favorite_repo.add(&favorite).await?;
    tracing::info!(
        user_id = %user.id,
        favorite_type = favorite_type,
        favorite_id = %favorite.favorite_id,
        "Favorite added"
    );

    Ok((StatusCode::CREATED, Json(favorite)))
}

/// Handler for GET /api/favorites - List own favorites
pub async fn list_favorites(
    State(state): State<AppState>,
    user: AuthUser,
    QueryParams(query): QueryParams<FavoriteQuery>,
) -> Result<Json<Vec<Favorite>>> {
    authorize(&user, Operation::ManageFavorites)?;

    let favorites = state
        .favorite_repo
        .get_by_user(&user.id, query.favorite_type.map(|t| t.as_str().to_string()))
        .await?;

    Ok(Json(favorites))
}

/// Handler for DELETE /api/favorites/:id - Remove one of the caller's favorites
pub async fn remove_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    authorize(&user, Operation::ManageFavorites)?;

    // Another user's row looks exactly like a missing one
    if !state.favorite_repo.remove(&id, &user.id).await? {
        return Err(CuraError::NotFound("Favorite not found".to_string()));
    }

    tracing::info!(user_id = %user.id, favorite = %id, "Favorite removed");
    Ok(Json(MessageResponse::new("Favorite removed")))
}
