use super::AppState;
use crate::api::extract::{JsonBody, QueryParams};
use crate::api::models::{
    CreateForumRequest, CreatePostRequest, CreateReplyRequest, PaginationQuery,
};
use crate::auth::middleware::AuthUser;
use crate::auth::roles::{authorize, Operation};
use crate::core::error::{CuraError, Result};
use crate::db::models::{Forum, ForumPost, ForumReply};
use crate::db::repository::{new_id, now_timestamp, Repository};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

/// Handler for GET /api/forums - List active forums
pub async fn list_forums(
    State(state): State<AppState>,
    QueryParams(pagination): QueryParams<PaginationQuery>,
) -> Result<Json<Vec<Forum>>> {
    Ok(Json(state.forum_repo.list(pagination.page()).await?))
}

/// Handler for POST /api/forums - Create a forum (researchers only)
pub async fn create_forum(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(req): JsonBody<CreateForumRequest>,
) -> Result<impl IntoResponse> {
    authorize(&user, Operation::CreateForum)?;
    req.validate()?;

    let forum = Forum {
        id: new_id(),
        name: req.name.trim().to_string(),
        description: req.description,
        category: req.category,
        created_by: user.id.clone(),
        is_active: true,
        created_at: now_timestamp(),
    };

    state.forum_repo.create(&forum).await?;
    tracing::info!(user_id = %user.id, forum_id = %forum.id, "Forum created");

    Ok((StatusCode::CREATED, Json(forum)))
}

/// Handler for GET /api/forums/:id/posts - Posts in a forum
pub async fn list_posts(
    State(state): State<AppState>,
    Path(forum_id): Path<String>,
    QueryParams(pagination): QueryParams<PaginationQuery>,
) -> Result<Json<Vec<ForumPost>>> {
    Ok(Json(
        state
            .forum_repo
            .list_posts(&forum_id, pagination.page())
            .await?,
    ))
}

/// Handler for POST /api/forums/posts - Post into a forum
pub async fn create_post(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(req): JsonBody<CreatePostRequest>,
) -> Result<impl IntoResponse> {
    authorize(&user, Operation::CreateForumPost)?;
    req.validate()?;

    if state.forum_repo.find_by_id(&req.forum_id).await?.is_none() {
        return Err(CuraError::NotFound("Forum not found".to_string()));
    }

    let post = ForumPost {
        id: new_id(),
        forum_id: req.forum_id,
        user_id: user.id.clone(),
        author_type: user.role,
        title: req.title.trim().to_string(),
        content: req.content,
        created_at: now_timestamp(),
    };

    state.forum_repo.create_post(&post).await?;
    tracing::info!(
        user_id = %user.id,
        post_id = %post.id,
        forum_id = %post.forum_id,
        "Forum post created"
    );

    Ok((StatusCode::CREATED, Json(post)))
}

/// Handler for GET /api/forums/posts/:id/replies - Replies to a post
pub async fn list_replies(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    QueryParams(pagination): QueryParams<PaginationQuery>,
) -> Result<Json<Vec<ForumReply>>> {
    Ok(Json(
        state
            .forum_repo
            .list_replies(&post_id, pagination.page())
            .await?,
    ))
}

/// Handler for POST /api/forums/replies - Reply to a post (researchers only)
pub async fn create_reply(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(req): JsonBody<CreateReplyRequest>,
) -> Result<impl IntoResponse> {
    authorize(&user, Operation::ReplyToForumPost)?;
    req.validate()?;

    if state.forum_repo.find_post(&req.post_id).await?.is_none() {
        return Err(CuraError::NotFound("Post not found".to_string()));
    }

    let reply = ForumReply {
        id: new_id(),
        post_id: req.post_id,
        user_id: user.id.clone(),
        content: req.content,
        created_at: now_timestamp(),
    };

    state.forum_repo.create_reply(&reply).await?;
    tracing::info!(
        user_id = %user.id,
        reply_id = %reply.id,
        post_id = %reply.post_id,
        "Forum reply created"
    );

    Ok((StatusCode::CREATED, Json(reply)))
}
