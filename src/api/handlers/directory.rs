use super::AppState;
use crate::api::extract::{JsonBody, QueryParams};
use crate::api::models::{
    CreatePublicationRequest, CreateTrialRequest, ExpertQuery, PaginationQuery, PublicationQuery,
    TrialQuery,
};
use crate::auth::middleware::AuthUser;
use crate::auth::roles::{authorize, Operation};
use crate::core::error::{CuraError, Result};
use crate::db::models::{ClinicalTrial, HealthExpert, Publication};
use crate::db::repository::{new_id, now_timestamp, Repository, TrialFilter};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

/// Source tag for trials entered through the API
const PLATFORM_SOURCE: &str = "platform";

/// Handler for GET /api/trials - Search clinical trials
pub async fn list_trials(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<TrialQuery>,
    QueryParams(pagination): QueryParams<PaginationQuery>,
) -> Result<Json<Vec<ClinicalTrial>>> {
    let filter = TrialFilter {
        keywords: query.keywords,
        status: query.status.map(|s| s.as_str().to_string()),
        location: query.location,
    };

    let trials = state.trial_repo.search(filter, pagination.page()).await?;
    Ok(Json(trials))
}

/// Handler for POST /api/trials - Create a clinical trial (researchers only)
pub async fn create_trial(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(req): JsonBody<CreateTrialRequest>,
) -> Result<impl IntoResponse> {
    authorize(&user, Operation::CreateTrial)?;
    req.validate()?;

    let trial = ClinicalTrial {
        id: new_id(),
        nct_id: req.nct_id,
        title: req.title.trim().to_string(),
        description: req.description,
        status: req.status.as_str().to_string(),
        phase: req.phase,
        conditions: req.conditions,
        eligibility: req.eligibility,
        locations: req.locations,
        contact_email: req.contact_email,
        contact_phone: req.contact_phone,
        start_date: req.start_date,
        completion_date: req.completion_date,
        enrollment: req.enrollment,
        url: req.url,
        source: PLATFORM_SOURCE.to_string(),
        ai_summary: None,
        created_by: Some(user.id.clone()),
        created_at: now_timestamp(),
    };

    state.trial_repo.create(&trial).await?;
    tracing::info!(user_id = %user.id, trial_id = %trial.id, "Clinical trial created");

    Ok((StatusCode::CREATED, Json(trial)))
}

/// Handler for GET /api/trials/:id - Get a clinical trial
pub async fn get_trial(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ClinicalTrial>> {
    let trial = state
        .trial_repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| CuraError::NotFound(format!("Trial {} not found", id)))?;

    Ok(Json(trial))
}

/// Handler for GET /api/publications - Search publications
pub async fn list_publications(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<PublicationQuery>,
    QueryParams(pagination): QueryParams<PaginationQuery>,
) -> Result<Json<Vec<Publication>>> {
    let publications = state
        .publication_repo
        .search(query.keywords, pagination.page())
        .await?;

    Ok(Json(publications))
}

/// Handler for POST /api/publications - Create a publication (researchers only)
pub async fn create_publication(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(req): JsonBody<CreatePublicationRequest>,
) -> Result<impl IntoResponse> {
    authorize(&user, Operation::CreatePublication)?;
    req.validate()?;

    let publication = Publication {
        id: new_id(),
        title: req.title.trim().to_string(),
        authors: req.authors,
        abstract_text: req.abstract_text,
        journal: req.journal,
        publication_date: req.publication_date,
        doi: req.doi,
        pmid: req.pmid,
        url: req.url,
        keywords: req.keywords,
        conditions: req.conditions,
        ai_summary: None,
        created_by: Some(user.id.clone()),
        created_at: now_timestamp(),
    };

    state.publication_repo.create(&publication).await?;
    tracing::info!(
        user_id = %user.id,
        publication_id = %publication.id,
        "Publication created"
    );

    Ok((StatusCode::CREATED, Json(publication)))
}

/// Handler for GET /api/publications/:id - Get a publication
pub async fn get_publication(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Publication>> {
    let publication = state
        .publication_repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| CuraError::NotFound(format!("Publication {} not found", id)))?;

    Ok(Json(publication))
}

/// Handler for GET /api/experts - Search the health expert directory
pub async fn list_experts(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ExpertQuery>,
    QueryParams(pagination): QueryParams<PaginationQuery>,
) -> Result<Json<Vec<HealthExpert>>> {
    let experts = state
        .expert_repo
        .search(query.specialty, query.location, pagination.page())
        .await?;

    Ok(Json(experts))
}
