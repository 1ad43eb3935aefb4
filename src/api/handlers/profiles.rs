use super::AppState;
use crate::api::extract::{JsonBody, QueryParams};
use crate::api::models::{
    PaginationQuery, PatientProfileRequest, ResearcherProfileRequest, ResearcherQuery,
};
use crate::auth::middleware::AuthUser;
use crate::auth::roles::{authorize, Operation};
use crate::core::error::{CuraError, Result};
use crate::db::models::{PatientProfile, ResearcherProfile};
use crate::db::repository::{new_id, now_timestamp};
use axum::{
    extract::State,
    Json,
};

/// Handler for POST /api/patients/profile - Create or replace own patient profile
pub async fn upsert_patient_profile(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(req): JsonBody<PatientProfileRequest>,
) -> Result<Json<PatientProfile>> {
    authorize(&user, Operation::UpsertPatientProfile)?;
    req.validate()?;

    let profile = PatientProfile {
        id: new_id(),
        user_id: user.id.clone(),
        full_name: req.full_name,
        conditions: req.conditions,
        location: req.location,
        age: req.age,
        gender: req.gender,
        additional_info: req.additional_info,
        created_at: now_timestamp(),
        updated_at: None,
    };

    let stored = state.profile_repo.upsert_patient(&profile).await?;
    tracing::info!(user_id = %user.id, profile_id = %stored.id, "Patient profile saved");

    Ok(Json(stored))
}

/// Handler for GET /api/patients/profile - Own patient profile
pub async fn get_patient_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<PatientProfile>> {
    let profile = state
        .profile_repo
        .find_patient(&user.id)
        .await?
        .ok_or_else(|| CuraError::NotFound("Patient profile not found".to_string()))?;

    Ok(Json(profile))
}

/// Handler for POST /api/researchers/profile - Create or replace own researcher profile
pub async fn upsert_researcher_profile(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(req): JsonBody<ResearcherProfileRequest>,
) -> Result<Json<ResearcherProfile>> {
    authorize(&user, Operation::UpsertResearcherProfile)?;

    let profile = ResearcherProfile {
        id: new_id(),
        user_id: user.id.clone(),
        full_name: req.full_name,
        institution: req.institution,
        specialties: req.specialties,
        research_interests: req.research_interests,
        orcid: req.orcid,
        researchgate_url: req.researchgate_url,
        bio: req.bio,
        location: req.location,
        available_for_meetings: req.available_for_meetings,
        created_at: now_timestamp(),
        updated_at: None,
    };

    let stored = state.profile_repo.upsert_researcher(&profile).await?;
    tracing::info!(user_id = %user.id, profile_id = %stored.id, "Researcher profile saved");

    Ok(Json(stored))
}

/// Handler for GET /api/researchers/profile - Own researcher profile
pub async fn get_researcher_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ResearcherProfile>> {
    let profile = state
        .profile_repo
        .find_researcher(&user.id)
        .await?
        .ok_or_else(|| CuraError::NotFound("Researcher profile not found".to_string()))?;

    Ok(Json(profile))
}

/// Handler for GET /api/researchers - Public researcher directory
pub async fn list_researchers(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ResearcherQuery>,
    QueryParams(pagination): QueryParams<PaginationQuery>,
) -> Result<Json<Vec<ResearcherProfile>>> {
    let researchers = state
        .profile_repo
        .search_researchers(query.specialty, pagination.page())
        .await?;

    Ok(Json(researchers))
}
