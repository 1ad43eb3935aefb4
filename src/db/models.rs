//! Database models
//!
//! Data structures representing database tables. List-valued columns are
//! stored as JSON text and surface here as `Vec<String>`.

use crate::auth::roles::Role;
use serde::{Deserialize, Serialize};

/// User identity record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// Patient profile, one per patient identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientProfile {
    pub id: String,
    pub user_id: String,
    pub full_name: Option<String>,
    pub conditions: Vec<String>,
    pub location: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub additional_info: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// Researcher profile, one per researcher identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearcherProfile {
    pub id: String,
    pub user_id: String,
    pub full_name: Option<String>,
    pub institution: Option<String>,
    pub specialties: Vec<String>,
    pub research_interests: Vec<String>,
    pub orcid: Option<String>,
    pub researchgate_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub available_for_meetings: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// Clinical trial record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicalTrial {
    pub id: String,
    pub nct_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub status: String, // 'recruiting', 'active', 'completed', 'suspended'
    pub phase: Option<String>,
    pub conditions: Vec<String>,
    pub eligibility: Option<String>,
    pub locations: Vec<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub start_date: Option<String>,
    pub completion_date: Option<String>,
    pub enrollment: Option<i64>,
    pub url: Option<String>,
    pub source: String,
    pub ai_summary: Option<String>,
    pub created_by: Option<String>,
    pub created_at: String,
}

/// Publication record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Publication {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub journal: Option<String>,
    pub publication_date: Option<String>,
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub url: Option<String>,
    pub keywords: Vec<String>,
    pub conditions: Vec<String>,
    pub ai_summary: Option<String>,
    pub created_by: Option<String>,
    pub created_at: String,
}

/// Health expert directory entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthExpert {
    pub id: String,
    pub full_name: String,
    pub specialties: Vec<String>,
    pub institution: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub research_interests: Vec<String>,
    pub orcid: Option<String>,
    pub is_platform_member: bool,
    pub publications_count: i64,
    pub created_at: String,
}

/// Favorite record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    pub id: String,
    pub user_id: String,
    pub favorite_type: String, // 'trial', 'publication', 'expert', 'collaborator'
    pub favorite_id: String,
    pub notes: Option<String>,
    pub created_at: String,
}

/// Discussion forum
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forum {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub created_by: String,
    pub is_active: bool,
    pub created_at: String,
}

/// Post inside a forum
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumPost {
    pub id: String,
    pub forum_id: String,
    pub user_id: String,
    pub author_type: Role,
    pub title: String,
    pub content: String,
    pub created_at: String,
}

/// Reply to a forum post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumReply {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: String,
}

/// Meeting request sent to a health expert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingRequest {
    pub id: String,
    pub requester_id: String,
    pub expert_id: String,
    pub message: Option<String>,
    pub contact_info: serde_json::Value,
    pub status: String, // 'pending', 'accepted', 'rejected'
    pub created_at: String,
    pub updated_at: Option<String>,
}
