//! Trial, publication and expert directory models

use super::common::empty_string_as_none;
use crate::core::error::{CuraError, Result};
use serde::{Deserialize, Serialize};

/// Clinical trial lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialStatus {
    #[default]
    Recruiting,
    Active,
    Completed,
    Suspended,
}

impl TrialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrialStatus::Recruiting => "recruiting",
            TrialStatus::Active => "active",
            TrialStatus::Completed => "completed",
            TrialStatus::Suspended => "suspended",
        }
    }
}

/// Query parameters for GET /api/trials
#[derive(Debug, Default, Deserialize)]
pub struct TrialQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub keywords: Option<String>,
    pub status: Option<TrialStatus>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub location: Option<String>,
}

/// Request body for POST /api/trials
#[derive(Debug, Deserialize)]
pub struct CreateTrialRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: TrialStatus,
    pub phase: Option<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
    pub eligibility: Option<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub start_date: Option<String>,
    pub completion_date: Option<String>,
    pub enrollment: Option<i64>,
    pub nct_id: Option<String>,
    pub url: Option<String>,
}

impl CreateTrialRequest {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(CuraError::ValidationError("Trial title cannot be empty".to_string()));
        }
        if matches!(self.enrollment, Some(n) if n < 0) {
            return Err(CuraError::ValidationError(
                "Enrollment cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Query parameters for GET /api/publications
#[derive(Debug, Default, Deserialize)]
pub struct PublicationQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub keywords: Option<String>,
}

/// Request body for POST /api/publications
#[derive(Debug, Deserialize)]
pub struct CreatePublicationRequest {
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub journal: Option<String>,
    pub publication_date: Option<String>,
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
}

impl CreatePublicationRequest {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(CuraError::ValidationError(
                "Publication title cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Query parameters for GET /api/experts
#[derive(Debug, Default, Deserialize)]
pub struct ExpertQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub specialty: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub location: Option<String>,
}

/// Query parameters for GET /api/researchers
#[derive(Debug, Default, Deserialize)]
pub struct ResearcherQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub specialty: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trial_status_defaults_to_recruiting() {
        let req: CreateTrialRequest = serde_json::from_str(r#"{"title": "Study"}"#).unwrap();
        assert_eq!(req.status, TrialStatus::Recruiting);
        assert!(req.conditions.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_unknown_trial_status_rejected() {
        let result =
            serde_json::from_str::<CreateTrialRequest>(r#"{"title": "Study", "status": "paused"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_title_rejected() {
        let req: CreateTrialRequest = serde_json::from_str(r#"{"title": "   "}"#).unwrap();
        assert!(matches!(req.validate(), Err(CuraError::ValidationError(_))));
    }

    #[test]
    fn test_publication_abstract_field_name() {
        let req: CreatePublicationRequest =
            serde_json::from_str(r#"{"title": "Paper", "abstract": "Findings"}"#).unwrap();
        assert_eq!(req.abstract_text.as_deref(), Some("Findings"));
    }
}
