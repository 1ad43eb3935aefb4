//! Patient and researcher profile models

use crate::core::error::{CuraError, Result};
use serde::Deserialize;

fn default_true() -> bool {
    true
}

/// Request body for POST /api/patients/profile
#[derive(Debug, Deserialize)]
pub struct PatientProfileRequest {
    pub full_name: Option<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
    pub location: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub additional_info: Option<String>,
}

impl PatientProfileRequest {
    pub fn validate(&self) -> Result<()> {
        if let Some(age) = self.age {
            if !(0..=150).contains(&age) {
                return Err(CuraError::ValidationError(format!("Invalid age: {}", age)));
            }
        }
        Ok(())
    }
}

/// Request body for POST /api/researchers/profile
#[derive(Debug, Deserialize)]
pub struct ResearcherProfileRequest {
    pub full_name: Option<String>,
    pub institution: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub research_interests: Vec<String>,
    pub orcid: Option<String>,
    pub researchgate_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    #[serde(default = "default_true")]
    pub available_for_meetings: bool,
}
