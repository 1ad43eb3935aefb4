//! Role-based access control
//!
//! Which roles may perform which operation lives in [`PERMISSIONS`]; the
//! gate functions only compare an identity's role against that data.

use crate::core::error::{CuraError, Result};
use crate::db::models::Identity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse permission class attached to an identity at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Researcher,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Researcher => "researcher",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CuraError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "patient" => Ok(Role::Patient),
            "researcher" => Ok(Role::Researcher),
            other => Err(CuraError::ValidationError(format!("Unknown role: {}", other))),
        }
    }
}

/// Role-gated operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    UpsertPatientProfile,
    UpsertResearcherProfile,
    CreateTrial,
    CreatePublication,
    CreateForum,
    CreateForumPost,
    ReplyToForumPost,
    RequestMeeting,
    ManageFavorites,
}

impl Operation {
    /// Human description used in permission-denied messages
    pub fn describe(&self) -> &'static str {
        match self {
            Operation::UpsertPatientProfile => "manage a patient profile",
            Operation::UpsertResearcherProfile => "manage a researcher profile",
            Operation::CreateTrial => "create clinical trials",
            Operation::CreatePublication => "create publications",
            Operation::CreateForum => "create forums",
            Operation::CreateForumPost => "create forum posts",
            Operation::ReplyToForumPost => "reply to forum posts",
            Operation::RequestMeeting => "request meetings",
            Operation::ManageFavorites => "manage favorites",
        }
    }
}

const ANY_ROLE: &[Role] = &[Role::Patient, Role::Researcher];

/// Operation -> roles allowed to perform it
pub const PERMISSIONS: &[(Operation, &[Role])] = &[
    (Operation::UpsertPatientProfile, &[Role::Patient]),
    (Operation::UpsertResearcherProfile, &[Role::Researcher]),
    (Operation::CreateTrial, &[Role::Researcher]),
    (Operation::CreatePublication, &[Role::Researcher]),
    (Operation::CreateForum, &[Role::Researcher]),
    (Operation::CreateForumPost, ANY_ROLE),
    (Operation::ReplyToForumPost, &[Role::Researcher]),
    (Operation::RequestMeeting, ANY_ROLE),
    (Operation::ManageFavorites, ANY_ROLE),
];

/// Roles allowed to perform `operation`; empty if the operation is unlisted
pub fn allowed_roles(operation: Operation) -> &'static [Role] {
    PERMISSIONS
        .iter()
        .find(|(op, _)| *op == operation)
        .map(|(_, roles)| *roles)
        .unwrap_or(&[])
}

/// Require the identity to hold exactly `expected` role
pub fn require(identity: &Identity, expected: Role) -> Result<()> {
    if identity.role == expected {
        Ok(())
    } else {
        Err(CuraError::PermissionDenied(format!(
            "Only {}s may perform this action",
            expected
        )))
    }
}

/// Require the identity's role to be permitted for `operation`
pub fn authorize(identity: &Identity, operation: Operation) -> Result<()> {
    let roles = allowed_roles(operation);
    if roles.contains(&identity.role) {
        return Ok(());
    }

    tracing::warn!(
        user_id = %identity.id,
        role = %identity.role,
        operation = ?operation,
        "Operation forbidden for role"
    );

    let allowed = roles
        .iter()
        .map(|r| format!("{}s", r))
        .collect::<Vec<_>>()
        .join(" or ");
    let who = if allowed.is_empty() { "nobody".to_string() } else { allowed };
    Err(CuraError::PermissionDenied(format!(
        "Only {} can {}",
        who,
        operation.describe()
    )))
}
