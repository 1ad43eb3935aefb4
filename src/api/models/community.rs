//! Favorites, forums and meeting request models

use crate::core::error::{CuraError, Result};
use serde::{Deserialize, Serialize};

/// Kind of item a favorite points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteType {
    Trial,
    Publication,
    Expert,
    Collaborator,
}

impl FavoriteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FavoriteType::Trial => "trial",
            FavoriteType::Publication => "publication",
            FavoriteType::Expert => "expert",
            FavoriteType::Collaborator => "collaborator",
        }
    }
}

/// Meeting request lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Pending => "pending",
            MeetingStatus::Accepted => "accepted",
            MeetingStatus::Rejected => "rejected",
        }
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(CuraError::ValidationError(format!("{} cannot be empty", field)))
    } else {
        Ok(())
    }
}

/// Request body for POST /api/favorites
#[derive(Debug, Deserialize)]
pub struct AddFavoriteRequest {
    pub favorite_type: FavoriteType,
    pub favorite_id: String,
    pub notes: Option<String>,
}

impl AddFavoriteRequest {
    pub fn validate(&self) -> Result<()> {
        require_text("favorite_id", &self.favorite_id)
    }
}

/// Query parameters for GET /api/favorites
#[derive(Debug, Default, Deserialize)]
pub struct FavoriteQuery {
    pub favorite_type: Option<FavoriteType>,
}

/// Request body for POST /api/forums
#[derive(Debug, Deserialize)]
pub struct CreateForumRequest {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
}

impl CreateForumRequest {
    pub fn validate(&self) -> Result<()> {
        require_text("Forum name", &self.name)
    }
}

/// Request body for POST /api/forums/posts
#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub forum_id: String,
    pub title: String,
    pub content: String,
}

impl CreatePostRequest {
    pub fn validate(&self) -> Result<()> {
        require_text("Post title", &self.title)?;
        require_text("Post content", &self.content)
    }
}

/// Request body for POST /api/forums/replies
#[derive(Debug, Deserialize)]
pub struct CreateReplyRequest {
    pub post_id: String,
    pub content: String,
}

impl CreateReplyRequest {
    pub fn validate(&self) -> Result<()> {
        require_text("Reply content", &self.content)
    }
}

/// Request body for POST /api/meeting-requests
#[derive(Debug, Deserialize)]
pub struct CreateMeetingRequest {
    pub expert_id: String,
    pub message: Option<String>,
    #[serde(default)]
    pub contact_info: serde_json::Map<String, serde_json::Value>,
}

impl CreateMeetingRequest {
    pub fn validate(&self) -> Result<()> {
        require_text("expert_id", &self.expert_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_favorite_type_values() {
        let req: AddFavoriteRequest =
            serde_json::from_str(r#"{"favorite_type": "expert", "favorite_id": "e1"}"#).unwrap();
        assert_eq!(req.favorite_type, FavoriteType::Expert);
        assert!(req.validate().is_ok());

        assert!(serde_json::from_str::<AddFavoriteRequest>(
            r#"{"favorite_type": "book", "favorite_id": "b1"}"#
        )
        .is_err());
    }

    #[test]
    fn test_post_requires_content() {
        let req: CreatePostRequest =
            serde_json::from_str(r#"{"forum_id": "f1", "title": "Hi", "content": ""}"#).unwrap();
        assert!(matches!(req.validate(), Err(CuraError::ValidationError(_))));
    }

    #[test]
    fn test_meeting_contact_info_defaults_to_empty_object() {
        let req: CreateMeetingRequest = serde_json::from_str(r#"{"expert_id": "e1"}"#).unwrap();
        assert!(req.contact_info.is_empty());
        assert_eq!(MeetingStatus::default().as_str(), "pending");
    }
}
