//! Database module
//!
//! This module provides database management functionality including:
//! - Database connection pool management
//! - Repository pattern implementations
//! - Database migrations
//! - Data models and schemas

pub mod manager;
pub mod migrations;
pub mod models;
pub mod repository;

pub use manager::DatabaseManager;
pub use models::{
    ClinicalTrial, Favorite, Forum, ForumPost, ForumReply, HealthExpert, Identity,
    MeetingRequest, PatientProfile, Publication, ResearcherProfile,
};
pub use repository::{
    ExpertRepository, FavoriteRepository, ForumRepository, MeetingRequestRepository, Page,
    ProfileRepository, PublicationRepository, Repository, TrialRepository, UserRepository,
};
