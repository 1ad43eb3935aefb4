pub mod directory;
pub mod favorites;
pub mod forums;
pub mod meetings;
pub mod profiles;
pub mod system;

pub use directory::*;
pub use favorites::*;
pub use forums::*;
pub use meetings::*;
pub use profiles::*;
pub use system::*;

use crate::auth::password::CredentialHasher;
use crate::auth::token::TokenService;
use crate::core::config::Config;
use crate::core::error::Result;
use crate::db::manager::DatabaseManager;
use crate::db::repository::{
    ExpertRepository, FavoriteRepository, ForumRepository, MeetingRequestRepository,
    ProfileRepository, PublicationRepository, TrialRepository, UserRepository,
};
use std::sync::Arc;

/// Shared application state for handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tokens: Arc<TokenService>,
    pub hasher: Arc<CredentialHasher>,
    pub user_repo: Arc<UserRepository>,
    pub profile_repo: Arc<ProfileRepository>,
    pub trial_repo: Arc<TrialRepository>,
    pub publication_repo: Arc<PublicationRepository>,
    pub expert_repo: Arc<ExpertRepository>,
    pub favorite_repo: Arc<FavoriteRepository>,
    pub forum_repo: Arc<ForumRepository>,
    pub meeting_repo: Arc<MeetingRequestRepository>,
}

impl AppState {
    /// Wire up services and repositories over a shared database
    pub fn new(config: Arc<Config>, db: Arc<DatabaseManager>) -> Result<Self> {
        let tokens = Arc::new(TokenService::from_config(&config.security)?);
        let hasher = Arc::new(CredentialHasher::new(config.security.bcrypt_cost));

        Ok(Self {
            tokens,
            hasher,
            user_repo: Arc::new(UserRepository::new(db.clone())),
            profile_repo: Arc::new(ProfileRepository::new(db.clone())),
            trial_repo: Arc::new(TrialRepository::new(db.clone())),
            publication_repo: Arc::new(PublicationRepository::new(db.clone())),
            expert_repo: Arc::new(ExpertRepository::new(db.clone())),
            favorite_repo: Arc::new(FavoriteRepository::new(db.clone())),
            forum_repo: Arc::new(ForumRepository::new(db.clone())),
            meeting_repo: Arc::new(MeetingRequestRepository::new(db)),
            config,
        })
    }
}
