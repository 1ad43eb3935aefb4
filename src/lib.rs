//! CuraLink Backend Library
//!
//! This library provides the core functionality for the CuraLink backend,
//! including authentication, database management, and REST API services.

pub mod api;
pub mod auth;
pub mod core;
pub mod db;

// Re-export commonly used types
pub use api::ApiServer;
pub use crate::core::{Config, CuraError};
pub use db::DatabaseManager;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
