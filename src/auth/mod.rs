//! Authentication module
//!
//! This module provides authentication functionality including:
//! - Password hashing and verification
//! - JWT token issuance and verification
//! - Bearer-token identity resolution and its middleware
//! - Role-based access control
//! - Registration and login handlers

pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod password;
pub mod roles;
pub mod token;

pub use identity::{resolve, AuthError, IdentityStore};
pub use middleware::{authenticate, AuthUser};
pub use password::CredentialHasher;
pub use roles::{authorize, require, Operation, Role};
pub use token::{Claims, TokenService, VerificationError};
