//! Authentication module for Uptime.
//!
//! Provides keyed password hashing, random record ids, and the token
//! authority that gates every protected operation.

pub mod ids;
pub mod password;
pub mod token;

pub use password::PasswordHasher;
pub use token::TokenAuthority;

use crate::storage::StoreError;

/// Errors from token and credential operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token not found")]
    TokenNotFound,

    #[error("Token has already expired and cannot be extended")]
    AlreadyExpired,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
