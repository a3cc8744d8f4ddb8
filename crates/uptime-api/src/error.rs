//! Error taxonomy for Uptime operations.
//!
//! Validation and authorization errors are raised before any write.
//! Integrity and partial-failure errors are raised after whatever writes
//! already committed; nothing is rolled back.

use crate::auth::AuthError;
use crate::storage::StoreError;

/// Result type alias using [`ApiError`].
pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or missing input; caller-fixable.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Token missing, invalid, expired, or not owned by the subject.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token has already expired and cannot be extended")]
    AlreadyExpired,

    #[error("Check quota exceeded: the user already has the maximum of {max} checks")]
    QuotaExceeded { max: usize },

    /// Cross-record invariant found broken (e.g. a check missing from its
    /// owner's list).
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    /// A two-step write committed its first step only.
    #[error("Partial failure on check {check_id}: {reason}")]
    PartialFailure { check_id: String, reason: String },

    /// A cascading delete removed only some dependents.
    #[error("Cascade incomplete: deleted {deleted} of {total} checks")]
    PartialCascadeFailure {
        deleted: usize,
        total: usize,
        failed: Vec<String>,
    },

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Underlying storage failure; the operation may or may not have taken
    /// effect.
    #[error("I/O error: {0}")]
    Io(String),
}

impl ApiError {
    /// HTTP-style status code for the transport collaborator.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_)
            | Self::InvalidCredentials
            | Self::AlreadyExpired
            | Self::QuotaExceeded { .. } => 400,
            Self::Unauthorized(_) => 403,
            Self::NotFound(_) => 404,
            Self::MethodNotAllowed(_) => 405,
            Self::AlreadyExists(_) => 409,
            Self::IntegrityViolation(_)
            | Self::PartialFailure { .. }
            | Self::PartialCascadeFailure { .. }
            | Self::Io(_) => 500,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { collection, id } => Self::NotFound(format!("{collection}/{id}")),
            StoreError::AlreadyExists { collection, id } => {
                Self::AlreadyExists(format!("{collection}/{id}"))
            }
            StoreError::InvalidKey { collection, id } => {
                Self::Validation(format!("invalid key {collection}/{id}"))
            }
            other @ (StoreError::Open { .. }
            | StoreError::Serialization { .. }
            | StoreError::Io { .. }) => Self::Io(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::TokenNotFound => Self::NotFound("token".into()),
            AuthError::AlreadyExpired => Self::AlreadyExpired,
            AuthError::Unauthorized(msg) => Self::Unauthorized(msg),
            AuthError::Hashing(msg) => Self::Io(format!("password hashing failed: {msg}")),
            AuthError::Store(e) => e.into(),
        }
    }
}
