//! Append-only log streams and their compressed archives.
//!
//! Active streams live at `<dir>/<id>.log`; archived streams at
//! `<dir>/<id>.gz.b64` (base64 text wrapping gzip bytes). Rotation moves
//! the content of every active stream into a fresh archive id and truncates
//! the source so it stays writable.

mod archive;
mod rotation;


pub use archive::{ACTIVE_SUFFIX, ARCHIVED_SUFFIX, LogArchive};
pub use rotation::{RotatedLog, RotationFailure, RotationReport};

/// Errors from log archive operations.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("Invalid log id: {0:?}")]
    InvalidId(String),

    #[error("Log not found: {0}")]
    NotFound(String),

    #[error("Log already exists: {0}")]
    AlreadyExists(String),

    #[error("Log is empty: {0}")]
    Empty(String),

    #[error("Log {id} is not valid UTF-8: {reason}")]
    NotUtf8 { id: String, reason: String },

    #[error("Corrupt archive {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
