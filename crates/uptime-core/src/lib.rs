//! `Uptime` Core Library
//!
//! Shared functionality for `Uptime` components:
//! - Configuration resolution and hierarchy
//! - Append-only log archive with gzip rotation
//! - Tracing initialisation and wall-clock helpers
//! - Common error types

pub mod config;
pub mod error;
pub mod key;
pub mod logs;
pub mod time;
pub mod tracing_init;

pub use config::Config;
pub use error::{Error, Result};
pub use logs::{LogArchive, LogError, RotationReport};
