//! Uptime Record Store Library
//!
//! Core functionality for the Uptime service:
//! - File-per-record JSON storage for users, tokens, and checks
//! - Keyed password hashing and bearer token lifecycle
//! - Referential integrity between users and their checks
//! - Request dispatch table mapping routes and verbs to handlers

pub mod auth;
pub mod error;
pub mod integrity;
pub mod server;
pub mod storage;

pub use error::{ApiError, Result};
