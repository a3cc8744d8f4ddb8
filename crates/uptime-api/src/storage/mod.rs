//! File-backed entity storage for the Uptime record store.
//!
//! One JSON document per record at `<root>/<collection>/<id>.json`. The
//! store knows nothing about relationships between collections.

mod models;
mod queries;
mod store;


pub use models::*;
pub use store::{EntityStore, StoreError};
