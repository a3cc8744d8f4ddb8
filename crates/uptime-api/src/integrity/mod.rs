//! Referential integrity between users and their checks.
//!
//! Every check's `userPhone` names an existing user whose `checks` list
//! holds the check's id, and no list grows past the configured cap. The
//! engine sequences the multi-record writes that keep this true and
//! reports, rather than hides, the states it cannot repair.

mod engine;
pub mod fields;
mod two_phase;


pub use engine::{CascadeReport, IntegrityEngine};
pub use two_phase::TwoPhase;
