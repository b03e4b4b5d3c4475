//! Shared types for the glade world server.
//!
//! # Invariants
//! - Identifiers are unique per creation and totally ordered, so BTreeMap
//!   iteration over them is deterministic across platforms.

pub mod types;

pub use types::{ConnectionId, ObjectId, Position};
