//! Persistence: world snapshots and a file-backed snapshot store.
//!
//! # Invariants
//! - Snapshots are content-hashed and verifiable before restore.
//! - Store segments are chained by sha256 in an integrity manifest.
//! - Restore routes every record through the kind catalog; a payload never
//!   reaches an object of another kind.

pub mod snapshot;
pub mod store;

pub use snapshot::{SnapshotRecord, WorldSnapshot};
pub use store::{PersistError, SnapshotStore};

pub fn crate_info() -> &'static str {
    "glade-persist v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("persist"));
    }
}
