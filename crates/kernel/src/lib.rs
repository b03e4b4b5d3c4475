//! World kernel: spatial object registry, tick-driven object lifecycle,
//! wire snapshots.
//!
//! # Invariants
//! - Every live object is registered in exactly one registry; removal is the
//!   only destruction path, and a removed object is never updated again.
//! - A tick sees a consistent membership snapshot for its whole duration;
//!   connection-layer mutations land only at tick boundaries.
//! - Iteration and query order are deterministic (id-ordered maps).

pub mod catalog;
pub mod config;
pub mod error;
pub mod intent;
pub mod object;
pub mod objs;
pub mod player;
pub mod registry;
pub mod world;

pub use catalog::KindCatalog;
pub use config::WorldConfig;
pub use error::{ObjectError, WorldError};
pub use intent::{IntentQueue, WorldIntent};
pub use object::{ObjectRecord, WorldObject};
pub use player::{Player, PlayerFlag, StateFlags};
pub use registry::{CellCoord, SpatialRegistry};
pub use world::{TickContext, World, WorldEvent};
