//! Concrete object kinds beyond the player: items dropped on the ground,
//! meadow flora, and the critters that feed on it.

mod butterfly;
mod drop;
mod flower;
mod spawn_area;

pub use butterfly::Butterfly;
pub use drop::DropObject;
pub use flower::Flower;
pub use spawn_area::{AreaParams, FlowerSpawnArea};
