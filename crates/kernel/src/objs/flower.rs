use std::any::Any;

use glade_common::{ObjectId, Position};

use crate::error::ObjectError;
use crate::object::WorldObject;
use crate::player::{Player, PlayerFlag};
use crate::world::TickContext;

/// A flower standing in the meadow. Wilts after a configured number of
/// ticks, or is consumed the moment an interacting player reaches it.
#[derive(Debug)]
pub struct Flower {
    id: ObjectId,
    pos: Position,
    variety: String,
    /// Ticks since this flower appeared. Transient; restored flowers start
    /// their lifetime over.
    age: u64,
}

impl Flower {
    pub const KIND: &'static str = "flower";

    pub fn new(id: ObjectId, pos: Position, variety: impl Into<String>) -> Self {
        Self {
            id,
            pos,
            variety: variety.into(),
            age: 0,
        }
    }

    pub fn variety(&self) -> &str {
        &self.variety
    }
}

impl WorldObject for Flower {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn position(&self) -> Position {
        self.pos
    }

    fn set_position(&mut self, pos: Position) {
        self.pos = pos;
    }

    fn serialize(&self) -> String {
        self.variety.clone()
    }

    fn deserialize(&mut self, data: &str) -> Result<(), ObjectError> {
        self.variety = data.to_owned();
        Ok(())
    }

    fn update(&mut self, ctx: &mut TickContext<'_>) -> Result<(), ObjectError> {
        self.age += 1;
        if self.age >= ctx.config().flower_lifetime {
            ctx.leave(self.id);
            return Ok(());
        }

        let picked = ctx
            .query(self.pos, Player::KIND, ctx.config().pickup_radius)
            .first()
            .and_then(|obj| obj.as_any().downcast_ref::<Player>())
            .is_some_and(|player| player.flags().contains(PlayerFlag::Interacting));
        if picked {
            ctx.leave(self.id);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_variety() {
        let flower = Flower::new(ObjectId::new(), Position::ORIGIN, "daisy");
        assert_eq!(flower.serialize(), "daisy");

        let mut restored = Flower::new(ObjectId::new(), Position::ORIGIN, "");
        restored.deserialize("daisy").unwrap();
        assert_eq!(restored.serialize(), "daisy");
    }
}
