use std::any::Any;

use glam::Vec2;

use glade_common::{ObjectId, Position};

use crate::error::ObjectError;
use crate::object::WorldObject;
use crate::objs::Flower;
use crate::world::TickContext;

/// A butterfly drifting across the meadow on the world's deterministic
/// random stream, eating the first flower that comes within reach.
#[derive(Debug)]
pub struct Butterfly {
    id: ObjectId,
    pos: Position,
    /// Travel direction in radians.
    heading: f32,
}

impl Butterfly {
    pub const KIND: &'static str = "butterfly";

    pub fn new(id: ObjectId, pos: Position) -> Self {
        Self {
            id,
            pos,
            heading: 0.0,
        }
    }

    pub fn heading(&self) -> f32 {
        self.heading
    }
}

impl WorldObject for Butterfly {
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
        self.heading.to_string()
    }

    fn deserialize(&mut self, data: &str) -> Result<(), ObjectError> {
        self.heading = data.trim().parse().map_err(|err| ObjectError::BadPayload {
            kind: Self::KIND,
            detail: format!("heading {data:?}: {err}"),
        })?;
        Ok(())
    }

    fn update(&mut self, ctx: &mut TickContext<'_>) -> Result<(), ObjectError> {
        // Wander: bounded turn, then drift forward.
        let turn = (ctx.random_f32() - 0.5) * std::f32::consts::FRAC_PI_2;
        self.heading += turn;
        self.pos = Position(self.pos.0 + Vec2::from_angle(self.heading) * ctx.config().butterfly_speed);

        let meal = ctx
            .query(self.pos, Flower::KIND, ctx.config().feed_radius)
            .first()
            .map(|flower| flower.id());
        if let Some(flower) = meal {
            ctx.leave(flower);
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
    fn heading_roundtrips() {
        let mut butterfly = Butterfly::new(ObjectId::new(), Position::ORIGIN);
        butterfly.heading = 1.25;

        let mut restored = Butterfly::new(ObjectId::new(), Position::ORIGIN);
        restored.deserialize(&butterfly.serialize()).unwrap();
        assert_eq!(restored.heading(), 1.25);
    }

    #[test]
    fn garbage_payload_fails_loudly() {
        let mut butterfly = Butterfly::new(ObjectId::new(), Position::ORIGIN);
        let err = butterfly.deserialize("not-a-heading").unwrap_err();
        assert!(matches!(err, ObjectError::BadPayload { kind, .. } if kind == Butterfly::KIND));
    }
}
