use std::any::Any;

use glade_common::{ObjectId, Position};
use serde::{Deserialize, Serialize};

use crate::error::ObjectError;
use crate::object::WorldObject;
use crate::objs::Flower;
use crate::world::TickContext;

/// Parameters for a spawn area, carried as its JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaParams {
    /// Radius of the patch, in world units.
    pub radius: f32,
    /// Flower count the patch is kept stocked at.
    pub max_flowers: usize,
    /// Variety given to every flower this patch grows.
    pub variety: String,
}

impl Default for AreaParams {
    fn default() -> Self {
        Self {
            radius: 4.0,
            max_flowers: 8,
            variety: "daisy".to_owned(),
        }
    }
}

/// Keeps a patch of the meadow stocked with flowers: whenever fewer than
/// `max_flowers` stand inside the radius, one more grows at a spot drawn
/// from the world's deterministic random stream.
#[derive(Debug)]
pub struct FlowerSpawnArea {
    id: ObjectId,
    pos: Position,
    params: AreaParams,
}

impl FlowerSpawnArea {
    pub const KIND: &'static str = "flower-spawn-area";

    pub fn new(id: ObjectId, pos: Position, params: AreaParams) -> Self {
        Self { id, pos, params }
    }

    pub fn params(&self) -> &AreaParams {
        &self.params
    }
}

impl WorldObject for FlowerSpawnArea {
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
        serde_json::to_string(&self.params).expect("area params always serialize")
    }

    fn deserialize(&mut self, data: &str) -> Result<(), ObjectError> {
        self.params = serde_json::from_str(data).map_err(|err| ObjectError::BadPayload {
            kind: Self::KIND,
            detail: err.to_string(),
        })?;
        Ok(())
    }

    fn update(&mut self, ctx: &mut TickContext<'_>) -> Result<(), ObjectError> {
        let standing = ctx
            .query(self.pos, Flower::KIND, self.params.radius)
            .len();
        if standing >= self.params.max_flowers {
            return Ok(());
        }

        // One flower per tick keeps regrowth gradual.
        let angle = ctx.random_f32() * std::f32::consts::TAU;
        let dist = ctx.random_f32().sqrt() * self.params.radius;
        let spot = Position::new(
            self.pos.x() + angle.cos() * dist,
            self.pos.y() + angle.sin() * dist,
        );
        ctx.spawn(Box::new(Flower::new(
            ObjectId::new(),
            spot,
            self.params.variety.clone(),
        )));
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
