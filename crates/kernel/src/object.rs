use std::any::Any;

use glade_common::{ObjectId, Position};
use serde::{Deserialize, Serialize};

use crate::error::ObjectError;
use crate::world::TickContext;

/// Contract implemented by every simulated entity.
///
/// Variants are flat peers dispatched by [`kind`](WorldObject::kind); there
/// is no inheritance chain. The world owns every object through its registry;
/// objects reach the rest of the world only through the [`TickContext`]
/// passed to `update`.
pub trait WorldObject: Send + std::fmt::Debug {
    fn id(&self) -> ObjectId;

    /// Stable type discriminator, used for spatial filtering and for routing
    /// payloads to the right `deserialize`.
    fn kind(&self) -> &'static str;

    fn position(&self) -> Position;

    fn set_position(&mut self, pos: Position);

    /// Produce the variant's opaque state payload. Exact inverse of
    /// [`deserialize`](WorldObject::deserialize).
    fn serialize(&self) -> String;

    /// Restore internal state from a payload produced by `serialize` of the
    /// same kind. Callers route by `kind` first; a payload of the wrong
    /// shape must fail with [`ObjectError::BadPayload`], never be absorbed
    /// silently.
    fn deserialize(&mut self, data: &str) -> Result<(), ObjectError>;

    /// Advance one tick. The default is a no-op hook; cross-cutting tick
    /// bookkeeping lives in the world driver, so variants only add their own
    /// behavior. Implementations may query the registry, request removals
    /// and spawns through `ctx`, and mutate their own position and state.
    /// They must not reach into other objects' fields.
    fn update(&mut self, ctx: &mut TickContext<'_>) -> Result<(), ObjectError> {
        let _ = ctx;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// One object's outbound wire state: the only externally visible format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub id: ObjectId,
    pub kind: String,
    pub data: String,
}
