use std::collections::BTreeMap;

use glade_common::{ConnectionId, ObjectId, Position};

use crate::error::WorldError;
use crate::object::WorldObject;
use crate::objs::{AreaParams, Butterfly, DropObject, Flower, FlowerSpawnArea};
use crate::player::Player;

/// Constructor for one object kind. Builds a blank instance; the caller
/// places it and thaws its payload.
pub type SpawnFn = fn(ObjectId) -> Box<dyn WorldObject>;

/// Kind-string → constructor table.
///
/// This is the serialization routing guard: payloads are only handed to
/// `deserialize` after the kind has been looked up here, so a payload never
/// reaches an object of another kind.
pub struct KindCatalog {
    constructors: BTreeMap<&'static str, SpawnFn>,
}

impl KindCatalog {
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// A catalog holding the built-in kinds.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.register(Player::KIND, |id| {
            // Restored players are detached until the outer layer re-binds
            // their session.
            Box::new(Player::new(id, ConnectionId::detached(), ""))
        });
        catalog.register(DropObject::KIND, |id| {
            Box::new(DropObject::new(id, Position::ORIGIN, ""))
        });
        catalog.register(Flower::KIND, |id| {
            Box::new(Flower::new(id, Position::ORIGIN, ""))
        });
        catalog.register(Butterfly::KIND, |id| {
            Box::new(Butterfly::new(id, Position::ORIGIN))
        });
        catalog.register(FlowerSpawnArea::KIND, |id| {
            Box::new(FlowerSpawnArea::new(
                id,
                Position::ORIGIN,
                AreaParams::default(),
            ))
        });
        catalog
    }

    /// Register a constructor, replacing any previous one for the kind.
    pub fn register(&mut self, kind: &'static str, spawn: SpawnFn) {
        self.constructors.insert(kind, spawn);
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &'static str> {
        self.constructors.keys().copied()
    }

    /// Build an object of `kind`, place it, and thaw `data` into it.
    pub fn restore(
        &self,
        kind: &str,
        id: ObjectId,
        position: Position,
        data: &str,
    ) -> Result<Box<dyn WorldObject>, WorldError> {
        let spawn = self
            .constructors
            .get(kind)
            .ok_or_else(|| WorldError::UnknownKind(kind.to_owned()))?;
        let mut obj = spawn(id);
        obj.set_position(position);
        obj.deserialize(data)?;
        Ok(obj)
    }
}

impl Default for KindCatalog {
    fn default() -> Self {
        Self::new()
    }
}
