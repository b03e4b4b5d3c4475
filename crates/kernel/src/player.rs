use std::any::Any;
use std::collections::BTreeSet;

use glade_common::{ConnectionId, ObjectId, Position};
use serde::{Deserialize, Serialize};

use crate::error::ObjectError;
use crate::object::WorldObject;

/// Named interaction states. Flags are independent, not mutually exclusive;
/// the connection layer sets and clears them in response to client intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlayerFlag {
    /// The player is in a pickup/use action. Cleared externally when the
    /// action ends; nearby objects read it to decide their own fate.
    Interacting,
    /// The player is moving this tick.
    Moving,
}

/// The set of currently active flags, iterated deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFlags(BTreeSet<PlayerFlag>);

impl StateFlags {
    pub fn set(&mut self, flag: PlayerFlag) {
        self.0.insert(flag);
    }

    pub fn clear(&mut self, flag: PlayerFlag) {
        self.0.remove(&flag);
    }

    pub fn contains(&self, flag: PlayerFlag) -> bool {
        self.0.contains(&flag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A connected player's avatar.
///
/// The connection handle is non-owning: the session's lifecycle belongs to
/// the connection layer, which surfaces it here only as join/leave calls.
#[derive(Debug)]
pub struct Player {
    id: ObjectId,
    connection: ConnectionId,
    name: String,
    pos: Position,
    flags: StateFlags,
}

impl Player {
    pub const KIND: &'static str = "player";

    pub fn new(id: ObjectId, connection: ConnectionId, name: impl Into<String>) -> Self {
        Self {
            id,
            connection,
            name: name.into(),
            pos: Position::ORIGIN,
            flags: StateFlags::default(),
        }
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flags(&self) -> &StateFlags {
        &self.flags
    }

    pub fn flags_mut(&mut self) -> &mut StateFlags {
        &mut self.flags
    }
}

impl WorldObject for Player {
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

    // Payload is the player's display name; interaction flags are transient
    // session state and stay out of the wire format.
    fn serialize(&self) -> String {
        self.name.clone()
    }

    fn deserialize(&mut self, data: &str) -> Result<(), ObjectError> {
        self.name = data.to_owned();
        Ok(())
    }

    // `update` stays the default no-op hook: movement and flag changes
    // arrive as intents applied at tick boundaries.

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
    fn flags_are_independent() {
        let mut flags = StateFlags::default();
        flags.set(PlayerFlag::Interacting);
        flags.set(PlayerFlag::Moving);
        assert!(flags.contains(PlayerFlag::Interacting));
        assert!(flags.contains(PlayerFlag::Moving));

        flags.clear(PlayerFlag::Moving);
        assert!(flags.contains(PlayerFlag::Interacting));
        assert!(!flags.contains(PlayerFlag::Moving));
    }

    #[test]
    fn payload_roundtrip() {
        let mut player = Player::new(ObjectId::new(), ConnectionId::new(), "ada");
        assert_eq!(player.serialize(), "ada");

        player.deserialize("grace").unwrap();
        assert_eq!(player.serialize(), "grace");
        assert_eq!(player.name(), "grace");
    }
}
