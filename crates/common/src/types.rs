use glam::Vec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a world object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-owning handle to a network session managed by the connection layer.
///
/// The world never opens or closes sessions; it only tags players with the
/// handle it was given at join time. Objects rebuilt from a save file carry
/// the detached sentinel until the outer layer re-binds them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Sentinel for objects with no live session.
    pub fn detached() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_detached(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// 2D world position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position(pub Vec2);

impl Position {
    pub const ORIGIN: Position = Position(Vec2::ZERO);

    pub fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }

    pub fn x(&self) -> f32 {
        self.0.x
    }

    pub fn y(&self) -> f32 {
        self.0.y
    }

    pub fn distance(&self, other: Position) -> f32 {
        self.0.distance(other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_uniqueness() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn detached_connection_is_recognized() {
        assert!(ConnectionId::detached().is_detached());
        assert!(!ConnectionId::new().is_detached());
    }

    #[test]
    fn position_distance() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        assert_eq!(a.distance(b), 5.0);
    }
}
