use serde::{Deserialize, Serialize};

/// World tuning: spatial index granularity, capacity policy, interaction
/// distances, lifetimes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Edge length of a spatial index cell, in world units.
    pub cell_size: f32,
    /// Maximum simultaneously connected players; `None` disables the cap.
    pub max_players: Option<usize>,
    /// Distance within which an interacting player consumes a drop or a
    /// flower.
    pub pickup_radius: f32,
    /// Ticks a flower stands before it wilts away.
    pub flower_lifetime: u64,
    /// Distance a butterfly covers per tick.
    pub butterfly_speed: f32,
    /// Distance within which a butterfly eats a flower.
    pub feed_radius: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            cell_size: 8.0,
            max_players: None,
            pickup_radius: 0.5,
            flower_lifetime: 600,
            butterfly_speed: 0.1,
            feed_radius: 0.25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = WorldConfig::default();
        assert_eq!(config.pickup_radius, 0.5);
        assert!(config.max_players.is_none());
    }

    #[test]
    fn config_roundtrips_through_json() {
        let config = WorldConfig {
            max_players: Some(64),
            ..WorldConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: WorldConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_players, Some(64));
        assert_eq!(back.cell_size, config.cell_size);
    }
}
