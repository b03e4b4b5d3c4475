use glade_common::{ObjectId, Position};
use glade_kernel::{KindCatalog, World, WorldConfig, WorldError};
use serde::{Deserialize, Serialize};

/// One persisted object: the wire triple plus placement.
///
/// On the wire, movement syncs through the connection layer's event stream,
/// so the network snapshot is the bare `(id, kind, payload)` triple. A save
/// file has no such stream and must restore placement itself, hence the
/// extra `position` field. Payloads round-trip untouched either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub id: ObjectId,
    pub kind: String,
    pub position: Position,
    pub data: String,
}

/// A content-hashed snapshot of the world at a specific tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// The tick at which this snapshot was taken.
    pub tick: u64,
    /// The seed at snapshot time, for deterministic continuation.
    pub seed: u64,
    pub records: Vec<SnapshotRecord>,
    /// FNV-1a over tick, seed, and records; detects corruption on load.
    pub hash: u64,
}

impl WorldSnapshot {
    /// Capture the current world state.
    pub fn capture(world: &World) -> Self {
        let records: Vec<SnapshotRecord> = world
            .all()
            .map(|obj| SnapshotRecord {
                id: obj.id(),
                kind: obj.kind().to_owned(),
                position: obj.position(),
                data: obj.serialize(),
            })
            .collect();
        let tick = world.tick_count();
        let seed = world.seed();
        let hash = content_hash(tick, seed, &records);
        Self {
            tick,
            seed,
            records,
            hash,
        }
    }

    /// Recompute the content hash and compare.
    pub fn verify(&self) -> bool {
        self.hash == content_hash(self.tick, self.seed, &self.records)
    }

    /// Rebuild a world from this snapshot, routing every record through the
    /// catalog by kind. Restored players come back detached; the outer
    /// layer re-binds their sessions.
    pub fn restore(&self, catalog: &KindCatalog, config: WorldConfig) -> Result<World, WorldError> {
        let mut world = World::with_seed(config, self.seed);
        for record in &self.records {
            let obj = catalog.restore(&record.kind, record.id, record.position, &record.data)?;
            world.spawn(obj)?;
        }
        world.set_tick(self.tick);
        // Restore is not a live mutation; drop the spawn events it produced.
        world.drain_events();
        Ok(world)
    }
}

/// FNV-1a over the snapshot's canonical byte representation.
fn content_hash(tick: u64, seed: u64, records: &[SnapshotRecord]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    let mut mix = |bytes: &[u8]| {
        for &b in bytes {
            hash ^= b as u64;
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
    };
    mix(&tick.to_le_bytes());
    mix(&seed.to_le_bytes());
    for record in records {
        mix(record.id.0.as_bytes());
        mix(record.kind.as_bytes());
        mix(&record.position.x().to_le_bytes());
        mix(&record.position.y().to_le_bytes());
        mix(record.data.as_bytes());
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use glade_common::ConnectionId;
    use glade_kernel::objs::DropObject;

    fn demo_world() -> (World, ObjectId) {
        let mut world = World::with_seed(WorldConfig::default(), 42);
        world.join(ConnectionId::new(), "ada").unwrap();
        let drop = world
            .spawn(Box::new(DropObject::new(
                ObjectId::new(),
                Position::new(2.0, 3.0),
                "sword",
            )))
            .unwrap();
        world.tick();
        (world, drop)
    }

    #[test]
    fn capture_and_verify() {
        let (world, _) = demo_world();
        let snap = WorldSnapshot::capture(&world);
        assert!(snap.verify());
        assert_eq!(snap.tick, 1);
        assert_eq!(snap.records.len(), 2);
    }

    #[test]
    fn corruption_is_detected() {
        let (world, _) = demo_world();
        let mut snap = WorldSnapshot::capture(&world);
        snap.records[0].data.push('x');
        assert!(!snap.verify());
    }

    #[test]
    fn restore_roundtrips_objects() {
        let (world, drop) = demo_world();
        let snap = WorldSnapshot::capture(&world);

        let catalog = KindCatalog::builtin();
        let restored = snap.restore(&catalog, WorldConfig::default()).unwrap();

        assert_eq!(restored.tick_count(), world.tick_count());
        assert_eq!(restored.seed(), world.seed());
        assert_eq!(restored.object_count(), world.object_count());

        let obj = restored.get(drop).unwrap();
        assert_eq!(obj.kind(), DropObject::KIND);
        assert_eq!(obj.serialize(), "sword");
        assert_eq!(obj.position(), Position::new(2.0, 3.0));
        assert!(restored.events().is_empty());
    }

    #[test]
    fn restored_players_are_detached() {
        let (world, _) = demo_world();
        let snap = WorldSnapshot::capture(&world);
        let restored = snap
            .restore(&KindCatalog::builtin(), WorldConfig::default())
            .unwrap();

        assert_eq!(restored.player_count(), 1);
        let player = restored
            .all()
            .find_map(|obj| restored.player(obj.id()))
            .unwrap();
        assert!(player.connection().is_detached());
        assert_eq!(player.name(), "ada");
    }

    #[test]
    fn unknown_kind_fails_restore() {
        let (world, _) = demo_world();
        let mut snap = WorldSnapshot::capture(&world);
        snap.records[0].kind = "goblin".to_owned();

        let err = snap
            .restore(&KindCatalog::builtin(), WorldConfig::default())
            .unwrap_err();
        assert!(matches!(err, WorldError::UnknownKind(_)));
    }
}
