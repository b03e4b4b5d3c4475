use std::collections::BTreeSet;

use glade_common::{ConnectionId, ObjectId, Position};
use serde::{Deserialize, Serialize};

use crate::config::WorldConfig;
use crate::error::WorldError;
use crate::intent::{IntentQueue, WorldIntent};
use crate::object::{ObjectRecord, WorldObject};
use crate::objs::DropObject;
use crate::player::Player;
use crate::registry::SpatialRegistry;

/// An event record produced by every membership mutation and every tick.
///
/// The event log backs persistence and the membership-replay tests: folding
/// a log's joins and leaves must reproduce the live id set exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorldEvent {
    /// A player entered the world.
    Joined {
        id: ObjectId,
        connection: ConnectionId,
    },
    /// An object left the world; removal is the only destruction path.
    Left { id: ObjectId },
    /// A non-player object was spawned.
    Spawned { id: ObjectId, kind: String },
    /// The simulation advanced one tick.
    Stepped { tick: u64, seed: u64 },
}

/// Deferred effects requested by an object during its `update`.
enum TickAction {
    Leave(ObjectId),
    Spawn(Box<dyn WorldObject>),
}

/// What an object sees and may request while its `update` runs.
///
/// Borrows the registry read-only — minus the object being updated, which
/// the driver holds out for the duration, so an object never observes
/// itself in its own queries — and collects removal and spawn requests for
/// the driver to apply.
pub struct TickContext<'a> {
    registry: &'a SpatialRegistry,
    config: &'a WorldConfig,
    actions: &'a mut Vec<TickAction>,
    tick: u64,
    rng: &'a mut u64,
}

impl TickContext<'_> {
    /// The tick currently being simulated.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn config(&self) -> &WorldConfig {
        self.config
    }

    /// All live objects of `kind` within `radius` of `position`, id-ordered.
    pub fn query(&self, position: Position, kind: &str, radius: f32) -> Vec<&dyn WorldObject> {
        self.registry.query(position, kind, radius)
    }

    /// Request a removal. Applied as soon as the current `update` returns;
    /// a removed object is never updated again.
    pub fn leave(&mut self, id: ObjectId) {
        self.actions.push(TickAction::Leave(id));
    }

    /// Request a spawn. The object enters the registry at the end of the
    /// tick and first updates on the next one.
    pub fn spawn(&mut self, obj: Box<dyn WorldObject>) {
        self.actions.push(TickAction::Spawn(obj));
    }

    /// Next value of this tick's deterministic random stream.
    pub fn random(&mut self) -> u64 {
        *self.rng = splitmix64(*self.rng);
        *self.rng
    }

    /// Uniform in [0, 1).
    pub fn random_f32(&mut self) -> f32 {
        (self.random() >> 40) as f32 / (1u64 << 24) as f32
    }
}

/// The authoritative world state and tick driver.
///
/// Sole owner of the registry and of every object's existence. All
/// mutations go through explicit operations; connection contexts reach the
/// world only through the [`IntentQueue`], drained at tick boundaries.
///
/// `tick` is cooperative and must not be invoked concurrently with itself;
/// one logical loop drives each world.
pub struct World {
    config: WorldConfig,
    registry: SpatialRegistry,
    intents: IntentQueue,
    tick: u64,
    /// Seed for deterministic randomness. Advanced once per tick.
    seed: u64,
    /// Append-only log of membership mutations and ticks.
    event_log: Vec<WorldEvent>,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("config", &self.config)
            .field("object_count", &self.registry.len())
            .field("tick", &self.tick)
            .field("seed", &self.seed)
            .field("event_count", &self.event_log.len())
            .finish()
    }
}

impl World {
    /// Create an empty world at tick 0 with seed 0.
    pub fn new(config: WorldConfig) -> Self {
        Self::with_seed(config, 0)
    }

    /// Create a world with a specific seed for deterministic runs.
    pub fn with_seed(config: WorldConfig, seed: u64) -> Self {
        let cell_size = config.cell_size;
        Self {
            config,
            registry: SpatialRegistry::new(cell_size),
            intents: IntentQueue::new(),
            tick: 0,
            seed,
            event_log: Vec::new(),
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Completed tick count.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Current RNG seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Set the tick directly (used for snapshot restore).
    pub fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    /// A cloneable handle connection contexts push intents through.
    pub fn intents(&self) -> IntentQueue {
        self.intents.clone()
    }

    pub fn object_count(&self) -> usize {
        self.registry.len()
    }

    pub fn player_count(&self) -> usize {
        self.registry
            .all()
            .filter(|obj| obj.kind() == Player::KIND)
            .count()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.registry.contains(id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&dyn WorldObject> {
        self.registry.get(id)
    }

    pub fn player(&self, id: ObjectId) -> Option<&Player> {
        self.registry
            .get(id)
            .and_then(|obj| obj.as_any().downcast_ref())
    }

    /// Mutable player access for the connection layer, between ticks.
    pub fn player_mut(&mut self, id: ObjectId) -> Option<&mut Player> {
        self.registry
            .get_mut(id)
            .and_then(|obj| obj.as_any_mut().downcast_mut())
    }

    /// Full id-ordered enumeration.
    pub fn all(&self) -> impl Iterator<Item = &dyn WorldObject> {
        self.registry.all()
    }

    /// Radius query over live objects; safe to call between ticks.
    pub fn query(&self, position: Position, kind: &str, radius: f32) -> Vec<&dyn WorldObject> {
        self.registry.query(position, kind, radius)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    /// Drain and return the event log (persistence flush).
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Construct a player for the given connection and insert it.
    /// Fails with [`WorldError::RegistryFull`] once a configured player
    /// capacity is reached.
    pub fn join(
        &mut self,
        connection: ConnectionId,
        name: impl Into<String>,
    ) -> Result<ObjectId, WorldError> {
        if let Some(capacity) = self.config.max_players {
            if self.player_count() >= capacity {
                return Err(WorldError::RegistryFull { capacity });
            }
        }
        self.join_with_id(ObjectId::new(), connection, name.into())
    }

    fn join_with_id(
        &mut self,
        id: ObjectId,
        connection: ConnectionId,
        name: String,
    ) -> Result<ObjectId, WorldError> {
        self.registry
            .insert(Box::new(Player::new(id, connection, name)))?;
        self.event_log.push(WorldEvent::Joined { id, connection });
        tracing::debug!(?id, ?connection, "player joined");
        Ok(id)
    }

    /// Insert a constructed object (drops, flora, persistence restore).
    pub fn spawn(&mut self, obj: Box<dyn WorldObject>) -> Result<ObjectId, WorldError> {
        let id = obj.id();
        let kind = obj.kind();
        self.registry.insert(obj)?;
        self.event_log.push(WorldEvent::Spawned {
            id,
            kind: kind.to_owned(),
        });
        tracing::debug!(?id, kind, "object spawned");
        Ok(id)
    }

    /// Remove an object. Idempotent: leaving an already-removed object is a
    /// no-op, which the self-removal race depends on.
    pub fn leave(&mut self, id: ObjectId) {
        if self.registry.remove(id).is_some() {
            self.event_log.push(WorldEvent::Left { id });
            tracing::debug!(?id, "object left");
        }
    }

    /// Advance the simulation by one tick.
    ///
    /// Drains queued intents first, so joins and leaves that arrived since
    /// the last tick land before any object updates; joins arriving while
    /// this tick runs wait for the next one. Then visits every live object
    /// once, in an id-ordered pass fixed at tick start: each object is held
    /// out of the registry while its own `update` runs, requested removals
    /// apply as soon as that update returns, and requested spawns enter at
    /// the end of the tick. A failing update is logged and isolated so the
    /// remaining objects still advance.
    pub fn tick(&mut self) {
        let _span = tracing::info_span!("tick", tick = self.tick).entered();
        self.apply_intents();

        let order = self.registry.ids();
        let mut actions: Vec<TickAction> = Vec::new();
        let mut pending: Vec<Box<dyn WorldObject>> = Vec::new();
        let mut rng = self.seed;
        let mut removed = 0usize;

        for id in order {
            // Already removed earlier this tick (self-removal or eaten).
            let Some(mut obj) = self.registry.remove(id) else {
                continue;
            };

            let mut ctx = TickContext {
                registry: &self.registry,
                config: &self.config,
                actions: &mut actions,
                tick: self.tick,
                rng: &mut rng,
            };
            if let Err(err) = obj.update(&mut ctx) {
                tracing::warn!(?id, kind = obj.kind(), %err, "object update failed");
            }

            let mut keep = true;
            for action in actions.drain(..) {
                match action {
                    TickAction::Leave(target) if target == id => {
                        if keep {
                            keep = false;
                            removed += 1;
                            self.event_log.push(WorldEvent::Left { id });
                            tracing::debug!(?id, "object left");
                        }
                    }
                    TickAction::Leave(target) => {
                        if self.registry.remove(target).is_some() {
                            removed += 1;
                            self.event_log.push(WorldEvent::Left { id: target });
                            tracing::debug!(id = ?target, "object left");
                        }
                    }
                    TickAction::Spawn(new_obj) => pending.push(new_obj),
                }
            }

            if keep {
                if let Err(err) = self.registry.insert(obj) {
                    // The id was just removed from the registry, so this
                    // only fires if an update spawned a colliding id.
                    tracing::error!(?id, %err, "reinsert after update failed");
                }
            }
        }

        let spawned = pending.len();
        for obj in pending {
            if let Err(err) = self.spawn(obj) {
                tracing::error!(%err, "deferred spawn failed");
            }
        }

        self.tick += 1;
        self.seed = splitmix64(self.seed);
        self.event_log.push(WorldEvent::Stepped {
            tick: self.tick,
            seed: self.seed,
        });
        tracing::trace!(
            removed,
            spawned,
            objects = self.registry.len(),
            "tick complete"
        );
    }

    /// Produce the outbound wire state: one `(id, kind, payload)` triple per
    /// live object.
    pub fn snapshot(&self) -> Vec<ObjectRecord> {
        self.registry
            .all()
            .map(|obj| ObjectRecord {
                id: obj.id(),
                kind: obj.kind().to_owned(),
                data: obj.serialize(),
            })
            .collect()
    }

    /// Fold a log's membership events into the id set they produce: every
    /// joined-or-spawned id not yet left.
    pub fn replay_membership(events: &[WorldEvent]) -> BTreeSet<ObjectId> {
        let mut members = BTreeSet::new();
        for event in events {
            match event {
                WorldEvent::Joined { id, .. } | WorldEvent::Spawned { id, .. } => {
                    members.insert(*id);
                }
                WorldEvent::Left { id } => {
                    members.remove(id);
                }
                WorldEvent::Stepped { .. } => {}
            }
        }
        members
    }

    fn apply_intents(&mut self) {
        for intent in self.intents.drain() {
            match intent {
                WorldIntent::Join {
                    id,
                    connection,
                    name,
                } => {
                    if let Some(capacity) = self.config.max_players {
                        if self.player_count() >= capacity {
                            tracing::warn!(?id, capacity, "join refused, world full");
                            continue;
                        }
                    }
                    if let Err(err) = self.join_with_id(id, connection, name) {
                        tracing::error!(?id, %err, "queued join failed");
                    }
                }
                WorldIntent::Leave { id } => self.leave(id),
                WorldIntent::SetFlag { id, flag, active } => match self.player_mut(id) {
                    Some(player) if active => player.flags_mut().set(flag),
                    Some(player) => player.flags_mut().clear(flag),
                    None => tracing::debug!(?id, "flag intent for unknown player"),
                },
                WorldIntent::MoveTo { id, to } => {
                    if !self.registry.set_position(id, to) {
                        tracing::debug!(?id, "move intent for unknown object");
                    }
                }
                WorldIntent::DropItem { player, item_type } => {
                    let Some(pos) = self.registry.get(player).map(|p| p.position()) else {
                        tracing::debug!(id = ?player, "drop intent for unknown player");
                        continue;
                    };
                    let drop = Box::new(DropObject::new(ObjectId::new(), pos, item_type));
                    if let Err(err) = self.spawn(drop) {
                        tracing::error!(%err, "drop spawn failed");
                    }
                }
            }
        }
    }
}

/// Splitmix64: fast, high-quality deterministic PRNG step, used to advance
/// the world seed each tick and to feed per-tick random streams.
fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
