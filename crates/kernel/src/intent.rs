use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glade_common::{ConnectionId, ObjectId, Position};

use crate::player::PlayerFlag;

/// A connection-layer request, applied by the world at the next tick
/// boundary.
#[derive(Debug, Clone)]
pub enum WorldIntent {
    Join {
        id: ObjectId,
        connection: ConnectionId,
        name: String,
    },
    Leave {
        id: ObjectId,
    },
    SetFlag {
        id: ObjectId,
        flag: PlayerFlag,
        active: bool,
    },
    MoveTo {
        id: ObjectId,
        to: Position,
    },
    /// Drop an item at the player's current position.
    DropItem {
        player: ObjectId,
        item_type: String,
    },
}

/// Thread-safe funnel from connection contexts into the world.
///
/// Cloning yields another handle to the same queue. Pushes may happen at any
/// time, including while a tick is in flight; the world drains the queue at
/// the start of its next tick, so an in-flight tick never observes a
/// half-applied mutation.
#[derive(Clone, Default)]
pub struct IntentQueue {
    inner: Arc<Mutex<Vec<WorldIntent>>>,
}

impl IntentQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Announce a joining connection. The player id is allocated here so the
    /// caller holds its handle immediately; the player itself enters the
    /// world at the next tick boundary.
    pub fn join(&self, connection: ConnectionId, name: impl Into<String>) -> ObjectId {
        let id = ObjectId::new();
        self.push(WorldIntent::Join {
            id,
            connection,
            name: name.into(),
        });
        id
    }

    pub fn leave(&self, id: ObjectId) {
        self.push(WorldIntent::Leave { id });
    }

    pub fn set_flag(&self, id: ObjectId, flag: PlayerFlag, active: bool) {
        self.push(WorldIntent::SetFlag { id, flag, active });
    }

    pub fn move_to(&self, id: ObjectId, to: Position) {
        self.push(WorldIntent::MoveTo { id, to });
    }

    pub fn drop_item(&self, player: ObjectId, item_type: impl Into<String>) {
        self.push(WorldIntent::DropItem {
            player,
            item_type: item_type.into(),
        });
    }

    pub fn push(&self, intent: WorldIntent) {
        self.lock().push(intent);
    }

    /// Take everything queued so far, in arrival order.
    pub fn drain(&self) -> Vec<WorldIntent> {
        std::mem::take(&mut *self.lock())
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<WorldIntent>> {
        // A poisoned lock means a pusher panicked mid-call; the queued
        // intents themselves are still intact.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_the_queue_in_order() {
        let queue = IntentQueue::new();
        let a = queue.join(ConnectionId::new(), "a");
        queue.leave(a);

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert!(matches!(drained[0], WorldIntent::Join { id, .. } if id == a));
        assert!(matches!(drained[1], WorldIntent::Leave { id } if id == a));
        assert!(queue.is_empty());
    }

    #[test]
    fn clones_share_the_same_queue() {
        let queue = IntentQueue::new();
        let handle = queue.clone();
        handle.join(ConnectionId::new(), "remote");
        assert_eq!(queue.drain().len(), 1);
    }

    #[test]
    fn pushes_from_threads_all_arrive() {
        let queue = IntentQueue::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = queue.clone();
                std::thread::spawn(move || {
                    queue.join(ConnectionId::new(), "threaded");
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(queue.drain().len(), 8);
    }
}
