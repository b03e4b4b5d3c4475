use std::collections::{BTreeMap, BTreeSet, HashMap};

use glade_common::{ObjectId, Position};

use crate::error::WorldError;
use crate::object::WorldObject;

/// A 2D cell coordinate in the registry's spatial index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
}

impl CellCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Owns the set of live objects: a primary id-ordered map plus a fixed-size
/// cell grid for radius queries.
///
/// # Invariants
/// - Primary map and grid index mutate together; after every public call an
///   object is either in both or in neither.
/// - Iteration and query results are id-ordered (BTreeMap/BTreeSet), so a
///   given registry state always enumerates the same way.
pub struct SpatialRegistry {
    cell_size: f32,
    objects: BTreeMap<ObjectId, Box<dyn WorldObject>>,
    cells: HashMap<CellCoord, BTreeSet<ObjectId>>,
    placements: HashMap<ObjectId, CellCoord>,
}

impl SpatialRegistry {
    /// Create an empty registry with the given index cell size.
    pub fn new(cell_size: f32) -> Self {
        assert!(cell_size > 0.0, "cell_size must be positive");
        Self {
            cell_size,
            objects: BTreeMap::new(),
            cells: HashMap::new(),
            placements: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Live ids in iteration order. The tick driver snapshots these at tick
    /// start so mid-tick mutations cannot disturb the pass.
    pub fn ids(&self) -> Vec<ObjectId> {
        self.objects.keys().copied().collect()
    }

    /// Convert a world position to its index cell.
    pub fn position_to_cell(&self, pos: Position) -> CellCoord {
        CellCoord {
            x: (pos.x() / self.cell_size).floor() as i32,
            y: (pos.y() / self.cell_size).floor() as i32,
        }
    }

    /// Add an object. Fails with [`WorldError::DuplicateId`] if the id is
    /// already registered; the registry is left untouched in that case.
    pub fn insert(&mut self, obj: Box<dyn WorldObject>) -> Result<(), WorldError> {
        let id = obj.id();
        if self.objects.contains_key(&id) {
            return Err(WorldError::DuplicateId(id));
        }
        let cell = self.position_to_cell(obj.position());
        self.objects.insert(id, obj);
        self.cells.entry(cell).or_default().insert(id);
        self.placements.insert(id, cell);
        Ok(())
    }

    /// Delete an object, returning it. Absent ids yield `None`; removal of
    /// an already-removed object is an expected race under self-removal.
    pub fn remove(&mut self, id: ObjectId) -> Option<Box<dyn WorldObject>> {
        let obj = self.objects.remove(&id)?;
        if let Some(cell) = self.placements.remove(&id) {
            if let Some(members) = self.cells.get_mut(&cell) {
                members.remove(&id);
                if members.is_empty() {
                    self.cells.remove(&cell);
                }
            }
        }
        Some(obj)
    }

    pub fn get(&self, id: ObjectId) -> Option<&dyn WorldObject> {
        self.objects.get(&id).map(|obj| &**obj)
    }

    /// Mutable access for state-only mutation (flags, payload fields).
    /// Position changes must go through [`set_position`](Self::set_position)
    /// so the grid index stays consistent.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut (dyn WorldObject + 'static)> {
        self.objects.get_mut(&id).map(|obj| &mut **obj)
    }

    /// Move an object, rebucketing it in the grid index. Returns false for
    /// absent ids.
    pub fn set_position(&mut self, id: ObjectId, pos: Position) -> bool {
        let new_cell = self.position_to_cell(pos);
        let Some(obj) = self.objects.get_mut(&id) else {
            return false;
        };
        obj.set_position(pos);
        let old_cell = self.placements.insert(id, new_cell);
        if old_cell != Some(new_cell) {
            if let Some(cell) = old_cell {
                if let Some(members) = self.cells.get_mut(&cell) {
                    members.remove(&id);
                    if members.is_empty() {
                        self.cells.remove(&cell);
                    }
                }
            }
            self.cells.entry(new_cell).or_default().insert(id);
        }
        true
    }

    /// All live objects of `kind` whose distance to `position` is within
    /// `radius`, in id order. Id order is deterministic for a given registry
    /// state but is not distance order. The result reflects exactly the
    /// objects present at call time.
    pub fn query(&self, position: Position, kind: &str, radius: f32) -> Vec<&dyn WorldObject> {
        let min = self.position_to_cell(Position::new(position.x() - radius, position.y() - radius));
        let max = self.position_to_cell(Position::new(position.x() + radius, position.y() + radius));

        let mut candidates: BTreeSet<ObjectId> = BTreeSet::new();
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                if let Some(members) = self.cells.get(&CellCoord::new(x, y)) {
                    candidates.extend(members.iter().copied());
                }
            }
        }

        candidates
            .into_iter()
            .filter_map(|id| self.objects.get(&id))
            .map(|obj| &**obj)
            .filter(|obj| obj.kind() == kind && obj.position().distance(position) <= radius)
            .collect()
    }

    /// Full id-ordered enumeration for tick-driving and serialization.
    pub fn all(&self) -> impl Iterator<Item = &dyn WorldObject> {
        self.objects.values().map(|obj| &**obj)
    }

    /// Number of non-empty index cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objs::DropObject;
    use crate::player::Player;
    use glade_common::ConnectionId;

    fn drop_at(x: f32, y: f32) -> Box<dyn WorldObject> {
        Box::new(DropObject::new(ObjectId::new(), Position::new(x, y), "coin"))
    }

    #[test]
    fn insert_and_remove_keep_map_and_index_consistent() {
        let mut registry = SpatialRegistry::new(8.0);
        let obj = drop_at(1.0, 1.0);
        let id = obj.id();
        registry.insert(obj).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.cell_count(), 1);

        assert!(registry.remove(id).is_some());
        assert!(registry.is_empty());
        assert_eq!(registry.cell_count(), 0);
        assert!(registry.remove(id).is_none());
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut registry = SpatialRegistry::new(8.0);
        let id = ObjectId::new();
        registry
            .insert(Box::new(DropObject::new(id, Position::ORIGIN, "a")))
            .unwrap();
        let err = registry
            .insert(Box::new(DropObject::new(id, Position::ORIGIN, "b")))
            .unwrap_err();
        assert!(matches!(err, WorldError::DuplicateId(dup) if dup == id));
        // The original object survives.
        assert_eq!(registry.get(id).unwrap().serialize(), "a");
    }

    #[test]
    fn query_filters_kind_and_distance() {
        let mut registry = SpatialRegistry::new(8.0);
        registry.insert(drop_at(0.0, 0.0)).unwrap();
        registry.insert(drop_at(0.3, 0.0)).unwrap();
        registry.insert(drop_at(3.0, 0.0)).unwrap();
        registry
            .insert(Box::new(Player::new(
                ObjectId::new(),
                ConnectionId::new(),
                "ada",
            )))
            .unwrap();

        let near = registry.query(Position::ORIGIN, DropObject::KIND, 0.5);
        assert_eq!(near.len(), 2);
        for obj in &near {
            assert_eq!(obj.kind(), DropObject::KIND);
            assert!(obj.position().distance(Position::ORIGIN) <= 0.5);
        }
    }

    #[test]
    fn query_crosses_cell_boundaries() {
        let mut registry = SpatialRegistry::new(8.0);
        // Either side of the x = 8 cell edge.
        registry.insert(drop_at(7.9, 0.0)).unwrap();
        registry.insert(drop_at(8.1, 0.0)).unwrap();

        let found = registry.query(Position::new(8.0, 0.0), DropObject::KIND, 0.5);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn query_order_is_id_order() {
        let mut registry = SpatialRegistry::new(8.0);
        for _ in 0..10 {
            registry.insert(drop_at(0.0, 0.0)).unwrap();
        }
        let ids: Vec<ObjectId> = registry
            .query(Position::ORIGIN, DropObject::KIND, 1.0)
            .iter()
            .map(|obj| obj.id())
            .collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn set_position_rebuckets() {
        let mut registry = SpatialRegistry::new(8.0);
        let obj = drop_at(0.0, 0.0);
        let id = obj.id();
        registry.insert(obj).unwrap();

        assert!(registry.set_position(id, Position::new(20.0, 0.0)));
        assert!(
            registry
                .query(Position::ORIGIN, DropObject::KIND, 1.0)
                .is_empty()
        );
        assert_eq!(
            registry
                .query(Position::new(20.0, 0.0), DropObject::KIND, 1.0)
                .len(),
            1
        );
    }
}
