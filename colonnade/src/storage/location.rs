//! The entity directory: where each live entity currently lives.
//!
//! The directory is a flat vector of slots indexed by entity id. A slot
//! records the archetype table and row of the entity plus the generation it
//! was issued with, so every externally-facing operation can validate a
//! handle in O(1) before touching rows: a handle is live iff its slot is
//! marked alive *and* the generations match.

use crate::{
    entity::{Entity, Generation},
    storage::{Row, TableId},
};

/// Where a live entity's row is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    table: TableId,
    row: Row,
}

impl Location {
    /// Get the archetype table holding the entity.
    #[inline]
    pub fn table(&self) -> TableId {
        self.table
    }

    /// Get the entity's row within the table.
    #[inline]
    pub fn row(&self) -> Row {
        self.row
    }
}

/// One directory slot, indexed by entity id.
#[derive(Debug, Clone, Copy)]
struct Slot {
    /// Generation of the handle this slot was last recorded for.
    generation: Generation,

    /// Whether the slot currently holds a live entity.
    alive: bool,

    /// Archetype table of the entity, meaningful only while alive.
    table: TableId,

    /// Row within the table, meaningful only while alive.
    row: Row,
}

impl Slot {
    const VACANT: Self = Self {
        generation: Generation::FIRST,
        alive: false,
        table: TableId::new(0),
        row: Row::new(0),
    };
}

/// The smallest slot capacity the directory reserves up front.
const MIN_CAPACITY: usize = 64;

/// Location records for every entity id ever issued.
#[derive(Default)]
pub struct Directory {
    slots: Vec<Slot>,
    live: usize,
}

impl Directory {
    /// Create an empty directory.
    #[inline]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
        }
    }

    /// Record where `entity` lives. Marks the slot alive and stores the
    /// handle's generation; also used to re-point an entity after migration.
    pub fn record(&mut self, entity: Entity, table: TableId, row: Row) {
        self.ensure(entity.index());
        let slot = &mut self.slots[entity.index()];
        if !slot.alive {
            self.live += 1;
        }
        *slot = Slot {
            generation: entity.generation(),
            alive: true,
            table,
            row,
        };
    }

    /// Update the row of an already-live entity, after a swap-remove moved it.
    pub fn set_row(&mut self, entity: Entity, row: Row) {
        debug_assert!(self.is_live(entity), "moved entity must be live");
        self.slots[entity.index()].row = row;
    }

    /// Get the location of `entity`, validating the handle. Returns `None`
    /// for dead, stale, or never-issued handles.
    pub fn location(&self, entity: Entity) -> Option<Location> {
        let slot = self.slots.get(entity.index())?;
        (slot.alive && slot.generation == entity.generation()).then(|| Location {
            table: slot.table,
            row: slot.row,
        })
    }

    /// Get the location of `entity` without validating the handle.
    ///
    /// # Safety
    /// `entity` must be live: validated by the caller, or known live by
    /// construction. Reading the slot of a stale or never-issued handle
    /// returns garbage or is out of bounds.
    pub unsafe fn location_unchecked(&self, entity: Entity) -> Location {
        debug_assert!(self.is_live(entity), "unchecked lookup of a dead entity");
        // SAFETY: caller guarantees the id was issued, so the slot exists.
        let slot = unsafe { self.slots.get_unchecked(entity.index()) };
        Location {
            table: slot.table,
            row: slot.row,
        }
    }

    /// Whether `entity` is live: issued, not despawned, generation matching.
    #[inline]
    pub fn is_live(&self, entity: Entity) -> bool {
        self.slots
            .get(entity.index())
            .is_some_and(|slot| slot.alive && slot.generation == entity.generation())
    }

    /// Retire `entity`: mark its slot dead. Returns `false` for handles that
    /// are not live.
    pub fn retire(&mut self, entity: Entity) -> bool {
        if !self.is_live(entity) {
            return false;
        }
        self.slots[entity.index()].alive = false;
        self.live -= 1;
        true
    }

    /// Number of live entities.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Number of slots, i.e. one past the highest id ever recorded.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Grow the slot vector to cover `index`. Growth is geometric with a
    /// floor of `MIN_CAPACITY` slots.
    fn ensure(&mut self, index: usize) {
        if index < self.slots.len() {
            return;
        }
        if self.slots.capacity() == 0 {
            self.slots.reserve(MIN_CAPACITY.max(index + 1));
        }
        self.slots.resize(index + 1, Slot::VACANT);
    }
}

#[cfg(test)]
mod tests {
    use crate::entity::Allocator;

    use super::*;

    #[test]
    fn record_and_lookup() {
        // Given
        let mut allocator = Allocator::new();
        let mut directory = Directory::new();
        let entity = allocator.alloc();

        // When
        directory.record(entity, TableId::new(2), Row::new(7));

        // Then
        let location = directory.location(entity).unwrap();
        assert_eq!(location.table(), TableId::new(2));
        assert_eq!(location.row(), Row::new(7));
        assert!(directory.is_live(entity));
        assert_eq!(directory.live_count(), 1);
    }

    #[test]
    fn never_issued_handle_is_dead() {
        let directory = Directory::new();
        let entity = Entity::new(41u32);
        assert!(!directory.is_live(entity));
        assert!(directory.location(entity).is_none());
    }

    #[test]
    fn stale_generation_is_rejected() {
        // Given
        let mut allocator = Allocator::new();
        let mut directory = Directory::new();
        let entity = allocator.alloc();
        directory.record(entity, TableId::new(0), Row::new(0));

        // When - the slot is retired and reissued at the next generation
        directory.retire(entity);
        allocator.free(entity);
        let reborn = allocator.alloc();
        directory.record(reborn, TableId::new(1), Row::new(3));

        // Then - the old handle stays dead, the new one resolves
        assert!(!directory.is_live(entity));
        assert!(directory.location(entity).is_none());
        assert!(directory.is_live(reborn));
        assert_eq!(directory.location(reborn).unwrap().row(), Row::new(3));
    }

    #[test]
    fn retire_is_idempotent() {
        // Given
        let mut allocator = Allocator::new();
        let mut directory = Directory::new();
        let entity = allocator.alloc();
        directory.record(entity, TableId::new(0), Row::new(0));

        // Then
        assert!(directory.retire(entity));
        assert!(!directory.retire(entity));
        assert_eq!(directory.live_count(), 0);
    }

    #[test]
    fn set_row_repoints_live_entity() {
        // Given
        let mut allocator = Allocator::new();
        let mut directory = Directory::new();
        let entity = allocator.alloc();
        directory.record(entity, TableId::new(0), Row::new(9));

        // When
        directory.set_row(entity, Row::new(2));

        // Then
        assert_eq!(directory.location(entity).unwrap().row(), Row::new(2));
    }

    #[test]
    fn slots_grow_geometrically_with_floor() {
        // Given
        let mut directory = Directory::new();

        // When - record a tiny id
        directory.record(Entity::new(0u32), TableId::new(0), Row::new(0));

        // Then - capacity starts at the floor
        assert!(directory.slots.capacity() >= 64);
        assert_eq!(directory.slot_count(), 1);

        // When - record a large id
        directory.record(Entity::new(500u32), TableId::new(0), Row::new(0));

        // Then
        assert_eq!(directory.slot_count(), 501);
        assert_eq!(directory.live_count(), 2);
    }
}
