//! The World: the façade composing the whole engine.
//!
//! A `World` owns the component registry, the archetype tables, the entity
//! directory and allocator, the query cache, the deferred-despawn buffer,
//! the event queues, and a caller-defined resources record. All mutation
//! flows through `&mut World`: the engine is single-threaded cooperative and
//! never suspends internally.
//!
//! Component types and event queues are declared up front on the
//! [`WorldBuilder`]; once built, the component universe is fixed.
//!
//! # Handle validation
//!
//! Every checked operation validates its entity handle first and reports
//! "not live" (`None` / `false`) rather than touching stale rows. The
//! `*_unchecked` variants skip validation for hot inner loops and document
//! their preconditions instead.
//!
//! # Aliasing
//!
//! References returned by [`get`](World::get), column slices returned by the
//! table views, and event slices all alias storage inside the world. Rust's
//! borrow checker pins them to the `&World` borrow, so any operation that
//! could move rows or grow columns (spawn, despawn, add, remove, send)
//! already requires the borrow to have ended.

use crate::{
    component::{Component, Mask, Registry},
    entity::{self, Entity},
    event::{Event, Events},
    query::{QueryCache, Tables},
    storage::{Bundle, Directory, Row, Storage, Table, TableId},
};

/// Builder declaring the component universe, the event schema, and the
/// resources record of a [`World`].
pub struct WorldBuilder<R = ()> {
    registry: Registry,
    events: Events,
    resources: R,
}

impl WorldBuilder<()> {
    /// Start a builder with no components, no events, and unit resources.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            events: Events::new(),
            resources: (),
        }
    }
}

impl Default for WorldBuilder<()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> WorldBuilder<R> {
    /// Register a component type. At most 64 types can be registered; each
    /// receives the next free bit of the component mask.
    pub fn register<C: Component>(self) -> Self {
        self.registry.register::<C>();
        self
    }

    /// Declare an event queue of `E` payloads under `name`.
    ///
    /// # Panics
    /// Panics if the name is already taken.
    pub fn event<E: Event>(mut self, name: &str) -> Self {
        self.events.register::<E>(name);
        self
    }

    /// Replace the resources record carried by the world.
    pub fn resources<R2>(self, resources: R2) -> WorldBuilder<R2> {
        WorldBuilder {
            registry: self.registry,
            events: self.events,
            resources,
        }
    }

    /// Build the world. It starts with zero entities and zero tables.
    pub fn build(self) -> World<R> {
        World {
            registry: self.registry,
            storage: Storage::new(),
            directory: Directory::new(),
            allocator: entity::Allocator::new(),
            query_cache: QueryCache::new(),
            pending_despawn: Vec::new(),
            events: self.events,
            resources: self.resources,
        }
    }
}

/// The central container for entities, components, events, and resources.
pub struct World<R = ()> {
    /// Registered component types.
    registry: Registry,

    /// Archetype tables keyed by mask.
    storage: Storage,

    /// Entity id → (table, row, generation, alive).
    directory: Directory,

    /// Entity id allocator with free-list reuse.
    allocator: entity::Allocator,

    /// Memoised query → table-list mapping.
    query_cache: QueryCache,

    /// Entities queued for a deferred despawn.
    pending_despawn: Vec<Entity>,

    /// Event queues addressed by name.
    events: Events,

    /// The caller-defined resources record, accessed directly.
    pub resources: R,
}

impl World<()> {
    /// Start building a world.
    pub fn builder() -> WorldBuilder<()> {
        WorldBuilder::new()
    }
}

impl<R> World<R> {
    // ---------------------------------------------------------------- spawn

    /// Spawn an entity carrying the given component values. An empty bundle
    /// spawns nothing and returns [`Entity::NIL`].
    ///
    /// # Panics
    /// Panics if a component type in the bundle was never registered.
    pub fn spawn<B: Bundle>(&mut self, bundle: B) -> Entity {
        let mask = B::component_mask(&self.registry);
        if mask.is_empty() {
            return Entity::NIL;
        }

        let table_id = self
            .storage
            .find_or_create(mask, &self.registry, &mut self.query_cache);
        let entity = self.allocator.alloc();

        let table = self.storage.table_mut(table_id);
        let row = table.push_row(entity);
        bundle.apply(table, row);
        self.directory.record(entity, table_id, row);

        log::trace!(
            "spawned entity {:?} into table {} row {}",
            entity,
            table_id.index(),
            row.index()
        );
        entity
    }

    /// Spawn `count` entities each carrying a copy of one component value.
    /// Storage is pre-grown once, so no per-row reallocation happens.
    ///
    /// # Panics
    /// Panics if `C` was never registered.
    pub fn spawn_batch<C: Component>(&mut self, count: usize, value: C) -> Vec<Entity> {
        let bit = self.registry.bit_of::<C>().unwrap_or_else(|| {
            panic!(
                "component type not registered: {}",
                std::any::type_name::<C>()
            )
        });
        self.spawn_batch_with_init(Mask::from_bits(bit), count, move |table, row| {
            table.write_value(row, value);
        })
    }

    /// Spawn `count` entities in the archetype for `mask` with all component
    /// bytes zero-filled. Use [`spawn_batch_with_init`] to write real values
    /// in the same pass, or write them afterwards through the table views.
    ///
    /// # Panics
    /// Panics if `mask` references an unregistered component.
    ///
    /// [`spawn_batch_with_init`]: World::spawn_batch_with_init
    pub fn spawn_with_mask(&mut self, mask: Mask, count: usize) -> Vec<Entity> {
        if mask.is_empty() || count == 0 {
            return Vec::new();
        }

        let table_id = self
            .storage
            .find_or_create(mask, &self.registry, &mut self.query_cache);
        let entities = self.allocator.alloc_many(count);

        let table = self.storage.table_mut(table_id);
        table.reserve(count);
        for &entity in &entities {
            let row = table.push_row(entity);
            self.directory.record(entity, table_id, row);
        }

        log::trace!(
            "spawned {} entities into table {} (mask {:#x})",
            count,
            table_id.index(),
            mask.bits()
        );
        entities
    }

    /// Spawn `count` entities in the archetype for `mask`, then invoke
    /// `init` once per fresh row so it can write component values through
    /// the table.
    ///
    /// # Panics
    /// Panics if `mask` references an unregistered component.
    pub fn spawn_batch_with_init(
        &mut self,
        mask: Mask,
        count: usize,
        mut init: impl FnMut(&mut Table, Row),
    ) -> Vec<Entity> {
        let entities = self.spawn_with_mask(mask, count);
        if entities.is_empty() {
            return entities;
        }

        let table_id = self
            .storage
            .table_for_mask(mask)
            .expect("table was just created");
        let table = self.storage.table_mut(table_id);
        let end = table.len();
        for index in end - entities.len()..end {
            init(table, Row::new(index));
        }
        entities
    }

    // ------------------------------------------------------------- lifetime

    /// Despawn an entity, removing its row. Returns `false` for dead, stale,
    /// or never-issued handles; the world is unchanged in that case.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        let Some(location) = self.directory.location(entity) else {
            return false;
        };

        let table = self.storage.table_mut(location.table());
        if let Some(moved) = table.swap_remove_row(location.row()) {
            self.directory.set_row(moved, location.row());
        }
        self.directory.retire(entity);
        self.allocator.free(entity);

        log::trace!("despawned entity {:?}", entity);
        true
    }

    /// Whether the handle refers to a live entity.
    #[inline]
    pub fn is_live(&self, entity: Entity) -> bool {
        self.directory.is_live(entity)
    }

    /// Number of live entities.
    #[inline]
    pub fn entity_count(&self) -> usize {
        self.directory.live_count()
    }

    /// Queue an entity for [`apply_despawns`](World::apply_despawns). Safe
    /// to call while iterating; duplicates and stale handles are tolerated.
    pub fn queue_despawn(&mut self, entity: Entity) {
        self.pending_despawn.push(entity);
    }

    /// Despawn every queued entity in queue order, then clear the queue.
    /// Entries whose handle is already dead (duplicates, stale handles) are
    /// skipped by the generational check. Returns how many entities were
    /// actually despawned.
    pub fn apply_despawns(&mut self) -> usize {
        let mut applied = 0;
        let mut index = 0;
        while index < self.pending_despawn.len() {
            let entity = self.pending_despawn[index];
            if self.despawn(entity) {
                applied += 1;
            }
            index += 1;
        }
        self.pending_despawn.clear();

        if applied > 0 {
            log::debug!("applied {} deferred despawns", applied);
        }
        applied
    }

    // ------------------------------------------------------------ component

    /// Get a reference to `entity`'s component of type `C`, or `None` when
    /// the handle is not live or the component is absent.
    pub fn get<C: Component>(&self, entity: Entity) -> Option<&C> {
        let location = self.directory.location(entity)?;
        self.storage.table(location.table()).get(location.row())
    }

    /// Get a mutable reference to `entity`'s component of type `C`, or
    /// `None` when the handle is not live or the component is absent.
    pub fn get_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        let location = self.directory.location(entity)?;
        self.storage
            .table_mut(location.table())
            .get_mut(location.row())
    }

    /// Get a reference to `entity`'s component of type `C` with no handle
    /// validation and no presence check.
    ///
    /// # Safety
    /// `entity` must be live, its archetype must contain `C`, and `C` must
    /// be registered. Intended for hot inner loops that validated once.
    pub unsafe fn get_unchecked<C: Component>(&self, entity: Entity) -> &C {
        let bit = self.registry.bit_of::<C>().unwrap_or_default();
        debug_assert!(bit != 0, "component type not registered");
        // SAFETY: forwarded to the caller's contract.
        unsafe {
            let location = self.directory.location_unchecked(entity);
            self.storage
                .table(location.table())
                .value_unchecked(bit, location.row())
        }
    }

    /// Overwrite `entity`'s component of type `C`. Returns `false` when the
    /// handle is not live or the component is absent; a missing component is
    /// never added.
    pub fn set<C: Component>(&mut self, entity: Entity, value: C) -> bool {
        match self.get_mut::<C>(entity) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Whether a live `entity` carries a component of type `C`.
    pub fn has<C: Component>(&self, entity: Entity) -> bool {
        let Some(mask) = self.component_mask(entity) else {
            return false;
        };
        self.registry
            .bit_of::<C>()
            .is_some_and(|bit| mask.has_bit(bit))
    }

    /// Whether a live `entity` carries every component in `mask`.
    pub fn has_components(&self, entity: Entity, mask: Mask) -> bool {
        self.component_mask(entity)
            .is_some_and(|current| current.contains(mask))
    }

    /// The component mask of `entity`'s archetype, or `None` when the handle
    /// is not live.
    pub fn component_mask(&self, entity: Entity) -> Option<Mask> {
        let location = self.directory.location(entity)?;
        Some(self.storage.table(location.table()).mask())
    }

    // ------------------------------------------------- structural mutation

    /// Add a component to a live entity. If the component is already
    /// present, its value is overwritten and the entity stays put; otherwise
    /// the entity's row migrates to the widened archetype, following the
    /// memoised edge when one exists. Returns `false` when the handle is not
    /// live or `C` is unregistered.
    pub fn add<C: Component>(&mut self, entity: Entity, value: C) -> bool {
        let Some(location) = self.directory.location(entity) else {
            return false;
        };
        let Some(info) = self.registry.info_of::<C>() else {
            return false;
        };

        let source_id = location.table();
        let source_mask = self.storage.table(source_id).mask();

        // Already present: overwrite in place, no migration.
        if source_mask.has_bit(info.bit()) {
            self.storage
                .table_mut(source_id)
                .write_value(location.row(), value);
            return true;
        }

        let target_mask = source_mask.with(info.bit());
        let target_id = match self.storage.table(source_id).add_edge(info.index()) {
            Some(id) => id,
            None => {
                let id =
                    self.storage
                        .find_or_create(target_mask, &self.registry, &mut self.query_cache);
                self.storage.table_mut(source_id).set_add_edge(info.index(), id);
                self.storage
                    .table_mut(id)
                    .set_remove_edge(info.index(), source_id);
                id
            }
        };

        let row = self.migrate(entity, source_id, target_id, location.row());
        self.storage.table_mut(target_id).write_value(row, value);
        true
    }

    /// Remove a component from a live entity, migrating its row to the
    /// narrowed archetype. Removing the last component despawns the entity.
    /// Returns `false` when the handle is not live or the component is
    /// absent.
    pub fn remove<C: Component>(&mut self, entity: Entity) -> bool {
        let Some(location) = self.directory.location(entity) else {
            return false;
        };
        let Some(info) = self.registry.info_of::<C>() else {
            return false;
        };

        let source_id = location.table();
        let source_mask = self.storage.table(source_id).mask();
        if !source_mask.has_bit(info.bit()) {
            return false;
        }

        let target_mask = source_mask.without(info.bit());
        if target_mask.is_empty() {
            // Removing the last component retires the entity.
            return self.despawn(entity);
        }

        let target_id = match self.storage.table(source_id).remove_edge(info.index()) {
            Some(id) => id,
            None => {
                let id =
                    self.storage
                        .find_or_create(target_mask, &self.registry, &mut self.query_cache);
                self.storage
                    .table_mut(source_id)
                    .set_remove_edge(info.index(), id);
                self.storage.table_mut(id).set_add_edge(info.index(), source_id);
                id
            }
        };

        self.migrate(entity, source_id, target_id, location.row());
        true
    }

    /// Move `entity`'s row from `source` to `target`, fixing up the
    /// directory for both the migrated entity and any entity swap-moved
    /// inside the source table. Returns the new row.
    fn migrate(
        &mut self,
        entity: Entity,
        source: TableId,
        target: TableId,
        row: Row,
    ) -> Row {
        let (source_table, target_table) = self.storage.pair_mut(source, target);
        let (new_row, moved) = Table::transfer_row(source_table, target_table, row);
        if let Some(moved) = moved {
            self.directory.set_row(moved, row);
        }
        self.directory.record(entity, target, new_row);

        log::trace!(
            "migrated entity {:?} from table {} to table {} row {}",
            entity,
            source.index(),
            target.index(),
            new_row.index()
        );
        new_row
    }

    // ---------------------------------------------------------------- query

    /// The mask covering the components of bundle `B`.
    ///
    /// # Panics
    /// Panics if a component type in the bundle was never registered.
    pub fn mask_of<B: Bundle>(&self) -> Mask {
        B::component_mask(&self.registry)
    }

    /// The single-bit mask value of component `C`, if registered. Feed this
    /// to the `*_with_bit` and `*_unchecked` column views.
    pub fn component_bit<C: Component>(&self) -> Option<u64> {
        self.registry.bit_of::<C>()
    }

    /// Ids of every table matching the query, in table-creation order.
    /// Cached; later archetype creations extend the same list.
    pub fn matching_tables(&mut self, include: Mask, exclude: Mask) -> &[TableId] {
        self.query_cache
            .matching(include, exclude, self.storage.tables())
    }

    /// Total number of entities across all matching tables.
    pub fn count(&mut self, include: Mask, exclude: Mask) -> usize {
        let ids = self
            .query_cache
            .matching(include, exclude, self.storage.tables());
        ids.iter()
            .map(|id| self.storage.table(*id).len())
            .sum()
    }

    /// The first entity of the first non-empty matching table, if any.
    pub fn first(&mut self, include: Mask, exclude: Mask) -> Option<Entity> {
        self.tables(include, exclude)
            .find(|(table, _)| !table.is_empty())
            .and_then(|(table, _)| table.entity(Row::new(0)))
    }

    /// Collect the handles of every entity in every matching table.
    pub fn entities(&mut self, include: Mask, exclude: Mask) -> Vec<Entity> {
        self.tables(include, exclude)
            .flat_map(|(table, _)| table.entities().iter().copied())
            .collect()
    }

    /// Iterate the matching tables as `(table, id)` pairs.
    pub fn tables(&mut self, include: Mask, exclude: Mask) -> Tables<'_> {
        let ids = self
            .query_cache
            .matching(include, exclude, self.storage.tables());
        Tables::new(self.storage.tables(), ids)
    }

    /// Invoke `f` once per matching table.
    pub fn for_each_table(&mut self, include: Mask, exclude: Mask, mut f: impl FnMut(&Table)) {
        for (table, _) in self.tables(include, exclude) {
            f(table);
        }
    }

    /// Invoke `f` once per matching table, with mutable column access.
    pub fn for_each_table_mut(
        &mut self,
        include: Mask,
        exclude: Mask,
        mut f: impl FnMut(&mut Table),
    ) {
        let ids = self
            .query_cache
            .matching(include, exclude, self.storage.tables())
            .to_vec();
        for id in ids {
            f(self.storage.table_mut(id));
        }
    }

    /// Invoke `f` once per row of every matching table.
    pub fn for_each_row(&mut self, include: Mask, exclude: Mask, mut f: impl FnMut(&Table, Row)) {
        for (table, _) in self.tables(include, exclude) {
            for index in 0..table.len() {
                f(table, Row::new(index));
            }
        }
    }

    /// Invoke `f` once per row of every matching table, with mutable column
    /// access.
    pub fn for_each_row_mut(
        &mut self,
        include: Mask,
        exclude: Mask,
        mut f: impl FnMut(&mut Table, Row),
    ) {
        let ids = self
            .query_cache
            .matching(include, exclude, self.storage.tables())
            .to_vec();
        for id in ids {
            let table = self.storage.table_mut(id);
            for index in 0..table.len() {
                f(table, Row::new(index));
            }
        }
    }

    // --------------------------------------------------------------- events

    /// Append an event to the named queue. Returns `false` when the name is
    /// unknown or the queue holds a different payload type.
    pub fn send<E: Event>(&mut self, name: &str, event: E) -> bool {
        self.events.send(name, event)
    }

    /// The pending events of the named queue, in send order. `None` when the
    /// name is unknown or the payload type does not match.
    pub fn events<E: Event>(&self, name: &str) -> Option<&[E]> {
        self.events.slice(name)
    }

    /// Number of pending events in the named queue.
    #[inline]
    pub fn event_count(&self, name: &str) -> usize {
        self.events.len(name)
    }

    /// Truncate the named queue. Returns `false` for unknown names.
    pub fn clear_events(&mut self, name: &str) -> bool {
        self.events.clear(name)
    }

    /// Truncate every event queue.
    pub fn clear_all_events(&mut self) {
        self.events.clear_all();
    }

    // ------------------------------------------------------------ accessors

    /// The component registry.
    #[inline]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Number of archetype tables created so far.
    #[inline]
    pub fn table_count(&self) -> usize {
        self.storage.table_count()
    }
}

#[cfg(test)]
mod tests {
    use bytemuck::{Pod, Zeroable};

    use crate::component::Mask;

    use super::*;

    #[derive(crate::Component, Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
    #[repr(C)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(crate::Component, Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
    #[repr(C)]
    struct Velocity {
        dx: f32,
        dy: f32,
    }

    #[derive(crate::Component, Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
    #[repr(C)]
    struct Health {
        hp: i32,
    }

    fn world() -> World {
        World::builder()
            .register::<Position>()
            .register::<Velocity>()
            .register::<Health>()
            .build()
    }

    #[test]
    fn spawn_and_get() {
        // Given
        let mut world = world();

        // When
        let entity = world.spawn((Position { x: 1.0, y: 2.0 }, Velocity { dx: 3.0, dy: 4.0 }));

        // Then
        assert!(world.is_live(entity));
        assert_eq!(world.entity_count(), 1);
        assert_eq!(world.get::<Position>(entity), Some(&Position { x: 1.0, y: 2.0 }));
        assert_eq!(world.get::<Velocity>(entity), Some(&Velocity { dx: 3.0, dy: 4.0 }));
        assert_eq!(world.get::<Health>(entity), None);
    }

    #[test]
    fn empty_bundle_spawns_nothing() {
        // Given
        let mut world = world();

        // When
        let entity = world.spawn(());

        // Then
        assert_eq!(entity, Entity::NIL);
        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.table_count(), 0);
    }

    #[test]
    fn set_overwrites_but_never_adds() {
        // Given
        let mut world = world();
        let entity = world.spawn(Position { x: 0.0, y: 0.0 });

        // When / Then - present component is overwritten
        assert!(world.set(entity, Position { x: 10.0, y: 20.0 }));
        assert_eq!(world.get::<Position>(entity), Some(&Position { x: 10.0, y: 20.0 }));

        // When / Then - absent component is reported, not added
        assert!(!world.set(entity, Velocity { dx: 1.0, dy: 1.0 }));
        assert!(!world.has::<Velocity>(entity));
    }

    #[test]
    fn despawn_invalidates_the_handle_forever() {
        // Given
        let mut world = world();
        let entity = world.spawn(Position { x: 1.0, y: 1.0 });

        // When
        assert!(world.despawn(entity));

        // Then
        assert!(!world.is_live(entity));
        assert_eq!(world.get::<Position>(entity), None);
        assert_eq!(world.entity_count(), 0);

        // Then - a second despawn is a no-op
        assert!(!world.despawn(entity));

        // Then - the recycled slot carries a newer generation
        let reborn = world.spawn(Position { x: 2.0, y: 2.0 });
        assert_eq!(reborn.id(), entity.id());
        assert!(reborn.generation() > entity.generation());
        assert!(!world.is_live(entity));
        assert!(world.is_live(reborn));
    }

    #[test]
    fn swap_remove_keeps_other_entities_intact() {
        // Given - three entities in one table
        let mut world = world();
        let first = world.spawn(Position { x: 1.0, y: 0.0 });
        let second = world.spawn(Position { x: 2.0, y: 0.0 });
        let third = world.spawn(Position { x: 3.0, y: 0.0 });

        // When - despawn the middle one
        world.despawn(second);

        // Then
        assert_eq!(world.entity_count(), 2);
        assert_eq!(world.get::<Position>(first).unwrap().x, 1.0);
        assert_eq!(world.get::<Position>(third).unwrap().x, 3.0);
    }

    #[test]
    fn add_migrates_to_the_wider_archetype() {
        // Given
        let mut world = world();
        let entity = world.spawn(Position { x: 1.0, y: 2.0 });
        assert_eq!(world.table_count(), 1);

        // When
        assert!(world.add(entity, Velocity { dx: 5.0, dy: 6.0 }));

        // Then
        assert_eq!(world.table_count(), 2);
        assert!(world.has::<Velocity>(entity));
        assert_eq!(world.get::<Position>(entity), Some(&Position { x: 1.0, y: 2.0 }));
        assert_eq!(world.get::<Velocity>(entity), Some(&Velocity { dx: 5.0, dy: 6.0 }));
    }

    #[test]
    fn add_existing_component_overwrites_in_place() {
        // Given
        let mut world = world();
        let entity = world.spawn(Position { x: 1.0, y: 2.0 });

        // When
        assert!(world.add(entity, Position { x: 9.0, y: 9.0 }));

        // Then - same archetype, new value
        assert_eq!(world.table_count(), 1);
        assert_eq!(world.get::<Position>(entity), Some(&Position { x: 9.0, y: 9.0 }));
    }

    #[test]
    fn add_fixes_up_the_swapped_entity() {
        // Given - two entities sharing a table
        let mut world = world();
        let first = world.spawn(Position { x: 1.0, y: 0.0 });
        let second = world.spawn(Position { x: 2.0, y: 0.0 });

        // When - migrating the first swaps the second into row 0
        world.add(first, Velocity { dx: 0.5, dy: 0.0 });

        // Then - both entities still resolve correctly
        assert_eq!(world.get::<Position>(first).unwrap().x, 1.0);
        assert_eq!(world.get::<Velocity>(first).unwrap().dx, 0.5);
        assert_eq!(world.get::<Position>(second).unwrap().x, 2.0);
        assert!(!world.has::<Velocity>(second));
    }

    #[test]
    fn remove_migrates_to_the_narrower_archetype() {
        // Given
        let mut world = world();
        let entity = world.spawn((Position { x: 1.0, y: 2.0 }, Velocity { dx: 1.0, dy: 1.0 }));

        // When
        assert!(world.remove::<Velocity>(entity));

        // Then
        assert!(!world.has::<Velocity>(entity));
        assert_eq!(world.get::<Position>(entity), Some(&Position { x: 1.0, y: 2.0 }));

        // Then - removing an absent component reports false
        assert!(!world.remove::<Velocity>(entity));
    }

    #[test]
    fn removing_the_last_component_despawns() {
        // Given
        let mut world = world();
        let entity = world.spawn(Position { x: 1.0, y: 1.0 });

        // When
        assert!(world.remove::<Position>(entity));

        // Then
        assert!(!world.is_live(entity));
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn add_then_remove_restores_the_original_mask() {
        // Given
        let mut world = world();
        let entity = world.spawn(Position { x: 1.0, y: 2.0 });
        let original = world.component_mask(entity).unwrap();

        // When
        world.add(entity, Velocity { dx: 1.0, dy: 1.0 });
        world.remove::<Velocity>(entity);

        // Then - back to the original archetype, position preserved
        assert_eq!(world.component_mask(entity), Some(original));
        assert_eq!(world.get::<Position>(entity), Some(&Position { x: 1.0, y: 2.0 }));
    }

    #[test]
    fn structural_edges_are_reused() {
        // Given
        let mut world = world();

        // When - the same transition runs many times
        for _ in 0..10 {
            let entity = world.spawn(Position { x: 0.0, y: 0.0 });
            world.add(entity, Velocity { dx: 0.0, dy: 0.0 });
            world.remove::<Velocity>(entity);
        }

        // Then - only the two tables ever exist
        assert_eq!(world.table_count(), 2);
    }

    #[test]
    fn component_mask_and_has_components() {
        // Given
        let mut world = world();
        let entity = world.spawn((Position { x: 0.0, y: 0.0 }, Health { hp: 10 }));
        let position_and_health = world.mask_of::<(Position, Health)>();
        let with_velocity = world.mask_of::<(Position, Velocity)>();

        // Then
        assert_eq!(world.component_mask(entity), Some(position_and_health));
        assert!(world.has_components(entity, position_and_health));
        assert!(world.has_components(entity, world.mask_of::<Position>()));
        assert!(!world.has_components(entity, with_velocity));
        assert!(world.has_components(entity, Mask::EMPTY));
    }

    #[test]
    fn queries_count_first_entities() {
        // Given - {P}, {P,V}, {P,V,H}
        let mut world = world();
        let plain = world.spawn(Position { x: 1.0, y: 0.0 });
        let moving = world.spawn((Position { x: 2.0, y: 0.0 }, Velocity { dx: 1.0, dy: 0.0 }));
        let mortal = world.spawn((
            Position { x: 3.0, y: 0.0 },
            Velocity { dx: 1.0, dy: 0.0 },
            Health { hp: 5 },
        ));

        let position = world.mask_of::<Position>();
        let velocity = world.mask_of::<Velocity>();
        let health = world.mask_of::<Health>();

        // Then
        assert_eq!(world.count(position, Mask::EMPTY), 3);
        assert_eq!(world.count(position, velocity), 1);
        assert_eq!(world.count(position, health), 2);
        assert_eq!(world.first(position, Mask::EMPTY), Some(plain));
        assert_eq!(world.first(velocity, health), Some(moving));

        let all = world.entities(position, Mask::EMPTY);
        assert_eq!(all.len(), 3);
        assert!(all.contains(&plain) && all.contains(&moving) && all.contains(&mortal));
    }

    #[test]
    fn table_walks_see_columns() {
        // Given
        let mut world = world();
        for i in 0..4 {
            world.spawn((Position { x: i as f32, y: 0.0 }, Velocity { dx: 1.0, dy: 0.0 }));
        }
        let moving = world.mask_of::<(Position, Velocity)>();

        // When - integrate velocity into position through mutable columns
        world.for_each_table_mut(moving, Mask::EMPTY, |table| {
            let velocities: Vec<Velocity> = table.column::<Velocity>().unwrap().to_vec();
            let positions = table.column_mut::<Position>().unwrap();
            for (position, velocity) in positions.iter_mut().zip(velocities) {
                position.x += velocity.dx;
            }
        });

        // Then
        let mut total = 0.0;
        world.for_each_row(moving, Mask::EMPTY, |table, row| {
            total += table.get::<Position>(row).unwrap().x;
        });
        assert_eq!(total, (1.0 + 2.0 + 3.0 + 4.0));
    }

    #[test]
    fn batch_spawn_initialises_every_row() {
        // Given
        let mut world = world();

        // When
        let entities = world.spawn_batch(1000, Position { x: 0.5, y: 0.5 });

        // Then
        assert_eq!(entities.len(), 1000);
        assert_eq!(world.entity_count(), 1000);
        for entity in &entities {
            assert_eq!(world.get::<Position>(*entity), Some(&Position { x: 0.5, y: 0.5 }));
        }
    }

    #[test]
    fn spawn_with_mask_zero_fills() {
        // Given
        let mut world = world();
        let mask = world.mask_of::<(Position, Health)>();

        // When
        let entities = world.spawn_with_mask(mask, 3);

        // Then - all component bytes read as zero
        assert_eq!(entities.len(), 3);
        for entity in &entities {
            assert_eq!(world.get::<Position>(*entity), Some(&Position { x: 0.0, y: 0.0 }));
            assert_eq!(world.get::<Health>(*entity), Some(&Health { hp: 0 }));
        }
    }

    #[test]
    fn spawn_batch_with_init_writes_values() {
        // Given
        let mut world = world();
        let mask = world.mask_of::<Health>();

        // When - number the rows through the init callback
        let mut next = 0;
        let entities = world.spawn_batch_with_init(mask, 4, |table, row| {
            table.write_value(row, Health { hp: next });
            next += 1;
        });

        // Then
        let values: Vec<i32> = entities
            .iter()
            .map(|entity| world.get::<Health>(*entity).unwrap().hp)
            .collect();
        assert_eq!(values, vec![0, 1, 2, 3]);
    }

    #[test]
    fn deferred_despawns_apply_at_the_sync_point() {
        // Given
        let mut world = world();
        let first = world.spawn(Position { x: 1.0, y: 0.0 });
        let second = world.spawn(Position { x: 2.0, y: 0.0 });

        // When - queue one entity twice and apply
        world.queue_despawn(first);
        world.queue_despawn(first);
        let applied = world.apply_despawns();

        // Then - the duplicate was skipped by the generational check
        assert_eq!(applied, 1);
        assert!(!world.is_live(first));
        assert!(world.is_live(second));

        // Then - the queue is empty afterwards
        assert_eq!(world.apply_despawns(), 0);
    }

    #[test]
    fn events_flow_through_the_world() {
        // Given
        #[derive(crate::Event, Debug, PartialEq)]
        struct EnemyDied {
            id: u32,
            reward: u32,
        }

        let mut world = World::builder()
            .register::<Health>()
            .event::<EnemyDied>("enemy_died")
            .build();

        // When
        assert!(world.send("enemy_died", EnemyDied { id: 4, reward: 10 }));

        // Then
        let slice = world.events::<EnemyDied>("enemy_died").unwrap();
        assert_eq!(slice, &[EnemyDied { id: 4, reward: 10 }]);
        assert_eq!(world.event_count("enemy_died"), 1);

        // When
        assert!(world.clear_events("enemy_died"));

        // Then
        assert_eq!(world.event_count("enemy_died"), 0);
    }

    #[test]
    fn unchecked_get_reads_the_live_value() {
        // Given
        let mut world = world();
        let entity = world.spawn(Health { hp: 77 });

        // When
        let value = unsafe { world.get_unchecked::<Health>(entity) };

        // Then
        assert_eq!(value, &Health { hp: 77 });
    }

    #[test]
    fn column_views_through_queries() {
        // Given
        let mut world = world();
        world.spawn_batch(3, Health { hp: 9 });
        let health_mask = world.mask_of::<Health>();
        let health_bit = world.component_bit::<Health>().unwrap();

        // When / Then - checked, with-bit and unchecked views agree
        world.for_each_table(health_mask, Mask::EMPTY, |table| {
            let checked = table.column::<Health>().unwrap();
            let with_bit = table.column_with_bit::<Health>(health_bit).unwrap();
            let unchecked = unsafe { table.column_unchecked::<Health>(health_bit) };
            assert_eq!(checked.len(), 3);
            assert_eq!(checked, with_bit);
            assert_eq!(checked, unchecked);
        });
    }

    #[test]
    fn resources_are_stored_inline() {
        // Given
        struct Settings {
            gravity: f32,
        }

        let mut world = World::builder()
            .register::<Position>()
            .resources(Settings { gravity: -9.8 })
            .build();

        // When
        world.resources.gravity = -3.7;

        // Then
        assert_eq!(world.resources.gravity, -3.7);
    }
}
