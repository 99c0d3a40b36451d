use std::{
    any::TypeId,
    sync::RwLock,
    sync::atomic::{AtomicU32, Ordering},
};

use dashmap::DashMap;

use crate::component::{Component, Id, Info, MAX_COMPONENTS, Mask};

/// A thread-safe component registry mapping component types to their indices
/// and metadata.
///
/// Lookups on the hot path (`TypeId` → [`Id`]) are lock-free reads through a
/// sharded concurrent map. Registration takes a brief write lock on the info
/// table and only happens while the world is being built.
///
/// The registry holds at most [`MAX_COMPONENTS`] types; the component mask is
/// a single `u64` and every registered type owns one bit of it.
pub struct Registry {
    /// Map from TypeId to component Id. Lock-free reads.
    type_map: DashMap<TypeId, Id>,

    /// Registered component info, indexed by component id.
    components: RwLock<Vec<Option<Info>>>,

    /// Next available component index.
    next_id: AtomicU32,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create a new empty component registry.
    #[inline]
    pub fn new() -> Self {
        Self {
            type_map: DashMap::new(),
            components: RwLock::new(Vec::new()),
            next_id: AtomicU32::new(0),
        }
    }

    /// Register a component type and get its identifier.
    ///
    /// Registration is idempotent: registering the same type again returns
    /// the existing id.
    ///
    /// # Panics
    /// Panics if more than [`MAX_COMPONENTS`] distinct types are registered.
    pub fn register<C: Component>(&self) -> Id {
        let type_id = TypeId::of::<C>();

        // Fast path: already registered (lock-free read).
        if let Some(id) = self.type_map.get(&type_id) {
            return *id;
        }

        // Slow path: the entry API resolves the race where two threads both
        // miss the fast path for the same type.
        *self
            .type_map
            .entry(type_id)
            .or_insert_with(|| {
                let index = self.next_id.fetch_add(1, Ordering::Relaxed);
                assert!(
                    (index as usize) < MAX_COMPONENTS,
                    "component capacity ({}) exceeded registering {}",
                    MAX_COMPONENTS,
                    std::any::type_name::<C>()
                );
                let id = Id::new(index);

                let mut components = self.components.write().unwrap();
                let slot = index as usize;
                if slot >= components.len() {
                    components.resize(slot + 1, None);
                }
                components[slot] = Some(Info::new::<C>(id));

                id
            })
            .value()
    }

    /// Get the id for component type `C`, if registered.
    #[inline]
    pub fn get<C: Component>(&self) -> Option<Id> {
        self.type_map
            .get(&TypeId::of::<C>())
            .map(|entry| *entry.value())
    }

    /// Get the index for component type `C`, if registered.
    #[inline]
    pub fn index_of<C: Component>(&self) -> Option<usize> {
        self.get::<C>().map(|id| id.index())
    }

    /// Get the single-bit mask value for component type `C`, if registered.
    #[inline]
    pub fn bit_of<C: Component>(&self) -> Option<u64> {
        self.get::<C>().map(|id| id.bit())
    }

    /// Get the info for component type `C`, if registered.
    #[inline]
    pub fn info_of<C: Component>(&self) -> Option<Info> {
        let id = self.get::<C>()?;
        self.info_by_id(id)
    }

    /// Get component info by id.
    #[inline]
    pub fn info_by_id(&self, id: Id) -> Option<Info> {
        let components = self.components.read().unwrap();
        components.get(id.index()).and_then(|info| *info)
    }

    /// Get component info by index in `[0, MAX_COMPONENTS)`.
    #[inline]
    pub fn info_by_index(&self, index: usize) -> Option<Info> {
        if index >= MAX_COMPONENTS {
            return None;
        }
        self.info_by_id(Id::new(index as u32))
    }

    /// Get component info for a single-bit mask value.
    #[inline]
    pub fn info_by_bit(&self, bit: u64) -> Option<Info> {
        debug_assert!(bit.is_power_of_two(), "bit must have exactly one set bit");
        self.info_by_index(bit.trailing_zeros() as usize)
    }

    /// Get the mask covering every registered component.
    pub fn full_mask(&self) -> Mask {
        let count = self.len() as u32;
        if count == 0 {
            Mask::EMPTY
        } else if count as usize >= MAX_COMPONENTS {
            Mask::from_bits(u64::MAX)
        } else {
            Mask::from_bits((1u64 << count) - 1)
        }
    }

    /// The number of registered component types.
    #[inline]
    pub fn len(&self) -> usize {
        self.next_id.load(Ordering::Relaxed) as usize
    }

    /// Whether no component types are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use bytemuck::{Pod, Zeroable};

    use super::*;

    #[derive(crate::Component, Clone, Copy, Pod, Zeroable)]
    #[repr(C)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(crate::Component, Clone, Copy, Pod, Zeroable)]
    #[repr(C)]
    struct Velocity {
        dx: f32,
        dy: f32,
    }

    #[derive(crate::Component, Clone, Copy, Pod, Zeroable)]
    #[repr(C)]
    struct Health {
        hp: i32,
    }

    #[test]
    fn registration_assigns_sequential_indices() {
        // Given
        let registry = Registry::new();

        // When
        let pos = registry.register::<Position>();
        let vel = registry.register::<Velocity>();

        // Then
        assert_eq!(pos.index(), 0);
        assert_eq!(vel.index(), 1);
        assert_eq!(pos.bit(), 1);
        assert_eq!(vel.bit(), 2);
        assert_eq!(registry.len(), 2);

        // Then - registering again returns the same id
        assert_eq!(registry.register::<Position>(), pos);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn lookup_of_unregistered_type_is_none() {
        // Given
        let registry = Registry::new();
        registry.register::<Position>();

        // Then
        assert!(registry.get::<Velocity>().is_none());
        assert!(registry.info_of::<Velocity>().is_none());
        assert!(registry.bit_of::<Velocity>().is_none());
    }

    #[test]
    fn info_lookup_by_id_and_bit() {
        // Given
        let registry = Registry::new();
        registry.register::<Position>();
        let health = registry.register::<Health>();

        // When
        let by_id = registry.info_by_id(health).unwrap();
        let by_bit = registry.info_by_bit(health.bit()).unwrap();

        // Then
        assert_eq!(by_id.id(), health);
        assert_eq!(by_bit.id(), health);
        assert_eq!(by_id.size(), std::mem::size_of::<Health>());

        // Then - an unassigned index has no info
        assert!(registry.info_by_index(5).is_none());
        assert!(registry.info_by_index(MAX_COMPONENTS).is_none());
    }

    #[test]
    fn full_mask_covers_registered_types() {
        // Given
        let registry = Registry::new();
        assert_eq!(registry.full_mask(), Mask::EMPTY);

        // When
        registry.register::<Position>();
        registry.register::<Velocity>();
        registry.register::<Health>();

        // Then
        assert_eq!(registry.full_mask().bits(), 0b111);
    }

    #[test]
    fn concurrent_registration_agrees_on_ids() {
        // Given
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(Registry::new());

        // When - several threads register the same types concurrently
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    if i % 2 == 0 {
                        registry.register::<Position>()
                    } else {
                        registry.register::<Velocity>()
                    }
                })
            })
            .collect();

        let results: Vec<Id> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        // Then - every thread registering a type saw the same id
        let pos_ids: Vec<_> = results.iter().step_by(2).collect();
        let vel_ids: Vec<_> = results.iter().skip(1).step_by(2).collect();
        assert!(pos_ids.iter().all(|&&id| id == *pos_ids[0]));
        assert!(vel_ids.iter().all(|&&id| id == *vel_ids[0]));
        assert_ne!(pos_ids[0], vel_ids[0]);
        assert_eq!(registry.len(), 2);
    }
}
