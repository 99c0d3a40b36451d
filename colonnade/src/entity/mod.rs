//! Entity identity for the ECS.
//!
//! An [`Entity`] is a lightweight handle pairing an [`Id`] with a
//! [`Generation`]. The id names a slot; the generation counts how many times
//! that slot has been recycled, so stale handles held after a despawn are
//! detected instead of silently aliasing a new entity.
//!
//! The [`Allocator`] hands out handles: freed entities go into a dead pool
//! with their generation already bumped, and are reused before fresh ids are
//! minted. This keeps the id space compact, which matters because the entity
//! directory is a flat vector indexed by id.

/// The generation of an entity slot. Incremented each time the slot is
/// recycled.
///
/// The counter wraps at `u32::MAX`. A slot despawned 2³² times could hand out
/// a handle equal to one retired long ago; within one session this is a
/// theoretical concern only.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u32);

impl Generation {
    /// The first generation of a slot.
    pub const FIRST: Self = Self(0);

    /// Get the next generation, wrapping on overflow.
    #[inline]
    pub fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Get the raw counter value.
    #[inline]
    pub fn value(&self) -> u32 {
        self.0
    }
}

/// An entity slot identifier.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u32);

impl Id {
    /// Get the index of this id in indexable storage.
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for Id {
    #[inline]
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// A handle to an entity. Two handles are equal iff both the id and the
/// generation match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    /// The slot identifier.
    id: Id,

    /// The generation of the slot when this handle was issued.
    generation: Generation,
}

impl Entity {
    /// The nil handle, returned by spawning with an empty component set.
    ///
    /// Note that the nil handle compares equal to the first entity a world
    /// ever issues (id 0, generation 0); callers that spawn empty component
    /// sets should branch on the spawn result rather than compare against
    /// live handles.
    pub const NIL: Self = Self {
        id: Id(0),
        generation: Generation::FIRST,
    };

    /// Construct an entity with the given id and the first generation.
    #[inline]
    pub(crate) fn new(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            generation: Generation::FIRST,
        }
    }

    /// Get the id of this entity.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Get the generation of this entity.
    #[inline]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Get the index of this entity's id in indexable storage.
    #[inline]
    pub fn index(&self) -> usize {
        self.id.index()
    }

    /// Get a handle with the same id and the next generation.
    #[inline]
    pub(crate) fn next_generation(&self) -> Self {
        Self {
            id: self.id,
            generation: self.generation.next(),
        }
    }
}

/// Entities order by id first, then generation.
impl PartialOrd for Entity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id
            .cmp(&other.id)
            .then(self.generation.cmp(&other.generation))
    }
}

/// An allocator for entity handles.
///
/// Freed entities are pooled and reused before new ids are minted. The
/// generation is bumped when an entity enters the pool, so every handle the
/// allocator returns is distinct from every handle previously freed.
#[derive(Default, Debug)]
pub struct Allocator {
    /// Freed entities available for reuse, generation already advanced.
    dead_pool: Vec<Entity>,

    /// The next fresh id to mint.
    next_id: u32,
}

impl Allocator {
    /// Construct a new allocator starting from id 0.
    #[inline]
    pub const fn new() -> Self {
        Self {
            dead_pool: Vec::new(),
            next_id: 0,
        }
    }

    /// Allocate one entity, reusing a pooled slot if available.
    pub fn alloc(&mut self) -> Entity {
        self.dead_pool.pop().unwrap_or_else(|| {
            let id = self.next_id;
            self.next_id += 1;
            Entity::new(id)
        })
    }

    /// Allocate `count` entities at once. Pooled slots are drained first,
    /// then a contiguous run of fresh ids is minted.
    pub fn alloc_many(&mut self, count: usize) -> Vec<Entity> {
        let mut entities = Vec::with_capacity(count);

        let reused = count.min(self.dead_pool.len());
        entities.extend(self.dead_pool.drain(self.dead_pool.len() - reused..));

        let fresh = count - entities.len();
        if fresh > 0 {
            let start = self.next_id;
            self.next_id += fresh as u32;
            entities.extend((start..self.next_id).map(Entity::new));
        }

        entities
    }

    /// Return an entity to the pool for reuse. The pooled handle carries the
    /// next generation, invalidating the freed one.
    pub fn free(&mut self, entity: Entity) {
        self.dead_pool.push(entity.next_generation());
    }

    /// The highest id ever minted plus one. Every issued id is below this.
    #[inline]
    pub fn issued(&self) -> u32 {
        self.next_id
    }
}
