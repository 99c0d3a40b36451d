//! An archetype-based entity component system.
//!
//! Entities are grouped by their exact component set into column-oriented
//! tables keyed by a 64-bit component mask. The hot path is iteration:
//! queries resolve to a cached list of matching tables, and each table hands
//! out its component columns as contiguous typed slices.
//!
//! The crate is organized in layers, leaves first:
//!
//! - [`component`]: the component trait, the type registry and the mask.
//! - [`entity`]: generational entity handles and their allocator.
//! - [`storage`]: byte-buffer columns, tables and the entity directory.
//! - [`query`]: the `(include, exclude)` mask query cache and walk helpers.
//! - [`event`]: name-keyed FIFO event queues with poll-based consumption.
//! - [`schedule`]: an ordered list of fallible system functions.
//! - [`world`]: the façade composing all of the above.
//!
//! # Example
//!
//! ```ignore
//! use bytemuck::{Pod, Zeroable};
//! use colonnade::{Component, Mask, World};
//!
//! #[repr(C)]
//! #[derive(Component, Clone, Copy, Pod, Zeroable)]
//! struct Position { x: f32, y: f32 }
//!
//! #[repr(C)]
//! #[derive(Component, Clone, Copy, Pod, Zeroable)]
//! struct Velocity { dx: f32, dy: f32 }
//!
//! let mut world = World::builder()
//!     .register::<Position>()
//!     .register::<Velocity>()
//!     .build();
//!
//! let entity = world.spawn((Position { x: 0.0, y: 0.0 }, Velocity { dx: 1.0, dy: 0.0 }));
//!
//! let moving = world.mask_of::<(Position, Velocity)>();
//! world.for_each_table_mut(moving, Mask::EMPTY, |table| {
//!     // columns are plain slices; index `i` is the same entity in both
//! });
//!
//! world.despawn(entity);
//! ```

// Let the derive macros refer to this crate by its external name from within
// the crate's own tests.
extern crate self as colonnade;

pub mod component;
pub mod entity;
pub mod event;
pub mod query;
pub mod schedule;
pub mod storage;
pub mod world;

pub(crate) mod util;

pub use component::{Component, Mask, Registry};
pub use entity::Entity;
pub use event::Event;
pub use schedule::{Schedule, ScheduleError, SystemError, SystemResult};
pub use storage::{Bundle, Row, Table, TableId};
pub use world::{World, WorldBuilder};

pub use colonnade_macros::{Component, Event};
