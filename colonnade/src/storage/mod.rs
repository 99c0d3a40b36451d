//! Column-oriented archetype storage.
//!
//! The storage layer is built in layers, each one a thin safe(r) wrapper over
//! the one below:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │ Storage   - all tables, mask → table map, edge wiring  │
//! ├────────────────────────────────────────────────────────┤
//! │ Table     - entities + one column per component bit    │
//! ├────────────────────────────────────────────────────────┤
//! │ Column    - type-erased buffer of one component type   │
//! ├────────────────────────────────────────────────────────┤
//! │ ByteBlock - raw aligned allocation, no type knowledge  │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! Entities with the exact same component mask share one [`Table`]. Adding
//! or removing a component moves the entity's row to the neighbouring table;
//! the transition is memoised in per-table edge arrays after the first time
//! it is taken. The [`Directory`] (entity id → table/row/generation) lives
//! beside the tables and is kept in sync by the world façade.

use std::collections::HashMap;

pub use column::Column;
pub use location::{Directory, Location};
pub use row::Row;
pub use table::Table;
pub use value::Bundle;

pub(crate) mod column;
pub(crate) mod location;
pub(crate) mod mem;
pub(crate) mod row;
pub mod table;
pub(crate) mod value;

use crate::{
    component::{Info, Mask, Registry},
    query::QueryCache,
};

/// The identifier for an archetype table in storage.
pub type TableId = table::Id;

/// The collection of archetype tables, keyed by component mask.
#[derive(Default)]
pub struct Storage {
    /// Every table ever created, in creation order. Queries iterate matches
    /// in this order, which is stable for a given spawn sequence.
    tables: Vec<Table>,

    /// Map from component mask bits to the owning table.
    table_by_mask: HashMap<u64, TableId>,
}

impl Storage {
    /// Create an empty storage.
    #[inline]
    pub fn new() -> Self {
        Self {
            tables: Vec::new(),
            table_by_mask: HashMap::new(),
        }
    }

    /// Get a table by id.
    ///
    /// # Panics
    /// Panics if the id is out of bounds.
    #[inline]
    pub fn table(&self, id: TableId) -> &Table {
        assert!(id.index() < self.tables.len(), "table id out of bounds");
        &self.tables[id.index()]
    }

    /// Get a mutable table by id.
    ///
    /// # Panics
    /// Panics if the id is out of bounds.
    #[inline]
    pub fn table_mut(&mut self, id: TableId) -> &mut Table {
        assert!(id.index() < self.tables.len(), "table id out of bounds");
        &mut self.tables[id.index()]
    }

    /// Get all tables in creation order.
    #[inline]
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Number of tables.
    #[inline]
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Get the table holding exactly this mask, if it exists.
    #[inline]
    pub fn table_for_mask(&self, mask: Mask) -> Option<TableId> {
        self.table_by_mask.get(&mask.bits()).copied()
    }

    /// Get the table for `mask`, creating it if it does not exist yet.
    ///
    /// Creation wires the transition edges between the new table and every
    /// pre-existing table whose mask differs by exactly one component, and
    /// appends the new table to every cached query it satisfies, keeping the
    /// cache exact without rescans.
    ///
    /// # Panics
    /// Panics if `mask` is empty or references an unregistered component.
    pub fn find_or_create(
        &mut self,
        mask: Mask,
        registry: &Registry,
        cache: &mut QueryCache,
    ) -> TableId {
        assert!(!mask.is_empty(), "the empty archetype is never materialised");
        if let Some(id) = self.table_for_mask(mask) {
            return id;
        }

        let infos: Vec<Info> = mask
            .indices()
            .map(|index| {
                registry
                    .info_by_index(index)
                    .unwrap_or_else(|| panic!("mask bit {} has no registered component", index))
            })
            .collect();

        let id = TableId::new(self.tables.len() as u32);
        let mut table = Table::new(id, &infos);

        // Wire edges in both directions for every existing table whose mask
        // differs from the new one by exactly one component.
        for existing in self.tables.iter_mut() {
            let diff = existing.mask().bits() ^ mask.bits();
            if diff.count_ones() != 1 {
                continue;
            }
            let index = diff.trailing_zeros() as usize;
            if mask.has_bit(diff) {
                // existing + component = new
                existing.set_add_edge(index, id);
                table.set_remove_edge(index, existing.id());
            } else {
                // existing - component = new
                existing.set_remove_edge(index, id);
                table.set_add_edge(index, existing.id());
            }
        }

        cache.on_table_created(mask, id);
        self.table_by_mask.insert(mask.bits(), id);
        self.tables.push(table);

        log::debug!(
            "created archetype table {} for mask {:#x} ({} columns)",
            id.index(),
            mask.bits(),
            mask.len()
        );

        id
    }

    /// Get mutable references to two distinct tables at once, for moving a
    /// row between them.
    ///
    /// # Panics
    /// Panics if the ids are equal or out of bounds.
    pub fn pair_mut(&mut self, a: TableId, b: TableId) -> (&mut Table, &mut Table) {
        assert_ne!(a, b, "pair_mut requires two distinct tables");
        assert!(
            a.index() < self.tables.len() && b.index() < self.tables.len(),
            "table id out of bounds"
        );

        if a.index() < b.index() {
            let (head, tail) = self.tables.split_at_mut(b.index());
            (&mut head[a.index()], &mut tail[0])
        } else {
            let (head, tail) = self.tables.split_at_mut(a.index());
            (&mut tail[0], &mut head[b.index()])
        }
    }
}
