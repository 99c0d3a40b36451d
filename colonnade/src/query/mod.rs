//! Query dispatch over archetype tables.
//!
//! A query is a pair of component masks: every table whose mask contains all
//! of `include` and none of `exclude` matches. Match lists are cached per
//! `(include, exclude)` pair and updated incrementally when new tables are
//! born, so the linear scan over all tables happens at most once per distinct
//! query.
//!
//! The cache stores table *indices*, not references; the list stays valid as
//! tables grow and is simply appended to when a new matching archetype
//! appears.

use std::collections::HashMap;
use std::slice;

use crate::{
    component::Mask,
    storage::{Table, TableId},
};

/// A cache key: the full include/exclude mask pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Key {
    include: u64,
    exclude: u64,
}

/// Memoised table lists per `(include, exclude)` mask pair.
#[derive(Default)]
pub struct QueryCache {
    entries: HashMap<Key, Vec<TableId>>,
}

impl QueryCache {
    /// Create an empty cache.
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Get the ids of all tables matching the query, in table-creation
    /// order. A miss scans `tables` once and memoises the result.
    pub fn matching(
        &mut self,
        include: Mask,
        exclude: Mask,
        tables: &[Table],
    ) -> &[TableId] {
        let key = Key {
            include: include.bits(),
            exclude: exclude.bits(),
        };
        self.entries.entry(key).or_insert_with(|| {
            tables
                .iter()
                .filter(|table| Self::matches(table.mask(), include, exclude))
                .map(|table| table.id())
                .collect()
        })
    }

    /// Append a freshly created table to every cached query it satisfies.
    /// Called by storage at table creation, keeping each cached list equal
    /// to what a full rescan would produce.
    pub(crate) fn on_table_created(&mut self, mask: Mask, id: TableId) {
        for (key, list) in self.entries.iter_mut() {
            if Self::matches(mask, Mask::from_bits(key.include), Mask::from_bits(key.exclude)) {
                list.push(id);
            }
        }
    }

    /// The match predicate: all of `include`, none of `exclude`.
    #[inline]
    fn matches(mask: Mask, include: Mask, exclude: Mask) -> bool {
        mask.contains(include) && mask.disjoint(exclude)
    }

    /// Number of distinct queries cached.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no queries are cached.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Iterator over the tables matching a query, yielding `(table, id)` pairs
/// in table-creation order.
pub struct Tables<'w> {
    tables: &'w [Table],
    ids: slice::Iter<'w, TableId>,
}

impl<'w> Tables<'w> {
    pub(crate) fn new(tables: &'w [Table], ids: &'w [TableId]) -> Self {
        Self {
            tables,
            ids: ids.iter(),
        }
    }
}

impl<'w> Iterator for Tables<'w> {
    type Item = (&'w Table, TableId);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.ids.next().map(|&id| (&self.tables[id.index()], id))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

impl<'w> ExactSizeIterator for Tables<'w> {}
