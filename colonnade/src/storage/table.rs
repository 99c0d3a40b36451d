//! Archetype tables: column-major storage for one exact component set.
//!
//! Every entity whose component set equals the table's mask is stored here,
//! one row across all columns:
//!
//! ```text
//! Table mask = Position | Velocity
//!
//! entities:  [e4,  e9,  e1 ]          ← parallel to every column
//! Position:  [p0,  p1,  p2 ]          ← contiguous byte buffer
//! Velocity:  [v0,  v1,  v2 ]          ← contiguous byte buffer
//! ```
//!
//! Row order is insertion order modulo swap-remove, which moves the last row
//! into the vacated slot. `column_by_bit` maps a component's bit index to its
//! column position in O(1); the `add_edges`/`remove_edges` arrays memoise the
//! neighbouring table reached by adding or removing one component, so
//! repeated structural mutations skip the mask lookup entirely.

use std::any::TypeId;

use crate::{
    component::{Component, Info, MAX_COMPONENTS, Mask},
    entity::Entity,
    storage::{Row, column::Column},
};

/// The identifier for an archetype table in storage.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(u32);

impl Id {
    /// Create a new Id with the given unique identifier.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Id(id)
    }

    /// Get the index for this Id.
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Column-major storage for all entities sharing one component mask.
///
/// # Invariants
/// - `entities.len()` equals every column's `len()`.
/// - The set of column bits equals the set bits of `mask`.
/// - `column_by_bit[b]` is the position of the column whose component has
///   bit index `b`, for exactly the bits of `mask`.
pub struct Table {
    /// The unique identifier for this table.
    id: Id,

    /// The component set stored here; one bit per column.
    mask: Mask,

    /// The entities stored in this table, one per row.
    entities: Vec<Entity>,

    /// One column per component, ordered by ascending component index.
    columns: Vec<Column>,

    /// Component bit index → position in `columns`.
    column_by_bit: [Option<u8>; MAX_COMPONENTS],

    /// Memoised target table for adding the component with bit index `b`.
    add_edges: [Option<Id>; MAX_COMPONENTS],

    /// Memoised target table for removing the component with bit index `b`.
    remove_edges: [Option<Id>; MAX_COMPONENTS],
}

impl Table {
    /// Create an empty table with one column per entry in `infos`.
    pub fn new(id: Id, infos: &[Info]) -> Self {
        let mut mask = Mask::EMPTY;
        let mut column_by_bit = [None; MAX_COMPONENTS];
        let mut columns = Vec::with_capacity(infos.len());

        for info in infos {
            debug_assert!(
                !mask.has_bit(info.bit()),
                "duplicate component in table layout"
            );
            column_by_bit[info.index()] = Some(columns.len() as u8);
            mask = mask.with(info.bit());
            columns.push(Column::new(*info));
        }

        Self {
            id,
            mask,
            entities: Vec::new(),
            columns,
            column_by_bit,
            add_edges: [None; MAX_COMPONENTS],
            remove_edges: [None; MAX_COMPONENTS],
        }
    }

    /// Get the unique identifier for this table.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Get the component mask of this table.
    #[inline]
    pub fn mask(&self) -> Mask {
        self.mask
    }

    /// Get the number of entities (rows) in the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the table is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Get the entities stored in this table, in row order.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Get the entity stored at a specific row, if the row exists.
    #[inline]
    pub fn entity(&self, row: Row) -> Option<Entity> {
        self.entities.get(row.index()).copied()
    }

    /// Reserve room in the entity list and every column for `additional`
    /// more rows, so batch spawns grow each buffer at most once.
    pub fn reserve(&mut self, additional: usize) {
        self.entities.reserve(additional);
        for column in self.columns.iter_mut() {
            column.reserve(additional);
        }
    }

    /// Append a zero-filled row for `entity` and return its row index. The
    /// caller writes real component values through [`write_value`] (or leaves
    /// the zeroes standing, which every `Pod` component tolerates).
    ///
    /// [`write_value`]: Table::write_value
    pub(crate) fn push_row(&mut self, entity: Entity) -> Row {
        let row = Row::new(self.entities.len());
        for column in self.columns.iter_mut() {
            column.push_zeroed(1);
        }
        self.entities.push(entity);
        row
    }

    /// Overwrite the component value of type `C` at `row`.
    ///
    /// # Panics
    /// Panics if the table has no column for `C` or `row` is out of bounds.
    pub fn write_value<C: Component>(&mut self, row: Row, value: C) {
        let column = self
            .columns
            .iter_mut()
            .find(|column| column.info().type_id() == TypeId::of::<C>())
            .expect("component not in table");
        column.write(row, value);
    }

    /// Get a reference to the component of type `C` at `row`. Returns `None`
    /// when the table lacks the component or the row does not exist.
    pub fn get<C: Component>(&self, row: Row) -> Option<&C> {
        self.columns
            .iter()
            .find(|column| column.info().type_id() == TypeId::of::<C>())?
            .get(row)
    }

    /// Get a mutable reference to the component of type `C` at `row`.
    /// Returns `None` when the table lacks the component or the row does not
    /// exist.
    pub fn get_mut<C: Component>(&mut self, row: Row) -> Option<&mut C> {
        self.columns
            .iter_mut()
            .find(|column| column.info().type_id() == TypeId::of::<C>())?
            .get_mut(row)
    }

    /// Get the position in `columns` of the component with the given
    /// single-bit mask value, if present.
    #[inline]
    pub fn column_position(&self, bit: u64) -> Option<usize> {
        debug_assert!(bit.is_power_of_two(), "bit must have exactly one set bit");
        self.column_by_bit[bit.trailing_zeros() as usize].map(|position| position as usize)
    }

    /// View the column for component `C` as a typed slice. Returns `None`
    /// when the table lacks the component or holds no rows.
    pub fn column<C: Component>(&self) -> Option<&[C]> {
        if self.entities.is_empty() {
            return None;
        }
        self.columns
            .iter()
            .find(|column| column.info().type_id() == TypeId::of::<C>())
            .map(|column| column.as_slice())
    }

    /// Mutable variant of [`column`](Table::column).
    pub fn column_mut<C: Component>(&mut self) -> Option<&mut [C]> {
        if self.entities.is_empty() {
            return None;
        }
        self.columns
            .iter_mut()
            .find(|column| column.info().type_id() == TypeId::of::<C>())
            .map(|column| column.as_mut_slice())
    }

    /// View the column for the component with the given pre-computed bit as
    /// a typed slice, resolving the column in O(1). Returns `None` when the
    /// table lacks the component or holds no rows.
    pub fn column_with_bit<C: Component>(&self, bit: u64) -> Option<&[C]> {
        if self.entities.is_empty() {
            return None;
        }
        let position = self.column_position(bit)?;
        Some(self.columns[position].as_slice())
    }

    /// Mutable variant of [`column_with_bit`](Table::column_with_bit).
    pub fn column_with_bit_mut<C: Component>(&mut self, bit: u64) -> Option<&mut [C]> {
        if self.entities.is_empty() {
            return None;
        }
        let position = self.column_position(bit)?;
        Some(self.columns[position].as_mut_slice())
    }

    /// View the column for the component with the given bit as a typed slice
    /// with no presence or type checks. The fastest access path.
    ///
    /// # Safety
    /// The table must contain the component with this bit, and `C` must be
    /// that component's type.
    pub unsafe fn column_unchecked<C: Component>(&self, bit: u64) -> &[C] {
        let index = bit.trailing_zeros() as usize;
        debug_assert!(self.column_by_bit[index].is_some(), "component not in table");
        // SAFETY: caller guarantees presence; the debug_assert backs it up.
        let position = unsafe {
            self.column_by_bit
                .get_unchecked(index)
                .unwrap_unchecked() as usize
        };
        // SAFETY: position came from column_by_bit, and the caller guarantees
        // the element type.
        unsafe { self.columns.get_unchecked(position).as_slice_unchecked() }
    }

    /// Mutable variant of [`column_unchecked`](Table::column_unchecked).
    ///
    /// # Safety
    /// As for [`column_unchecked`](Table::column_unchecked).
    pub unsafe fn column_unchecked_mut<C: Component>(&mut self, bit: u64) -> &mut [C] {
        let index = bit.trailing_zeros() as usize;
        debug_assert!(self.column_by_bit[index].is_some(), "component not in table");
        // SAFETY: as in `column_unchecked`.
        let position = unsafe {
            self.column_by_bit
                .get_unchecked(index)
                .unwrap_unchecked() as usize
        };
        // SAFETY: as in `column_unchecked`, plus exclusive access.
        unsafe {
            self.columns
                .get_unchecked_mut(position)
                .as_mut_slice_unchecked()
        }
    }

    /// Get a reference to the component value with the given bit at `row`,
    /// with no validation at all.
    ///
    /// # Safety
    /// The table must contain the component with this bit, `C` must be its
    /// type, and `row` must be a live row of this table.
    pub unsafe fn value_unchecked<C: Component>(&self, bit: u64, row: Row) -> &C {
        // SAFETY: forwarded to the caller's contract.
        unsafe { self.column_unchecked::<C>(bit).get_unchecked(row.index()) }
    }

    /// Remove the row at `row` from every column using swap-remove. Returns
    /// the entity that was moved into the vacated slot, or `None` if the last
    /// row was removed. The caller is responsible for re-pointing the moved
    /// entity in the directory.
    pub(crate) fn swap_remove_row(&mut self, row: Row) -> Option<Entity> {
        debug_assert!(row.index() < self.entities.len(), "row index out of bounds");

        for column in self.columns.iter_mut() {
            column.swap_remove(row);
        }
        self.entities.swap_remove(row.index());

        if row.index() < self.entities.len() {
            Some(self.entities[row.index()])
        } else {
            None
        }
    }

    /// Move the row at `src_row` from `src` into `dst`.
    ///
    /// Every column `dst` shares with `src` receives a byte copy of the
    /// source cell; columns only `dst` has get a zero-filled cell for the
    /// caller to overwrite; columns only `src` has are discarded with the
    /// vacated row. Returns the new row in `dst` and the entity swap-moved
    /// inside `src`, if any.
    pub(crate) fn transfer_row(src: &mut Table, dst: &mut Table, src_row: Row) -> (Row, Option<Entity>) {
        debug_assert!(src_row.index() < src.entities.len(), "row index out of bounds");

        let entity = src.entities[src_row.index()];
        let dst_row = Row::new(dst.entities.len());

        for column in dst.columns.iter_mut() {
            match src.column_position(column.bit()) {
                Some(position) => column.push_from(&src.columns[position], src_row),
                None => column.push_zeroed(1),
            }
        }
        dst.entities.push(entity);

        let moved = src.swap_remove_row(src_row);
        (dst_row, moved)
    }

    /// Get the memoised table reached by adding the component with bit index
    /// `index`, if the transition has been taken before.
    #[inline]
    pub(crate) fn add_edge(&self, index: usize) -> Option<Id> {
        self.add_edges[index]
    }

    /// Memoise the table reached by adding the component with bit index
    /// `index`.
    #[inline]
    pub(crate) fn set_add_edge(&mut self, index: usize, target: Id) {
        self.add_edges[index] = Some(target);
    }

    /// Get the memoised table reached by removing the component with bit
    /// index `index`, if the transition has been taken before.
    #[inline]
    pub(crate) fn remove_edge(&self, index: usize) -> Option<Id> {
        self.remove_edges[index]
    }

    /// Memoise the table reached by removing the component with bit index
    /// `index`.
    #[inline]
    pub(crate) fn set_remove_edge(&mut self, index: usize, target: Id) {
        self.remove_edges[index] = Some(target);
    }

    /// Verify that all columns have the same length as the entity list.
    ///
    /// # Panics
    /// Panics if any column length disagrees with the entity count.
    #[cfg(debug_assertions)]
    pub fn verify_invariants(&self) {
        let expected = self.entities.len();
        for (position, column) in self.columns.iter().enumerate() {
            assert_eq!(
                column.len(),
                expected,
                "column {} length {} does not match entity count {}",
                position,
                column.len(),
                expected
            );
        }
        assert_eq!(self.mask.len(), self.columns.len());
    }
}
