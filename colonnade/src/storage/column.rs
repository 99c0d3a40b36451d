//! Type-erased columnar storage for one component type.
//!
//! A [`Column`] is the moral equivalent of a `Vec<C>` whose element type is
//! only known at runtime via [`Info`]. All rows of one archetype table store
//! their `C` values here contiguously, which is what makes query iteration a
//! linear scan.
//!
//! Because components are `Pod`, the column can move rows as raw byte copies
//! (swap-remove, cross-table transfer) and hand out its contents as ordinary
//! typed slices once the caller proves the element type matches.

use std::{alloc::Layout, any::TypeId, ptr, slice};

use crate::{
    component::{Component, Info},
    storage::{
        mem::{ByteBlock, GrowthStrategy},
        row::Row,
    },
};

/// A contiguous, type-erased buffer of component values.
///
/// Invariants:
/// - `len <= data.capacity()`
/// - every element in `[0, len)` holds a valid value of the column's type
///   (zero-filled rows count: the element type is `Pod`)
pub struct Column {
    /// The raw element buffer.
    data: ByteBlock,

    /// Number of initialised elements.
    len: usize,

    /// Metadata of the element type (index, bit, layout).
    info: Info,
}

impl Column {
    /// Create an empty column for the component described by `info`.
    #[inline]
    pub fn new(info: Info) -> Self {
        Self {
            data: ByteBlock::new(info.layout(), GrowthStrategy::Multiply(2)),
            len: 0,
            info,
        }
    }

    /// Get the element type metadata.
    #[inline]
    pub fn info(&self) -> &Info {
        &self.info
    }

    /// Get the single-bit mask value of the element type.
    #[inline]
    pub fn bit(&self) -> u64 {
        self.info.bit()
    }

    /// Number of elements in the column.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the column holds no elements.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Capacity in elements.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Reserve room for at least `additional` more elements.
    #[inline]
    pub fn reserve(&mut self, additional: usize) {
        self.data.ensure_capacity(self.len + additional);
    }

    /// Overwrite the element at `row` with `value`.
    ///
    /// # Panics
    /// Panics if `C` is not the column's element type or `row` is out of
    /// bounds.
    pub fn write<C: Component>(&mut self, row: Row, value: C) {
        self.ensure_type::<C>();
        assert!(
            row.index() < self.len,
            "row {} out of bounds (len {})",
            row.index(),
            self.len
        );
        // SAFETY: row < len so the pointer is in bounds, and ensure_type
        // proved the element type (and thus alignment) is C.
        unsafe {
            ptr::write(self.data.ptr_at_mut(row.index()).as_ptr() as *mut C, value);
        }
    }

    /// Get a reference to the element at `row`, or `None` when out of bounds.
    ///
    /// # Panics
    /// Panics if `C` is not the column's element type.
    pub fn get<C: Component>(&self, row: Row) -> Option<&C> {
        self.ensure_type::<C>();
        if row.index() >= self.len {
            return None;
        }
        // SAFETY: row < len, type checked above.
        Some(unsafe { &*(self.data.ptr_at(row.index()).as_ptr() as *const C) })
    }

    /// Get a mutable reference to the element at `row`, or `None` when out of
    /// bounds.
    ///
    /// # Panics
    /// Panics if `C` is not the column's element type.
    pub fn get_mut<C: Component>(&mut self, row: Row) -> Option<&mut C> {
        self.ensure_type::<C>();
        if row.index() >= self.len {
            return None;
        }
        // SAFETY: row < len, type checked above.
        Some(unsafe { &mut *(self.data.ptr_at_mut(row.index()).as_ptr() as *mut C) })
    }

    /// View the column as a typed slice of all elements. The cast from the
    /// underlying bytes goes through `bytemuck`, which re-checks size and
    /// alignment.
    ///
    /// # Panics
    /// Panics if `C` is not the column's element type.
    pub fn as_slice<C: Component>(&self) -> &[C] {
        self.ensure_type::<C>();
        if self.info.is_zero_sized() {
            // A zero-sized element leaves no bytes to cast; only the logical
            // length exists.
            // SAFETY: the base pointer is aligned for C and never read.
            return unsafe {
                slice::from_raw_parts(self.data.base().as_ptr() as *const C, self.len)
            };
        }
        // SAFETY: every element in [0, len) is initialised, so the bytes
        // backing them are too.
        let bytes = unsafe {
            slice::from_raw_parts(self.data.base().as_ptr(), self.len * self.info.size())
        };
        bytemuck::cast_slice(bytes)
    }

    /// View the column as a mutable typed slice of all elements. The cast
    /// from the underlying bytes goes through `bytemuck`, which re-checks
    /// size and alignment.
    ///
    /// # Panics
    /// Panics if `C` is not the column's element type.
    pub fn as_mut_slice<C: Component>(&mut self) -> &mut [C] {
        self.ensure_type::<C>();
        if self.info.is_zero_sized() {
            // SAFETY: as in `as_slice`, plus exclusive access through
            // &mut self.
            return unsafe {
                slice::from_raw_parts_mut(self.data.base().as_ptr() as *mut C, self.len)
            };
        }
        // SAFETY: as in `as_slice`, plus exclusive access through &mut self.
        let bytes = unsafe {
            slice::from_raw_parts_mut(self.data.base().as_ptr(), self.len * self.info.size())
        };
        bytemuck::cast_slice_mut(bytes)
    }

    /// View the column as a typed slice without checking the element type.
    ///
    /// # Safety
    /// `C` must be the column's element type.
    pub unsafe fn as_slice_unchecked<C: Component>(&self) -> &[C] {
        debug_assert_eq!(TypeId::of::<C>(), self.info.type_id());
        // SAFETY: caller guarantees the element type; initialisation and
        // alignment hold as in `as_slice`.
        unsafe { slice::from_raw_parts(self.data.base().as_ptr() as *const C, self.len) }
    }

    /// View the column as a mutable typed slice without checking the element
    /// type.
    ///
    /// # Safety
    /// `C` must be the column's element type.
    pub unsafe fn as_mut_slice_unchecked<C: Component>(&mut self) -> &mut [C] {
        debug_assert_eq!(TypeId::of::<C>(), self.info.type_id());
        // SAFETY: as in `as_slice_unchecked`, plus exclusive access.
        unsafe { slice::from_raw_parts_mut(self.data.base().as_ptr() as *mut C, self.len) }
    }

    /// Append `additional` zero-filled elements. All-zero bytes are a valid
    /// value for every `Pod` component.
    pub(crate) fn push_zeroed(&mut self, additional: usize) {
        if additional == 0 {
            return;
        }
        self.data.ensure_capacity(self.len + additional);
        let size = self.info.size();
        if size > 0 {
            // SAFETY: capacity covers [len, len + additional).
            unsafe {
                ptr::write_bytes(
                    self.data.ptr_at_mut(self.len).as_ptr(),
                    0,
                    additional * size,
                );
            }
        }
        self.len += additional;
    }

    /// Append a copy of `src`'s element at `src_row`. Both columns must store
    /// the same component type.
    pub(crate) fn push_from(&mut self, src: &Column, src_row: Row) {
        debug_assert_eq!(
            self.info.id(),
            src.info.id(),
            "cross-column copy between different component types"
        );
        debug_assert!(src_row.index() < src.len, "source row out of bounds");

        self.data.ensure_capacity(self.len + 1);
        let size = self.info.size();
        if size > 0 {
            // SAFETY: source row is initialised, destination slot is within
            // capacity, and both sides share one element layout.
            unsafe {
                ptr::copy_nonoverlapping(
                    src.data.ptr_at(src_row.index()).as_ptr(),
                    self.data.ptr_at_mut(self.len).as_ptr(),
                    size,
                );
            }
        }
        self.len += 1;
    }

    /// Remove the element at `row` by moving the last element into its slot,
    /// then shrinking by one. Does not reorder any other element.
    pub(crate) fn swap_remove(&mut self, row: Row) {
        debug_assert!(row.index() < self.len, "row index out of bounds");

        let last = self.len - 1;
        let size = self.info.size();
        if row.index() != last && size > 0 {
            let src = self.data.ptr_at(last).as_ptr();
            let dst = self.data.ptr_at_mut(row.index()).as_ptr();
            // SAFETY: row != last, so the regions cannot overlap; both are in
            // bounds. Elements are Pod, so the vacated copy needs no drop.
            unsafe {
                ptr::copy_nonoverlapping(src, dst, size);
            }
        }
        self.len = last;
    }

    /// Assert that `C` matches this column's element type and layout.
    ///
    /// # Panics
    /// Panics on mismatch, in debug and release builds alike.
    #[inline]
    pub fn ensure_type<C: Component>(&self) {
        assert!(
            TypeId::of::<C>() == self.info.type_id(),
            "type mismatch: attempted to use {} with a column storing {:?}",
            std::any::type_name::<C>(),
            self.info
        );
        assert!(
            Layout::new::<C>() == self.info.layout(),
            "layout mismatch: component layout does not match column layout"
        );
    }
}
