//! Raw memory backing for component columns.
//!
//! [`ByteBlock`] owns one contiguous allocation of uniform-sized elements
//! described by a [`Layout`]. It knows nothing about the element type beyond
//! its size and alignment; the [`Column`](super::column::Column) layer above
//! tracks initialisation and enforces type identity.
//!
//! The allocation always carries the element's natural alignment, which is
//! what lets a column be viewed as a typed slice later. Zero-sized elements
//! never allocate; only the capacity counter moves.

use std::{
    alloc::{self, Layout},
    cmp,
    ptr::NonNull,
};

/// How a block grows when capacity is exceeded.
#[derive(Debug, Clone, Copy)]
pub enum GrowthStrategy {
    /// Grow geometrically by the given factor. Fewer reallocations at the
    /// cost of slack space; the usual choice for append-heavy columns.
    Multiply(usize),
    /// Grow to exactly the requested capacity.
    Exact,
}

impl GrowthStrategy {
    /// The capacity to grow to, given the current capacity and the request.
    fn target(&self, current: usize, requested: usize) -> usize {
        match self {
            Self::Multiply(factor) => cmp::max(current * factor, requested),
            Self::Exact => requested,
        }
    }
}

/// A contiguous block of uniform-layout elements with no type information.
///
/// # Safety contract
/// The block does not track initialisation. Callers must only read indices
/// they have written, and must keep index arithmetic within `capacity()`.
pub struct ByteBlock {
    /// Base pointer. Dangling (but aligned) while capacity is zero or the
    /// element is zero-sized.
    ptr: NonNull<u8>,

    /// Capacity in elements.
    capacity: usize,

    /// Layout of one element.
    element: Layout,

    /// Growth strategy applied by `ensure_capacity`.
    growth: GrowthStrategy,
}

impl ByteBlock {
    /// Construct an empty block for elements of the given layout.
    pub fn new(element: Layout, growth: GrowthStrategy) -> Self {
        // An aligned dangling pointer, so empty blocks can still be viewed
        // as zero-length slices.
        let ptr = NonNull::new(element.align().max(1) as *mut u8)
            .expect("alignment is never zero");
        Self {
            ptr,
            capacity: 0,
            element,
            growth,
        }
    }

    /// Capacity in elements.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Layout of one element.
    #[inline]
    pub const fn element(&self) -> Layout {
        self.element
    }

    /// Base pointer of the block.
    #[inline]
    pub fn base(&self) -> NonNull<u8> {
        self.ptr
    }

    /// Pointer to the element at `index`.
    ///
    /// # Panics
    /// Panics in debug builds if `index >= capacity()`.
    #[inline]
    pub fn ptr_at(&self, index: usize) -> NonNull<u8> {
        debug_assert!(
            index < self.capacity,
            "index {} out of bounds (capacity {})",
            index,
            self.capacity
        );
        // SAFETY: index is within the allocation (debug-checked above; the
        // caller guarantees it in release builds).
        unsafe { NonNull::new_unchecked(self.ptr.as_ptr().add(index * self.element.size())) }
    }

    /// Mutable pointer to the element at `index`.
    ///
    /// # Panics
    /// Panics in debug builds if `index >= capacity()`.
    #[inline]
    pub fn ptr_at_mut(&mut self, index: usize) -> NonNull<u8> {
        debug_assert!(
            index < self.capacity,
            "index {} out of bounds (capacity {})",
            index,
            self.capacity
        );
        // SAFETY: as in `ptr_at`.
        unsafe { NonNull::new_unchecked(self.ptr.as_ptr().add(index * self.element.size())) }
    }

    /// Grow the block so it can hold at least `needed` elements. No-op when
    /// the capacity already suffices.
    pub fn ensure_capacity(&mut self, needed: usize) {
        if needed <= self.capacity {
            return;
        }
        let target = self.growth.target(self.capacity, needed);
        self.grow_to(target);
    }

    /// Grow to exactly `capacity` elements. Zero-sized elements just move the
    /// capacity counter; no allocation takes place.
    fn grow_to(&mut self, capacity: usize) {
        if self.element.size() == 0 {
            self.capacity = capacity;
            return;
        }

        let new_layout = self.layout_for(capacity);
        let new_ptr = if self.capacity == 0 {
            // SAFETY: new_layout has non-zero size (capacity > 0, element > 0).
            unsafe { alloc::alloc(new_layout) }
        } else {
            let old_layout = self.layout_for(self.capacity);
            // SAFETY: ptr was allocated with old_layout; new size fits the
            // same alignment.
            unsafe { alloc::realloc(self.ptr.as_ptr(), old_layout, new_layout.size()) }
        };

        let Some(new_ptr) = NonNull::new(new_ptr) else {
            alloc::handle_alloc_error(new_layout);
        };

        self.ptr = new_ptr;
        self.capacity = capacity;
    }

    fn layout_for(&self, capacity: usize) -> Layout {
        Layout::from_size_align(capacity * self.element.size(), self.element.align())
            .expect("column layout overflow")
    }
}

impl Drop for ByteBlock {
    fn drop(&mut self) {
        if self.capacity > 0 && self.element.size() > 0 {
            let layout = self.layout_for(self.capacity);
            // SAFETY: ptr was allocated with exactly this layout.
            unsafe {
                alloc::dealloc(self.ptr.as_ptr(), layout);
            }
        }
    }
}

// SAFETY: the block owns its allocation and exposes no interior mutability.
// Element types stored here are constrained to Pod (Send + Sync) above.
unsafe impl Send for ByteBlock {}
unsafe impl Sync for ByteBlock {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_block_is_empty() {
        let block = ByteBlock::new(Layout::new::<u32>(), GrowthStrategy::Exact);
        assert_eq!(block.capacity(), 0);
    }

    #[test]
    fn ensure_capacity_grows_exactly() {
        // Given
        let mut block = ByteBlock::new(Layout::new::<u32>(), GrowthStrategy::Exact);

        // When
        block.ensure_capacity(5);

        // Then
        assert_eq!(block.capacity(), 5);

        // When - already enough
        block.ensure_capacity(3);

        // Then - unchanged
        assert_eq!(block.capacity(), 5);
    }

    #[test]
    fn multiply_growth_doubles() {
        // Given
        let mut block = ByteBlock::new(Layout::new::<u32>(), GrowthStrategy::Multiply(2));
        block.ensure_capacity(4);
        assert_eq!(block.capacity(), 4);

        // When - one more element than the capacity
        block.ensure_capacity(5);

        // Then - doubled rather than grown to 5
        assert_eq!(block.capacity(), 8);
    }

    #[test]
    fn realloc_preserves_contents() {
        // Given
        let mut block = ByteBlock::new(Layout::new::<u64>(), GrowthStrategy::Exact);
        block.ensure_capacity(2);
        unsafe {
            (block.ptr_at_mut(0).as_ptr() as *mut u64).write(42);
            (block.ptr_at_mut(1).as_ptr() as *mut u64).write(99);
        }

        // When
        block.ensure_capacity(64);

        // Then
        unsafe {
            assert_eq!((block.ptr_at(0).as_ptr() as *const u64).read(), 42);
            assert_eq!((block.ptr_at(1).as_ptr() as *const u64).read(), 99);
        }
    }

    #[test]
    fn base_pointer_is_aligned() {
        let block = ByteBlock::new(Layout::new::<u64>(), GrowthStrategy::Exact);
        assert_eq!(block.base().as_ptr() as usize % std::mem::align_of::<u64>(), 0);
    }

    #[test]
    fn zero_sized_elements_never_allocate() {
        // Given
        struct Marker;
        let mut block = ByteBlock::new(Layout::new::<Marker>(), GrowthStrategy::Multiply(2));

        // When
        block.ensure_capacity(1000);

        // Then - capacity moves, base stays dangling
        assert_eq!(block.capacity(), 1000);
        assert_eq!(block.ptr_at(0).as_ptr(), block.ptr_at(999).as_ptr());
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    #[cfg(debug_assertions)]
    fn ptr_at_bounds_checked_in_debug() {
        let block = ByteBlock::new(Layout::new::<u32>(), GrowthStrategy::Exact);
        let _ = block.ptr_at(0);
    }
}
