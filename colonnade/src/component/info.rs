use std::alloc::Layout;
use std::any::TypeId;

use crate::component::{Component, Id};

/// Information about a registered component type.
#[derive(Debug, Clone, Copy)]
pub struct Info {
    /// The component's registered index.
    id: Id,

    /// The TypeId of the component.
    type_id: TypeId,

    /// The memory layout of one component value (size and natural alignment).
    layout: Layout,
}

impl Info {
    /// Construct component info for type `C`. The layout is taken from the
    /// type itself, so column storage always honours `C`'s natural alignment.
    pub fn new<C: Component>(id: Id) -> Self {
        Self {
            id,
            type_id: TypeId::of::<C>(),
            layout: Layout::new::<C>(),
        }
    }

    /// Get the component id.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Get the component's index in `[0, MAX_COMPONENTS)`.
    #[inline]
    pub fn index(&self) -> usize {
        self.id.index()
    }

    /// Get the single-bit mask value for this component.
    #[inline]
    pub fn bit(&self) -> u64 {
        self.id.bit()
    }

    /// Get the TypeId of the component type.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Get the memory layout of one component value.
    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Get the size in bytes of one component value.
    #[inline]
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    /// Determine if this component is a zero-sized type.
    #[inline]
    pub fn is_zero_sized(&self) -> bool {
        self.layout.size() == 0
    }
}
