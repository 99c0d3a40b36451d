use crate::{
    all_tuples,
    component::{Component, Mask, Registry},
    storage::{Row, Table},
};

/// A set of component values that can be written into a table row together:
/// a single component, a tuple of components, or nested tuples of either.
///
/// The bundle also knows its component [`Mask`], which is what selects (or
/// creates) the archetype table an entity spawns into.
pub trait Bundle: 'static {
    /// The mask covering every component in this bundle.
    ///
    /// # Panics
    /// Panics if a component type in the bundle was never registered.
    fn component_mask(registry: &Registry) -> Mask;

    /// Write the component values into the given row. Takes ownership.
    fn apply(self, table: &mut Table, row: Row);
}

impl<C: Component> Bundle for C {
    fn component_mask(registry: &Registry) -> Mask {
        let info = registry.info_of::<C>().unwrap_or_else(|| {
            panic!(
                "component type not registered: {}",
                std::any::type_name::<C>()
            )
        });
        Mask::from_bits(info.bit())
    }

    fn apply(self, table: &mut Table, row: Row) {
        table.write_value(row, self);
    }
}

impl Bundle for () {
    fn component_mask(_registry: &Registry) -> Mask {
        Mask::EMPTY
    }

    fn apply(self, _table: &mut Table, _row: Row) {}
}

macro_rules! tuple_bundle {
    ($($name:ident),*) => {
        impl<$($name: Bundle),*> Bundle for ($($name,)*) {
            fn component_mask(registry: &Registry) -> Mask {
                let mut mask = Mask::EMPTY;
                $(mask = mask.union(<$name>::component_mask(registry));)*
                mask
            }

            fn apply(self, table: &mut Table, row: Row) {
                #[allow(non_snake_case)]
                let ($($name,)*) = self;
                $(<$name as Bundle>::apply($name, table, row);)*
            }
        }
    };
}

// Bundles of tuples for all arities the tuple macro covers.
all_tuples!(tuple_bundle);

#[cfg(test)]
mod tests {
    use bytemuck::{Pod, Zeroable};

    use crate::storage::table;

    use super::*;

    #[derive(crate::Component, Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
    #[repr(C)]
    struct First {
        value: u32,
    }

    #[derive(crate::Component, Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
    #[repr(C)]
    struct Second {
        value: u32,
    }

    #[test]
    fn single_component_mask_and_apply() {
        // Given
        let registry = Registry::new();
        registry.register::<First>();

        // Then
        assert_eq!(First::component_mask(&registry).bits(), 0b1);

        // When
        let mut table = Table::new(table::Id::new(0), &[registry.info_of::<First>().unwrap()]);
        let row = table.push_row(crate::entity::Entity::NIL);
        First { value: 42 }.apply(&mut table, row);

        // Then
        assert_eq!(table.get::<First>(row), Some(&First { value: 42 }));
    }

    #[test]
    fn tuple_mask_unions_members() {
        // Given
        let registry = Registry::new();
        registry.register::<First>();
        registry.register::<Second>();

        // Then - flat and nested tuples produce the same mask
        assert_eq!(<(First, Second)>::component_mask(&registry).bits(), 0b11);
        assert_eq!(<(First, (Second,))>::component_mask(&registry).bits(), 0b11);
        assert_eq!(<()>::component_mask(&registry), Mask::EMPTY);
    }

    #[test]
    fn tuple_apply_writes_every_member() {
        // Given
        let registry = Registry::new();
        registry.register::<First>();
        registry.register::<Second>();

        let mut table = Table::new(
            table::Id::new(0),
            &[
                registry.info_of::<First>().unwrap(),
                registry.info_of::<Second>().unwrap(),
            ],
        );

        // When
        let row = table.push_row(crate::entity::Entity::NIL);
        (First { value: 1 }, Second { value: 2 }).apply(&mut table, row);

        // Then
        assert_eq!(table.get::<First>(row), Some(&First { value: 1 }));
        assert_eq!(table.get::<Second>(row), Some(&Second { value: 2 }));
    }

    #[test]
    #[should_panic(expected = "component type not registered")]
    fn unregistered_component_panics() {
        let registry = Registry::new();
        let _ = First::component_mask(&registry);
    }
}
