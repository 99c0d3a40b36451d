/// The ordinal position of an entity within its archetype table. Index `r`
/// addresses the same entity in every column of the table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Row(usize);

impl Row {
    /// Create a row from a raw index.
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the index of this row.
    #[inline]
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for Row {
    #[inline]
    fn from(value: usize) -> Self {
        Self(value)
    }
}
