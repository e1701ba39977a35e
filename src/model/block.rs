slotmap::new_key_type! {
    /// Unique identifier for a block in a structural model.
    pub struct BlockId;
}

/// Data associated with a block, the three-dimensional entity kind.
///
/// A block is a region of space enclosed by a closed set of surfaces;
/// the enclosing surfaces are recorded in the relationship graph.
#[derive(Debug, Clone)]
pub struct BlockData {
    /// Display name, free text, not guaranteed unique.
    pub name: String,
}

impl BlockData {
    /// Creates a new block with the given display name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
