slotmap::new_key_type! {
    /// Unique identifier for a line in a structural model.
    pub struct LineId;
}

/// Data associated with a line, the one-dimensional entity kind.
///
/// A line runs between corners and bounds one or more surfaces. Which
/// corners bound it, and which surfaces it bounds, is recorded in the
/// model's relationship graph, not here.
#[derive(Debug, Clone)]
pub struct LineData {
    /// Display name, free text, not guaranteed unique.
    pub name: String,
}

impl LineData {
    /// Creates a new line with the given display name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
