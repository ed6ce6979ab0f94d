use crate::geometry::Solid;

slotmap::new_key_type! {
    /// Unique identifier for a building element in the model store.
    pub struct ElementId;
}

/// Classification of a building element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Wall,
    Slab,
    Door,
    Window,
    Column,
    Beam,
    Unknown,
}

impl ElementKind {
    /// Doors and windows are fenestration: their surfaces attach to a host
    /// surface instead of starting stacks of their own.
    #[must_use]
    pub fn is_fenestration(self) -> bool {
        matches!(self, Self::Door | Self::Window)
    }
}

/// Data associated with a building element.
///
/// Immutable once built, except for lazy promotion inside its solid.
#[derive(Debug)]
pub struct ElementData {
    /// Source identifier, carried through to output boundaries.
    pub name: String,
    pub kind: ElementKind,
    /// Material identifier of the element's (single) material.
    pub material: i64,
    pub solid: Solid,
}
