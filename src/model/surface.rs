use super::element::ElementId;
use super::space::SpaceId;
use crate::geometry::OrientedArea;

slotmap::new_key_type! {
    /// Unique identifier for a boundary surface in the model store.
    pub struct SurfaceId;
}

/// Standardized boundary level classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Not yet classified.
    Unassigned,
    /// Simple adjacency or exterior boundary.
    Two,
    /// Adjacency also touching a construction no thicker than its own.
    Three,
    /// Internal boundary within one space.
    Four,
    /// No opposite surface identified.
    Five,
}

impl Level {
    /// The numeric level, if assigned.
    #[must_use]
    pub fn as_number(self) -> Option<u8> {
        match self {
            Self::Unassigned => None,
            Self::Two => Some(2),
            Self::Three => Some(3),
            Self::Four => Some(4),
            Self::Five => Some(5),
        }
    }
}

/// One material layer crossed by a boundary, thickest first in traversal
/// order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialLayer {
    pub material: i64,
    pub thickness: f64,
}

/// A boundary surface.
///
/// All cross-references are plain optional arena ids; none imply ownership.
/// The opposite link is symmetric and set at most once per pair.
#[derive(Debug)]
pub struct SurfaceData {
    /// The surface's geometry; owned.
    pub face: OrientedArea,
    /// Producing element, absent for virtual space-to-space boundaries.
    pub element: Option<ElementId>,
    /// Bounding space back-reference.
    pub space: Option<SpaceId>,
    /// The surface on the other side of the boundary.
    pub opposite: Option<SurfaceId>,
    /// Host surface, set for fenestration surfaces only.
    pub parent: Option<SurfaceId>,
    /// Material layers between this surface and its opposite.
    pub layers: Vec<MaterialLayer>,
    pub level: Level,
    /// True for inter-space boundaries with no element between them.
    pub is_virtual: bool,
    /// True when the far side is the exterior.
    pub is_external: bool,
}

impl SurfaceData {
    /// Creates an unlinked, unclassified surface.
    #[must_use]
    pub fn new(face: OrientedArea) -> Self {
        Self {
            face,
            element: None,
            space: None,
            opposite: None,
            parent: None,
            layers: Vec::new(),
            level: Level::Unassigned,
            is_virtual: false,
            is_external: false,
        }
    }
}
