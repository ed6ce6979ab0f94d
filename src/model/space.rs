use super::surface::SurfaceId;
use crate::geometry::Solid;

slotmap::new_key_type! {
    /// Unique identifier for a space in the model store.
    pub struct SpaceId;
}

/// Data associated with an enclosed air volume.
///
/// Never mutated once built except for accumulating stack results into
/// `surfaces`.
#[derive(Debug)]
pub struct SpaceData {
    /// Source identifier, carried through to output boundaries.
    pub name: String,
    pub solid: Solid,
    /// The designated exterior pseudo-space receives all half-stack
    /// boundaries.
    pub is_outside: bool,
    /// Boundary surfaces bounding this space, filled by stacking.
    pub surfaces: Vec<SurfaceId>,
}
