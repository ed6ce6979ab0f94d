pub mod area;
pub mod csg;
pub mod orientation;
pub mod oriented_area;
pub mod solid;

pub use area::{Area, Piece};
pub use csg::CsgSolid;
pub use orientation::{Orientation, OrientationId};
pub use oriented_area::{could_form_block, OrientedArea};
pub use solid::{BrepFace, Extrusion, Solid, SolidForm};
