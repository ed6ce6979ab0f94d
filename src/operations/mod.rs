//! Operations that take the boundary model from raw solids to classified
//! space boundaries.
//!
//! They run in a fixed order: element decomposition, stack construction,
//! opening assignment, level resolution. Each operation is a standalone
//! struct executed against the model and the shared equality context.

pub mod blocking;
pub mod decompose;
pub mod levels;
pub mod openings;
pub mod stacking;

pub use blocking::{decompose as decompose_faces, Block};
pub use decompose::{DecomposeElements, DecomposeOutcome};
pub use levels::{LevelOutcome, ResolveLevels};
pub use openings::{AssignOpenings, OpeningOutcome};
pub use stacking::{BuildStacks, StackOutcome};
