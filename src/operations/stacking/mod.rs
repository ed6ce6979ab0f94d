//! Vertical stack construction.
//!
//! Starting from each space boundary face, descend through the blocks in
//! front of it until another space closes the boundary or the material
//! ends, collecting the material layers crossed on the way.

mod build;
mod region;

pub use build::{BuildStacks, StackOutcome};
