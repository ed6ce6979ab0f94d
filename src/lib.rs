pub mod error;
pub mod geometry;
pub mod math;
pub mod model;
pub mod operations;
pub mod pipeline;
pub mod snap;

pub use error::{ParcloseError, Result};
