pub mod polygon_2d;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Numeric epsilon for floating-point degeneracy checks.
///
/// This is not the model snapping tolerance (which is configurable and lives
/// in the [`crate::snap::EqualityContext`]); it only guards against division
/// by near-zero quantities and zero-length vectors.
pub const TOLERANCE: f64 = 1e-10;
