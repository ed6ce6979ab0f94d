use crate::error::{GeometryError, Result};
use crate::math::{Point2, Point3, Vector3, TOLERANCE};

/// Identifier of a pooled [`Orientation`] inside an equality context.
///
/// Plain index; orientations are never removed from the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrientationId(pub(crate) usize);

impl OrientationId {
    /// Returns the raw pool index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Canonical identity for a plane-normal direction.
///
/// All surfaces parallel or antiparallel to each other share one
/// `Orientation`. Carries a precomputed local 2D frame so points can be
/// flattened into the plane and lifted back out without recomputing a basis.
#[derive(Debug, Clone)]
pub struct Orientation {
    normal: Vector3,
    u_dir: Vector3,
    v_dir: Vector3,
}

impl Orientation {
    /// Creates an orientation from a normal vector.
    ///
    /// The U and V frame directions are computed automatically.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ZeroVector`] if the normal is zero-length.
    pub fn from_normal(normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let normal = normal / len;

        // Choose a reference vector not parallel to the normal
        let reference = if normal.x.abs() < 0.9 {
            Vector3::new(1.0, 0.0, 0.0)
        } else {
            Vector3::new(0.0, 1.0, 0.0)
        };

        let u_dir = normal.cross(&reference).normalize();
        let v_dir = normal.cross(&u_dir);

        Ok(Self {
            normal,
            u_dir,
            v_dir,
        })
    }

    /// Returns the canonical unit normal.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Signed distance of a point from the origin along the normal
    /// (the Hessian normal form plane offset).
    #[must_use]
    pub fn height_of(&self, point: &Point3) -> f64 {
        self.normal.dot(&point.coords)
    }

    /// Projects a 3D point into the plane's local 2D frame, discarding the
    /// normal component.
    #[must_use]
    pub fn flatten(&self, point: &Point3) -> Point2 {
        Point2::new(self.u_dir.dot(&point.coords), self.v_dir.dot(&point.coords))
    }

    /// Lifts a local 2D point back to 3D on the plane at the given height.
    #[must_use]
    pub fn unflatten(&self, point: &Point2, height: f64) -> Point3 {
        Point3::from(self.u_dir * point.x + self.v_dir * point.y + self.normal * height)
    }

    /// Tests whether a direction is parallel to this orientation's normal
    /// within a tolerance, ignoring sign.
    #[must_use]
    pub fn is_parallel(&self, direction: &Vector3, tolerance: f64) -> bool {
        self.normal.cross(direction).norm_squared() <= tolerance * tolerance
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn flatten_unflatten_round_trip() {
        let orientation = Orientation::from_normal(Vector3::new(0.3, -0.2, 0.9)).unwrap();
        let point = Point3::new(1.5, -2.0, 4.0);
        let height = orientation.height_of(&point);
        let flat = orientation.flatten(&point);
        let back = orientation.unflatten(&flat, height);
        assert_relative_eq!(point.x, back.x, epsilon = 1e-12);
        assert_relative_eq!(point.y, back.y, epsilon = 1e-12);
        assert_relative_eq!(point.z, back.z, epsilon = 1e-12);
    }

    #[test]
    fn zero_normal_is_rejected() {
        assert!(Orientation::from_normal(Vector3::new(0.0, 0.0, 0.0)).is_err());
    }

    #[test]
    fn parallel_test_ignores_sign() {
        let orientation = Orientation::from_normal(Vector3::new(0.0, 0.0, 1.0)).unwrap();
        assert!(orientation.is_parallel(&Vector3::new(0.0, 0.0, -1.0), 0.01));
        assert!(!orientation.is_parallel(&Vector3::new(0.0, 1.0, 0.0), 0.01));
    }
}
