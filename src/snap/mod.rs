//! Tolerance-based canonicalization of scalars, directions, and orientations.
//!
//! Every coordinate entering the pipeline is routed through an
//! [`EqualityContext`] so that values within tolerance of each other collapse
//! to one canonical representative. Downstream code can then group by exact
//! comparison of the canonical values.

use crate::error::Result;
use crate::geometry::orientation::{Orientation, OrientationId};
use crate::math::{Point3, Vector3, TOLERANCE};

/// Coordinate axis selecting a scalar pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// A pool of canonical scalar values with tolerance-radius intervals.
///
/// Also used on its own by vertical stacking to key region heights per
/// orientation with the same snapping rule as the context's axis pools.
#[derive(Debug, Clone)]
pub struct ScalarPool {
    tolerance: f64,
    /// Canonical values, kept sorted ascending.
    values: Vec<f64>,
}

impl ScalarPool {
    /// Creates an empty pool with the given tolerance radius.
    #[must_use]
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            values: Vec::new(),
        }
    }

    /// Canonicalizes a scalar.
    ///
    /// Zero stored intervals overlap the value: the value registers a new
    /// interval and becomes its own canonical. Exactly one overlaps: its
    /// stored canonical is returned. Multiple overlap: the numerically
    /// nearest canonical wins. The multi-overlap rule is a heuristic and is
    /// not transitive; it is kept as-is deliberately.
    pub fn request(&mut self, value: f64) -> f64 {
        let lo = self
            .values
            .partition_point(|&c| c < value - self.tolerance);
        let hi = self
            .values
            .partition_point(|&c| c <= value + self.tolerance);
        match hi - lo {
            0 => {
                self.values.insert(lo, value);
                value
            }
            1 => self.values[lo],
            _ => {
                let mut best = self.values[lo];
                for &c in &self.values[lo + 1..hi] {
                    if (c - value).abs() < (best - value).abs() {
                        best = c;
                    }
                }
                best
            }
        }
    }
}

/// Process-scoped snapping service.
///
/// Holds per-axis scalar pools, a direction pool, and an orientation pool,
/// all keyed by one fixed tolerance. Single-writer: the context is passed
/// `&mut` through every call that snaps, never shared as an ambient global.
#[derive(Debug)]
pub struct EqualityContext {
    tolerance: f64,
    axes: [ScalarPool; 3],
    directions: Vec<Vector3>,
    orientations: Vec<Orientation>,
}

impl EqualityContext {
    /// Creates a context with the given snapping tolerance.
    #[must_use]
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            axes: [
                ScalarPool::new(tolerance),
                ScalarPool::new(tolerance),
                ScalarPool::new(tolerance),
            ],
            directions: Vec::new(),
            orientations: Vec::new(),
        }
    }

    /// Returns the snapping tolerance.
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Canonicalizes a scalar on the given axis.
    pub fn request_scalar(&mut self, axis: Axis, value: f64) -> f64 {
        let pool = match axis {
            Axis::X => &mut self.axes[0],
            Axis::Y => &mut self.axes[1],
            Axis::Z => &mut self.axes[2],
        };
        pool.request(value)
    }

    /// Canonicalizes a point coordinate-wise.
    pub fn request_point(&mut self, point: &Point3) -> Point3 {
        Point3::new(
            self.request_scalar(Axis::X, point.x),
            self.request_scalar(Axis::Y, point.y),
            self.request_scalar(Axis::Z, point.z),
        )
    }

    /// Canonicalizes a direction.
    ///
    /// Directions pool by parallelism within tolerance (cross-product norm
    /// squared near zero). The pooled direction is returned negated when the
    /// requested sense disagrees with the pooled sense.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::GeometryError::ZeroVector`] for a zero-length
    /// direction.
    pub fn request_direction(&mut self, direction: &Vector3) -> Result<Vector3> {
        let len = direction.norm();
        if len < TOLERANCE {
            return Err(crate::error::GeometryError::ZeroVector.into());
        }
        let unit = direction / len;
        for pooled in &self.directions {
            if pooled.cross(&unit).norm_squared() <= self.tolerance * self.tolerance {
                return Ok(if pooled.dot(&unit) >= 0.0 {
                    *pooled
                } else {
                    -*pooled
                });
            }
        }
        self.directions.push(unit);
        Ok(unit)
    }

    /// Canonicalizes a plane normal into an [`Orientation`].
    ///
    /// Orientations pool by the same parallel test as directions but ignore
    /// sign. The returned flag is true when the requested normal agrees with
    /// the pooled normal's sense.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::GeometryError::ZeroVector`] for a zero-length
    /// normal.
    pub fn request_orientation(&mut self, normal: &Vector3) -> Result<(OrientationId, bool)> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(crate::error::GeometryError::ZeroVector.into());
        }
        let unit = normal / len;
        for (index, pooled) in self.orientations.iter().enumerate() {
            if pooled.is_parallel(&unit, self.tolerance) {
                let agrees = pooled.normal().dot(&unit) > 0.0;
                return Ok((OrientationId(index), agrees));
            }
        }
        let id = OrientationId(self.orientations.len());
        self.orientations.push(Orientation::from_normal(unit)?);
        Ok((id, true))
    }

    /// Returns a pooled orientation by id.
    #[must_use]
    pub fn orientation(&self, id: OrientationId) -> &Orientation {
        &self.orientations[id.0]
    }

    /// Number of pooled orientations.
    #[must_use]
    pub fn orientation_count(&self) -> usize {
        self.orientations.len()
    }
}
