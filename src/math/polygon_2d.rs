use super::{Point2, Point3, Vector3, TOLERANCE};
use crate::error::{GeometryError, Result};

/// Computes the signed area of a 2D polygon loop (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Reorders a loop to counter-clockwise winding if it is clockwise.
#[must_use]
pub fn ensure_ccw(points: &[Point2]) -> Vec<Point2> {
    if signed_area(points) < 0.0 {
        points.iter().rev().copied().collect()
    } else {
        points.to_vec()
    }
}

/// Drops consecutive duplicate points and redundant collinear vertices from
/// a closed loop, so every remaining edge is a maximal straight segment.
#[must_use]
pub fn dedup_collinear(points: &[Point2]) -> Vec<Point2> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    let mut out: Vec<Point2> = Vec::with_capacity(n);
    for i in 0..n {
        let prev = points[(i + n - 1) % n];
        let curr = points[i];
        let next = points[(i + 1) % n];
        if (curr - prev).norm() < TOLERANCE {
            continue;
        }
        let a = curr - prev;
        let b = next - curr;
        let cross = a.x * b.y - a.y * b.x;
        if cross.abs() < TOLERANCE && a.dot(&b) > 0.0 {
            continue;
        }
        out.push(curr);
    }
    out
}

/// Axis-aligned bounding box of a set of 2D points.
#[must_use]
pub fn bounding_box(points: &[Point2]) -> Option<(Point2, Point2)> {
    let first = points.first()?;
    let mut min = *first;
    let mut max = *first;
    for p in &points[1..] {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    Some((min, max))
}

/// Tests whether two axis-aligned boxes overlap (inclusive of touching).
#[must_use]
pub fn boxes_overlap(a: &(Point2, Point2), b: &(Point2, Point2)) -> bool {
    a.0.x <= b.1.x && a.1.x >= b.0.x && a.0.y <= b.1.y && a.1.y >= b.0.y
}

/// Point-in-loop test via ray crossing. Points on the boundary count as inside.
#[must_use]
pub fn point_in_loop(point: Point2, points: &[Point2]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = points[i];
        let b = points[j];
        // Boundary hit: distance from the point to segment ab is ~zero.
        let ab = b - a;
        let ap = point - a;
        let len_sq = ab.norm_squared();
        if len_sq > TOLERANCE {
            let t = (ap.dot(&ab) / len_sq).clamp(0.0, 1.0);
            let closest = a + ab * t;
            if (point - closest).norm() < TOLERANCE {
                return true;
            }
        }
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = a.x + (point.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Tests whether two closed loops describe the same cycle, allowing a
/// starting-point rotation and a per-coordinate epsilon.
#[must_use]
pub fn loops_equal(a: &[Point2], b: &[Point2], eps: f64) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let n = a.len();
    if n == 0 {
        return true;
    }
    'offsets: for offset in 0..n {
        for i in 0..n {
            let q = b[(i + offset) % n];
            if (a[i].x - q.x).abs() > eps || (a[i].y - q.y).abs() > eps {
                continue 'offsets;
            }
        }
        return true;
    }
    false
}

/// Computes the normal of a 3D polygon using Newell's method.
///
/// # Errors
///
/// Returns [`GeometryError::Degenerate`] if the polygon spans no area.
pub fn newell_normal(points: &[Point3]) -> Result<Vector3> {
    let n = points.len();
    let mut normal = Vector3::new(0.0, 0.0, 0.0);
    for i in 0..n {
        let curr = &points[i];
        let next = &points[(i + 1) % n];
        normal.x += (curr.y - next.y) * (curr.z + next.z);
        normal.y += (curr.z - next.z) * (curr.x + next.x);
        normal.z += (curr.x - next.x) * (curr.y + next.y);
    }
    let len = normal.norm();
    if len < TOLERANCE {
        return Err(GeometryError::Degenerate("polygon spans no area".into()).into());
    }
    Ok(normal / len)
}
