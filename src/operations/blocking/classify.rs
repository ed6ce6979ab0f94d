use crate::geometry::{Area, OrientedArea};
use crate::math::{Point2, TOLERANCE};
use crate::snap::EqualityContext;

/// Why a face matters to a given base face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relevance {
    /// Parallel, opposite sense, identical area: the classic two-sided slab.
    SameAreaParallel,
    /// Parallel, opposite sense, partially overlapping area.
    OverlappingParallel,
    /// Non-parallel face intersected by rays cast from the base into the
    /// material.
    Draped,
}

/// One face found relevant to a base, with its projection onto the base
/// plane already clipped to the base area.
#[derive(Debug)]
pub struct Candidate {
    pub face_index: usize,
    pub projected: Area,
    pub kind: Relevance,
}

/// Signed distance from the base plane to a point at depth `height` behind
/// it. Positive means on the material side of the base face.
#[must_use]
pub fn behind_distance(base: &OrientedArea, height: f64) -> f64 {
    if base.sense() {
        base.height() - height
    } else {
        height - base.height()
    }
}

/// Height (along the base orientation's normal) of a candidate face's
/// supporting plane above the given 2D point of the base frame.
///
/// Returns `None` when the candidate is perpendicular to the base normal.
#[must_use]
pub fn plane_height_at(
    base: &OrientedArea,
    candidate: &OrientedArea,
    point: Point2,
    ctx: &EqualityContext,
) -> Option<f64> {
    let base_frame = ctx.orientation(base.orientation());
    let cand_frame = ctx.orientation(candidate.orientation());
    let n = base_frame.normal();
    let m = cand_frame.normal();
    let denominator = m.dot(n);
    if denominator.abs() < TOLERANCE {
        return None;
    }
    // Solve m . (flatten^-1(point) + t*n) = candidate_height for t.
    let on_plane = base_frame.unflatten(&point, 0.0);
    Some((candidate.height() - m.dot(&on_plane.coords)) / denominator)
}

/// Classifies every other face's relevance to the base face.
///
/// Parallel faces are relevant iff they look back at the base, lie behind
/// it, and their areas overlap. Non-parallel faces are relevant iff their
/// projection along the base normal overlaps the base area from the
/// material side.
#[must_use]
pub fn classify_base(
    base_index: usize,
    faces: &[OrientedArea],
    ctx: &EqualityContext,
) -> Vec<Candidate> {
    let tolerance = ctx.tolerance();
    let base = &faces[base_index];
    let mut candidates = Vec::new();

    for (face_index, other) in faces.iter().enumerate() {
        if face_index == base_index {
            continue;
        }
        if other.orientation() == base.orientation() {
            if other.sense() == base.sense() {
                continue;
            }
            if behind_distance(base, other.height()) <= tolerance {
                continue;
            }
            let projected = base.area().intersection(other.area());
            if projected.is_empty() {
                continue;
            }
            let kind = if base.area().equals(other.area()) {
                Relevance::SameAreaParallel
            } else {
                Relevance::OverlappingParallel
            };
            candidates.push(Candidate {
                face_index,
                projected,
                kind,
            });
        } else {
            let shadow = base.project_area(other, ctx);
            if shadow.is_empty() {
                continue;
            }
            let projected = base.area().intersection(&shadow);
            if projected.is_empty() {
                continue;
            }
            let Some(sample) = projected.representative_point() else {
                continue;
            };
            let Some(height) = plane_height_at(base, other, sample, ctx) else {
                continue;
            };
            if behind_distance(base, height) <= tolerance {
                continue;
            }
            candidates.push(Candidate {
                face_index,
                projected,
                kind: Relevance::Draped,
            });
        }
    }
    candidates
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;

    fn face(ctx: &mut EqualityContext, pts: &[Point3]) -> OrientedArea {
        OrientedArea::from_loop(ctx, pts).unwrap()
    }

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn opposite_slab_face_is_same_area_parallel() {
        let mut ctx = EqualityContext::new(0.01);
        let faces = vec![
            // top looking up, bottom looking down
            face(&mut ctx, &[p(0.0, 0.0, 1.0), p(2.0, 0.0, 1.0), p(2.0, 2.0, 1.0), p(0.0, 2.0, 1.0)]),
            face(&mut ctx, &[p(0.0, 0.0, 0.0), p(0.0, 2.0, 0.0), p(2.0, 2.0, 0.0), p(2.0, 0.0, 0.0)]),
        ];
        let found = classify_base(0, &faces, &ctx);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, Relevance::SameAreaParallel);
        assert!(found[0].projected.equals(faces[0].area()));
    }

    #[test]
    fn face_in_front_is_irrelevant() {
        let mut ctx = EqualityContext::new(0.01);
        let faces = vec![
            face(&mut ctx, &[p(0.0, 0.0, 1.0), p(2.0, 0.0, 1.0), p(2.0, 2.0, 1.0), p(0.0, 2.0, 1.0)]),
            // Below-looking face sitting above the upward base: wrong side.
            face(&mut ctx, &[p(0.0, 0.0, 3.0), p(0.0, 2.0, 3.0), p(2.0, 2.0, 3.0), p(2.0, 0.0, 3.0)]),
        ];
        assert!(classify_base(0, &faces, &ctx).is_empty());
    }

    #[test]
    fn perpendicular_face_is_irrelevant() {
        let mut ctx = EqualityContext::new(0.01);
        let faces = vec![
            face(&mut ctx, &[p(0.0, 0.0, 1.0), p(2.0, 0.0, 1.0), p(2.0, 2.0, 1.0), p(0.0, 2.0, 1.0)]),
            face(&mut ctx, &[p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0), p(2.0, 0.0, 1.0), p(0.0, 0.0, 1.0)]),
        ];
        assert!(classify_base(0, &faces, &ctx).is_empty());
    }

    #[test]
    fn slanted_face_behind_is_draped() {
        let mut ctx = EqualityContext::new(0.01);
        let base = face(
            &mut ctx,
            &[p(0.0, 0.0, 2.0), p(2.0, 0.0, 2.0), p(2.0, 2.0, 2.0), p(0.0, 2.0, 2.0)],
        );
        // Ramp from z=0 to z=1 under the base, wound to look downward.
        let ramp = face(
            &mut ctx,
            &[p(0.0, 0.0, 0.0), p(0.0, 2.0, 0.0), p(2.0, 2.0, 1.0), p(2.0, 0.0, 1.0)],
        );
        let faces = vec![base, ramp];
        let found = classify_base(0, &faces, &ctx);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, Relevance::Draped);
    }
}
