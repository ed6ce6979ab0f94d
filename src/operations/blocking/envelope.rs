use std::cmp::Ordering;

use crate::geometry::{Area, OrientedArea};
use crate::math::Point2;
use crate::operations::blocking::classify::{behind_distance, plane_height_at, Candidate};
use crate::snap::EqualityContext;

/// Pieces of an area too small to carry a decision of their own. Matches
/// the floor used by the overlay itself.
const SLIVER: f64 = 1e-9;

/// One region of the base area together with the candidate visible there,
/// or `None` where no candidate covers the base at all.
#[derive(Debug)]
pub struct Cell {
    pub region: Area,
    pub winner: Option<usize>,
}

/// Computes the lower envelope of all relevant candidates over the base
/// area: for every point of the base, which candidate surface is nearest
/// behind it.
///
/// Works by incremental overlay. Cells start as the whole base with no
/// winner; every candidate splits each cell into a covered and an
/// uncovered part, and on the covered part the nearer of the incumbent
/// and the newcomer wins. Cells with the same winner are merged at the
/// end, so candidate order does not show in the result.
#[must_use]
pub fn lower_envelope(
    base: &OrientedArea,
    candidates: &[Candidate],
    faces: &[OrientedArea],
    ctx: &EqualityContext,
) -> Vec<Cell> {
    let mut cells = vec![Cell {
        region: base.area().clone(),
        winner: None,
    }];

    for (candidate_index, candidate) in candidates.iter().enumerate() {
        let mut next = Vec::with_capacity(cells.len() + 1);
        for cell in cells {
            let covered = cell.region.intersection(&candidate.projected);
            if covered.measure() <= SLIVER {
                next.push(cell);
                continue;
            }
            let uncovered = cell.region.difference(&candidate.projected);
            if uncovered.measure() > SLIVER {
                next.push(Cell {
                    region: uncovered,
                    winner: cell.winner,
                });
            }
            let winner = match cell.winner {
                None => Some(candidate_index),
                Some(incumbent) => {
                    match compare_candidates(
                        base,
                        &covered,
                        &candidates[incumbent],
                        candidate,
                        faces,
                        ctx,
                    ) {
                        Ordering::Greater => Some(candidate_index),
                        Ordering::Less | Ordering::Equal => Some(incumbent),
                    }
                }
            };
            next.push(Cell {
                region: covered,
                winner,
            });
        }
        cells = next;
    }

    merge_cells(cells)
}

/// Decides which of two candidates is nearer behind the base over a cell.
///
/// Samples the cell at up to three interior points; the first point where
/// the behind-distances differ decides. `Greater` means the challenger is
/// nearer than the incumbent.
fn compare_candidates(
    base: &OrientedArea,
    cell: &Area,
    incumbent: &Candidate,
    challenger: &Candidate,
    faces: &[OrientedArea],
    ctx: &EqualityContext,
) -> Ordering {
    let tolerance = ctx.tolerance();
    for sample in sample_points(cell) {
        let d_incumbent = candidate_distance(base, &faces[incumbent.face_index], sample, ctx);
        let d_challenger = candidate_distance(base, &faces[challenger.face_index], sample, ctx);
        match (d_incumbent, d_challenger) {
            (Some(a), Some(b)) => {
                if (a - b).abs() > tolerance {
                    return if b < a { Ordering::Greater } else { Ordering::Less };
                }
            }
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (None, None) => {}
        }
    }
    Ordering::Equal
}

fn candidate_distance(
    base: &OrientedArea,
    face: &OrientedArea,
    sample: Point2,
    ctx: &EqualityContext,
) -> Option<f64> {
    let height = if face.orientation() == base.orientation() {
        face.height()
    } else {
        plane_height_at(base, face, sample, ctx)?
    };
    Some(behind_distance(base, height))
}

/// Interior sample points of a cell. The representative point always
/// comes first; the extremes of the triangulation add discrimination when
/// two planes meet exactly at the representative point.
fn sample_points(cell: &Area) -> Vec<Point2> {
    let mut samples = Vec::with_capacity(3);
    if let Some(point) = cell.representative_point() {
        samples.push(point);
    }
    if let Ok(triangles) = cell.convex_pieces() {
        if let (Some(first), Some(last)) = (triangles.first(), triangles.last()) {
            for triangle in [first, last] {
                let centroid = Point2::new(
                    (triangle[0].x + triangle[1].x + triangle[2].x) / 3.0,
                    (triangle[0].y + triangle[1].y + triangle[2].y) / 3.0,
                );
                if !samples.iter().any(|s| (s - centroid).norm() < 1e-12) {
                    samples.push(centroid);
                }
            }
        }
    }
    samples
}

/// Unions cells that share a winner so the envelope is independent of the
/// order candidates were folded in.
fn merge_cells(cells: Vec<Cell>) -> Vec<Cell> {
    let mut merged: Vec<Cell> = Vec::new();
    for cell in cells {
        if let Some(existing) = merged.iter_mut().find(|c| c.winner == cell.winner) {
            existing.region = existing.region.union(&cell.region);
        } else {
            merged.push(cell);
        }
    }
    merged.retain(|cell| cell.region.measure() > SLIVER);
    merged
}
