//! Block decomposition.
//!
//! An element's boundary is a set of oriented faces. A *block* is a pair
//! of parallel faces with the material thickness between them, the shape
//! a wall or slab locally has. Decomposition splits the face set into
//! full blocks wherever two faces look away from each other across solid
//! material, and half-blocks where a face has no matching partner, such
//! as the underside of a stair flight or the cut edge of a raking wall.

pub mod classify;
pub mod envelope;
pub mod pairing;

use tracing::debug;

use crate::geometry::{could_form_block, OrientedArea};
use crate::snap::EqualityContext;

use self::classify::classify_base;
use self::envelope::lower_envelope;
use self::pairing::pair_half_blocks;

/// A front face with, for full blocks, the back face it pairs with.
///
/// The front is always the sense-true face of the pair. Half-blocks keep
/// only a front and report zero thickness.
#[derive(Debug, Clone)]
pub struct Block {
    front: OrientedArea,
    back: Option<OrientedArea>,
    thickness: f64,
}

impl Block {
    #[must_use]
    pub fn full(front: OrientedArea, back: OrientedArea, thickness: f64) -> Self {
        Self {
            front,
            back: Some(back),
            thickness,
        }
    }

    #[must_use]
    pub fn half(front: OrientedArea) -> Self {
        Self {
            front,
            back: None,
            thickness: 0.0,
        }
    }

    #[must_use]
    pub fn front(&self) -> &OrientedArea {
        &self.front
    }

    #[must_use]
    pub fn back(&self) -> Option<&OrientedArea> {
        self.back.as_ref()
    }

    #[must_use]
    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.back.is_some()
    }
}

/// Decomposes a face set into blocks.
///
/// Simple shapes take fast paths: four faces can never pair, and a
/// six-face solid is either a cuboid (three clean pairs) or a prismatoid
/// over one base pair. Everything else goes through the general route:
/// per base face, classify which other faces are relevant, compute the
/// lower envelope to split the base where different partners are nearest,
/// then pair the resulting half-blocks globally.
#[must_use]
pub fn decompose(
    faces: &[OrientedArea],
    ctx: &EqualityContext,
    max_pair_distance: f64,
) -> Vec<Block> {
    let tolerance = ctx.tolerance();

    if faces.len() == 4 {
        // A tetrahedron has no parallel faces, so every face is its own
        // half-block.
        return faces.iter().cloned().map(Block::half).collect();
    }

    if faces.len() == 6 {
        let pairs = parallel_pairs(faces, tolerance);
        if pairs.len() == 3 && indices_disjoint(&pairs) {
            return pairs
                .into_iter()
                .map(|(i, j, thickness)| ordered_block(&faces[i], &faces[j], thickness))
                .collect();
        }
        if let [(i, j, thickness)] = pairs.as_slice() {
            return prismatoid(faces, (*i, *j, *thickness), tolerance);
        }
    }

    let mut halves = Vec::new();
    for (base_index, base) in faces.iter().enumerate() {
        let candidates = classify_base(base_index, faces, ctx);
        if candidates.is_empty() {
            halves.push(base.clone());
            continue;
        }
        if let [only] = candidates.as_slice() {
            if only.projected.equals(base.area()) {
                halves.push(base.clone());
                continue;
            }
        }
        for cell in lower_envelope(base, &candidates, faces, ctx) {
            halves.push(base.with_area(cell.region));
        }
    }
    debug!(faces = faces.len(), halves = halves.len(), "block decomposition");
    pair_half_blocks(halves, tolerance, max_pair_distance)
}

/// All unordered face pairs that could bound a full block as they stand.
fn parallel_pairs(faces: &[OrientedArea], tolerance: f64) -> Vec<(usize, usize, f64)> {
    let mut pairs = Vec::new();
    for i in 0..faces.len() {
        for j in (i + 1)..faces.len() {
            if let Some(thickness) = could_form_block(&faces[i], &faces[j], tolerance) {
                pairs.push((i, j, thickness));
            }
        }
    }
    pairs
}

fn indices_disjoint(pairs: &[(usize, usize, f64)]) -> bool {
    let mut seen = Vec::with_capacity(pairs.len() * 2);
    for &(i, j, _) in pairs {
        seen.push(i);
        seen.push(j);
    }
    seen.sort_unstable();
    seen.windows(2).all(|w| w[0] != w[1])
}

fn ordered_block(a: &OrientedArea, b: &OrientedArea, thickness: f64) -> Block {
    if a.sense() {
        Block::full(a.clone(), b.clone(), thickness)
    } else {
        Block::full(b.clone(), a.clone(), thickness)
    }
}

/// Six faces over exactly one clean pair: the base pair becomes a full
/// block, the remaining walls pair up by orientation where their areas
/// overlap, and whatever sticks out stays a half-block.
fn prismatoid(
    faces: &[OrientedArea],
    base_pair: (usize, usize, f64),
    tolerance: f64,
) -> Vec<Block> {
    let (i, j, thickness) = base_pair;
    let mut blocks = vec![ordered_block(&faces[i], &faces[j], thickness)];

    let rest: Vec<usize> = (0..faces.len()).filter(|&k| k != i && k != j).collect();
    let mut consumed = vec![false; rest.len()];
    for a in 0..rest.len() {
        if consumed[a] {
            continue;
        }
        consumed[a] = true;
        let face_a = &faces[rest[a]];

        let partner = (a + 1..rest.len()).find(|&b| {
            !consumed[b]
                && faces[rest[b]].orientation() == face_a.orientation()
                && faces[rest[b]].sense() != face_a.sense()
        });
        let Some(b) = partner else {
            blocks.push(Block::half(face_a.clone()));
            continue;
        };
        consumed[b] = true;
        let face_b = &faces[rest[b]];

        let (top, bottom) = if face_a.sense() {
            (face_a, face_b)
        } else {
            (face_b, face_a)
        };
        let wall_thickness = top.height() - bottom.height();
        if wall_thickness <= tolerance {
            blocks.push(Block::half(top.clone()));
            blocks.push(Block::half(bottom.clone()));
            continue;
        }
        let shared = top.area().intersection(bottom.area());
        if !shared.is_empty() {
            blocks.push(Block::full(
                top.with_area(shared.clone()),
                bottom.with_area(shared.clone()),
                wall_thickness,
            ));
        }
        for (face, leftover) in [
            (top, top.area().difference(&shared)),
            (bottom, bottom.area().difference(&shared)),
        ] {
            if !leftover.is_empty() {
                blocks.push(Block::half(face.with_area(leftover)));
            }
        }
    }
    blocks
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{BrepFace, Solid};
    use crate::math::{Point3, Vector3};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn extruded_faces(
        ctx: &mut EqualityContext,
        footprint: &[(f64, f64)],
        depth: f64,
    ) -> Vec<OrientedArea> {
        let base: Vec<Point3> = footprint.iter().map(|&(x, y)| p(x, y, 0.0)).collect();
        let mut solid = Solid::from_extrusion(base, Vector3::z(), depth);
        solid.oriented_faces(ctx).unwrap().to_vec()
    }

    // ── Fast paths ──────────────────────────────────────────────────

    #[test]
    fn cuboid_decomposes_into_three_full_blocks() {
        let mut ctx = EqualityContext::new(0.01);
        let faces = extruded_faces(&mut ctx, &[(0.0, 0.0), (4.0, 0.0), (4.0, 2.0), (0.0, 2.0)], 3.0);
        assert_eq!(faces.len(), 6);

        let blocks = decompose(&faces, &ctx, f64::INFINITY);
        assert_eq!(blocks.len(), 3);
        assert!(blocks.iter().all(Block::is_full));

        let mut thicknesses: Vec<f64> = blocks.iter().map(Block::thickness).collect();
        thicknesses.sort_by(f64::total_cmp);
        assert!((thicknesses[0] - 2.0).abs() < 1e-9);
        assert!((thicknesses[1] - 3.0).abs() < 1e-9);
        assert!((thicknesses[2] - 4.0).abs() < 1e-9);
    }

    #[test]
    fn cuboid_result_is_face_order_independent() {
        let mut ctx = EqualityContext::new(0.01);
        let faces = extruded_faces(&mut ctx, &[(0.0, 0.0), (4.0, 0.0), (4.0, 2.0), (0.0, 2.0)], 3.0);

        let mut reversed = faces.clone();
        reversed.reverse();
        let mut rotated = faces.clone();
        rotated.rotate_left(2);

        for ordering in [faces, reversed, rotated] {
            let blocks = decompose(&ordering, &ctx, f64::INFINITY);
            assert_eq!(blocks.len(), 3);
            assert!(blocks.iter().all(Block::is_full));
        }
    }

    #[test]
    fn tetrahedron_yields_four_half_blocks() {
        let mut ctx = EqualityContext::new(0.01);
        let mut solid = Solid::from_brep(vec![
            BrepFace {
                outer: vec![p(0.0, 0.0, 0.0), p(0.0, 1.0, 0.0), p(1.0, 0.0, 0.0)],
                voids: Vec::new(),
            },
            BrepFace {
                outer: vec![p(0.0, 0.0, 0.0), p(0.0, 0.0, 1.0), p(0.0, 1.0, 0.0)],
                voids: Vec::new(),
            },
            BrepFace {
                outer: vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 0.0, 1.0)],
                voids: Vec::new(),
            },
            BrepFace {
                outer: vec![p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0), p(0.0, 0.0, 1.0)],
                voids: Vec::new(),
            },
        ]);
        let faces = solid.oriented_faces(&mut ctx).unwrap().to_vec();
        assert_eq!(faces.len(), 4);

        let blocks = decompose(&faces, &ctx, f64::INFINITY);
        assert_eq!(blocks.len(), 4);
        assert!(blocks.iter().all(|b| !b.is_full()));
    }

    #[test]
    fn trapezoid_prism_takes_the_prismatoid_path() {
        let mut ctx = EqualityContext::new(0.01);
        let faces = extruded_faces(
            &mut ctx,
            &[(0.0, 0.0), (4.0, 0.0), (3.0, 1.0), (1.0, 1.0)],
            1.0,
        );
        assert_eq!(faces.len(), 6);

        let blocks = decompose(&faces, &ctx, f64::INFINITY);
        // Top/bottom pair, the overlapping middle of the two parallel
        // walls, the overhang of the longer wall, two slanted halves.
        assert_eq!(blocks.len(), 5);
        assert_eq!(blocks.iter().filter(|b| b.is_full()).count(), 2);
    }

    // ── General route ───────────────────────────────────────────────

    #[test]
    fn three_stair_extrusion_yields_seven_blocks() {
        let mut ctx = EqualityContext::new(0.01);
        let footprint = [
            (0.0, 0.0),
            (30.0, 0.0),
            (30.0, 10.0),
            (20.0, 10.0),
            (20.0, 20.0),
            (10.0, 20.0),
            (10.0, 30.0),
            (0.0, 30.0),
        ];
        let faces = extruded_faces(&mut ctx, &footprint, 300.0);
        assert_eq!(faces.len(), 10);

        let blocks = decompose(&faces, &ctx, f64::INFINITY);
        assert_eq!(blocks.len(), 7);
        assert!(blocks.iter().all(Block::is_full));

        // One slab pair through the extrusion, three riser pairs per axis.
        let deep = blocks
            .iter()
            .filter(|b| (b.thickness() - 300.0).abs() < 1e-9)
            .count();
        assert_eq!(deep, 1);
    }

    #[test]
    fn stair_blocks_are_face_order_independent() {
        let mut ctx = EqualityContext::new(0.01);
        let footprint = [
            (0.0, 0.0),
            (30.0, 0.0),
            (30.0, 10.0),
            (20.0, 10.0),
            (20.0, 20.0),
            (10.0, 20.0),
            (10.0, 30.0),
            (0.0, 30.0),
        ];
        let faces = extruded_faces(&mut ctx, &footprint, 300.0);

        let mut reversed = faces.clone();
        reversed.reverse();
        let mut rotated = faces;
        rotated.rotate_left(4);

        for ordering in [reversed, rotated] {
            let blocks = decompose(&ordering, &ctx, f64::INFINITY);
            assert_eq!(blocks.len(), 7);
            assert!(blocks.iter().all(Block::is_full));
        }
    }

    #[test]
    fn staircase_slab_with_diagonal_yields_fifteen_blocks() {
        let mut ctx = EqualityContext::new(0.01);
        // Fifteen input points. One of them, (35, 0), is collinear on the
        // bottom edge and disappears in face extraction: 14 side faces
        // plus top and bottom.
        let footprint = [
            (0.0, 0.0),
            (35.0, 0.0),
            (70.0, 0.0),
            (70.0, 10.0),
            (60.0, 10.0),
            (60.0, 20.0),
            (50.0, 20.0),
            (50.0, 30.0),
            (40.0, 30.0),
            (40.0, 40.0),
            (30.0, 40.0),
            (30.0, 50.0),
            (20.0, 50.0),
            (20.0, 60.0),
            (0.0, 40.0),
        ];
        let faces = extruded_faces(&mut ctx, &footprint, 300.0);
        assert_eq!(faces.len(), 16);

        let blocks = decompose(&faces, &ctx, f64::INFINITY);
        assert_eq!(blocks.len(), 15);
        // Slab pair, four risers against the long left wall, five treads
        // against the long bottom wall; the diagonal and the walls only
        // it shadows stay half-blocks.
        assert_eq!(blocks.iter().filter(|b| b.is_full()).count(), 10);
        assert_eq!(blocks.iter().filter(|b| !b.is_full()).count(), 5);
    }

    #[test]
    fn pair_distance_cutoff_degrades_to_half_blocks() {
        let mut ctx = EqualityContext::new(0.01);
        let faces = extruded_faces(&mut ctx, &[(0.0, 0.0), (4.0, 0.0), (4.0, 2.0), (0.0, 2.0)], 3.0);
        // With the cutoff below every dimension no face can pair. The
        // six-face fast path still sees clean pairs, so force the general
        // route by dropping one face.
        let open: Vec<OrientedArea> = faces[..5].to_vec();
        let blocks = decompose(&open, &ctx, 1.0);
        assert!(blocks.iter().all(|b| !b.is_full()));
    }
}
