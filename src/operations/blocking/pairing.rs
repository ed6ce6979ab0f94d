use crate::geometry::{could_form_block, OrientedArea};
use crate::operations::blocking::Block;

/// Pairs half-blocks into full blocks wherever two of them face each other
/// across the element's thickness.
///
/// Each half-block pairs with at most one partner. When several partners
/// qualify, the nearest by thickness wins; partners further apart than
/// `max_pair_distance` are never considered. Leftovers stay half-blocks.
#[must_use]
pub fn pair_half_blocks(
    halves: Vec<OrientedArea>,
    tolerance: f64,
    max_pair_distance: f64,
) -> Vec<Block> {
    let mut consumed = vec![false; halves.len()];
    let mut blocks = Vec::with_capacity(halves.len());

    for i in 0..halves.len() {
        if consumed[i] {
            continue;
        }
        consumed[i] = true;

        let mut best: Option<(usize, f64)> = None;
        for (j, other) in halves.iter().enumerate().skip(i + 1) {
            if consumed[j] {
                continue;
            }
            if let Some(thickness) = could_form_block(&halves[i], other, tolerance) {
                if thickness <= max_pair_distance
                    && best.map_or(true, |(_, current)| thickness < current)
                {
                    best = Some((j, thickness));
                }
            }
        }

        if let Some((j, thickness)) = best {
            consumed[j] = true;
            let (front, back) = if halves[i].sense() {
                (halves[i].clone(), halves[j].clone())
            } else {
                (halves[j].clone(), halves[i].clone())
            };
            blocks.push(Block::full(front, back, thickness));
        } else {
            blocks.push(Block::half(halves[i].clone()));
        }
    }
    blocks
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::snap::EqualityContext;

    fn face(ctx: &mut EqualityContext, pts: &[Point3]) -> OrientedArea {
        OrientedArea::from_loop(ctx, pts).unwrap()
    }

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn nearest_partner_wins() {
        let mut ctx = EqualityContext::new(0.01);
        let square = |ctx: &mut EqualityContext, z: f64, up: bool| {
            if up {
                face(ctx, &[p(0.0, 0.0, z), p(1.0, 0.0, z), p(1.0, 1.0, z), p(0.0, 1.0, z)])
            } else {
                face(ctx, &[p(0.0, 0.0, z), p(0.0, 1.0, z), p(1.0, 1.0, z), p(1.0, 0.0, z)])
            }
        };
        // Upward face at z=2 could pair with the downward faces at z=-1
        // and z=1; the z=1 one is nearer.
        let halves = vec![
            square(&mut ctx, 2.0, true),
            square(&mut ctx, -1.0, false),
            square(&mut ctx, 1.0, false),
        ];
        let blocks = pair_half_blocks(halves, ctx.tolerance(), f64::INFINITY);
        assert_eq!(blocks.len(), 2);
        let full: Vec<_> = blocks.iter().filter(|b| b.is_full()).collect();
        assert_eq!(full.len(), 1);
        assert!((full[0].thickness() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn distance_cutoff_blocks_pairing() {
        let mut ctx = EqualityContext::new(0.01);
        let bottom = face(
            &mut ctx,
            &[p(0.0, 0.0, 0.0), p(0.0, 1.0, 0.0), p(1.0, 1.0, 0.0), p(1.0, 0.0, 0.0)],
        );
        let top = face(
            &mut ctx,
            &[p(0.0, 0.0, 4.0), p(1.0, 0.0, 4.0), p(1.0, 1.0, 4.0), p(0.0, 1.0, 4.0)],
        );
        let blocks = pair_half_blocks(vec![bottom, top], ctx.tolerance(), 2.0);
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| !b.is_full()));
    }

    #[test]
    fn mismatched_areas_stay_halves() {
        let mut ctx = EqualityContext::new(0.01);
        let small = face(
            &mut ctx,
            &[p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(0.0, 1.0, 0.0)],
        );
        let large = face(
            &mut ctx,
            &[p(0.0, 0.0, -1.0), p(0.0, 2.0, -1.0), p(2.0, 2.0, -1.0), p(2.0, 0.0, -1.0)],
        );
        let blocks = pair_half_blocks(vec![small, large], ctx.tolerance(), f64::INFINITY);
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| !b.is_full()));
    }
}
