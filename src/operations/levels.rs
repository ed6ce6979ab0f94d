use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::error::Result;
use crate::geometry::{CsgSolid, Solid};
use crate::math::Point3;
use crate::model::{BoundaryModel, Level, SurfaceId};
use crate::snap::EqualityContext;

/// Classifies every boundary surface into its adjacency level.
///
/// Fenestration and virtual boundaries are level 2. A boundary whose
/// opposite bounds the same space is level 4; one with no opposite at
/// all is level 5. The remaining opposite-linked pairs form blockstacks,
/// solid slices between two mirrored surfaces: level 2 by default,
/// promoted to 3 when the slice intersects another blockstack no thicker
/// than itself.
#[derive(Default)]
pub struct ResolveLevels;

#[derive(Debug, Default)]
pub struct LevelOutcome {
    pub blockstacks: usize,
    pub promoted: usize,
}

/// A pair of mutually opposite surfaces with the material volume between
/// them.
struct Blockstack {
    near: SurfaceId,
    far: SurfaceId,
    thickness: f64,
    volumes: Vec<CsgSolid>,
    aabb: (Point3, Point3),
}

impl ResolveLevels {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes level resolution over all space-bound surfaces.
    ///
    /// # Errors
    ///
    /// Propagates model lookup failures; degenerate blockstack volumes
    /// are skipped with a warning.
    pub fn execute(
        &self,
        model: &mut BoundaryModel,
        ctx: &mut EqualityContext,
    ) -> Result<LevelOutcome> {
        let mut outcome = LevelOutcome::default();
        let mut pair_candidates: Vec<(SurfaceId, SurfaceId)> = Vec::new();

        let surface_ids: Vec<SurfaceId> = model.surfaces().map(|(id, _)| id).collect();
        for surface_id in surface_ids {
            let data = model.surface(surface_id)?;
            if data.space.is_none() {
                continue;
            }
            if data.is_virtual || is_fenestration(model, surface_id)? {
                model.surface_mut(surface_id)?.level = Level::Two;
                continue;
            }
            let Some(opposite) = model.surface(surface_id)?.opposite else {
                model.surface_mut(surface_id)?.level = Level::Five;
                continue;
            };
            let same_space = {
                let own = model.surface(surface_id)?.space;
                own.is_some() && own == model.surface(opposite)?.space
            };
            if same_space {
                model.surface_mut(surface_id)?.level = Level::Four;
                continue;
            }
            model.surface_mut(surface_id)?.level = Level::Two;
            if surface_id < opposite {
                pair_candidates.push((surface_id, opposite));
            }
        }

        let stacks = build_blockstacks(model, ctx, &pair_candidates)?;
        outcome.blockstacks = stacks.len();

        for (i, j) in intersecting_pairs(&stacks) {
            let tolerance = ctx.tolerance();
            if stacks[j].thickness <= stacks[i].thickness + tolerance {
                outcome.promoted += promote(model, &stacks[i])?;
            }
            if stacks[i].thickness <= stacks[j].thickness + tolerance {
                outcome.promoted += promote(model, &stacks[j])?;
            }
        }
        debug!(
            blockstacks = outcome.blockstacks,
            promoted = outcome.promoted,
            "levels resolved"
        );
        Ok(outcome)
    }
}

fn promote(model: &mut BoundaryModel, stack: &Blockstack) -> Result<usize> {
    let mut changed = 0;
    for id in [stack.near, stack.far] {
        let surface = model.surface_mut(id)?;
        if surface.level != Level::Three {
            surface.level = Level::Three;
            changed += 1;
        }
    }
    Ok(changed)
}

fn is_fenestration(model: &BoundaryModel, surface_id: SurfaceId) -> Result<bool> {
    let Some(element_id) = model.surface(surface_id)?.element else {
        return Ok(false);
    };
    Ok(model.element(element_id)?.kind.is_fenestration())
}

/// Materializes the solid slice of every candidate pair. Pairs whose
/// thickness is below tolerance, or whose volume cannot be built, drop
/// out of promotion entirely.
fn build_blockstacks(
    model: &BoundaryModel,
    ctx: &mut EqualityContext,
    pairs: &[(SurfaceId, SurfaceId)],
) -> Result<Vec<Blockstack>> {
    let mut stacks = Vec::with_capacity(pairs.len());
    for &(near_id, far_id) in pairs {
        let near = model.surface(near_id)?.face.clone();
        let far = model.surface(far_id)?.face.clone();
        let thickness = (far.height() - near.height()).abs();
        if thickness <= ctx.tolerance() {
            continue;
        }
        // The near face looks out of its space into the material, so the
        // slice extends along its outward normal.
        let direction = near.outward_normal(ctx);
        let mut volumes = Vec::new();
        let mut points = Vec::new();
        for outer in near.outer_loops_3d(ctx) {
            points.extend(outer.iter().copied());
            points.extend(outer.iter().map(|p| p + direction * thickness));
            let mut prism = Solid::from_extrusion(outer, direction, thickness);
            match prism.promote_boolean(ctx) {
                Ok(csg) => volumes.push(csg.clone()),
                Err(error) if error.is_recoverable() => {
                    warn!(%error, "skipping degenerate blockstack volume");
                }
                Err(error) => return Err(error),
            }
        }
        if volumes.is_empty() {
            continue;
        }
        let aabb = bounding_box(&points);
        stacks.push(Blockstack {
            near: near_id,
            far: far_id,
            thickness,
            volumes,
            aabb,
        });
    }
    Ok(stacks)
}

fn bounding_box(points: &[Point3]) -> (Point3, Point3) {
    let mut min = Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
    let mut max = Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points {
        min = Point3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z));
        max = Point3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z));
    }
    (min, max)
}

/// All blockstack pairs that actually share volume.
///
/// Three independent 1D interval sweeps, one per axis, each yield the
/// pairs overlapping on that axis; only pairs surviving all three go to
/// the exact polyhedral intersection test.
fn intersecting_pairs(stacks: &[Blockstack]) -> Vec<(usize, usize)> {
    if stacks.len() < 2 {
        return Vec::new();
    }
    let mut survivors: Option<BTreeSet<(usize, usize)>> = None;
    for axis in 0..3 {
        let axis_pairs = axis_overlaps(stacks, axis);
        survivors = Some(match survivors {
            None => axis_pairs,
            Some(previous) => previous.intersection(&axis_pairs).copied().collect(),
        });
    }

    let mut exact = Vec::new();
    for (i, j) in survivors.unwrap_or_default() {
        let touches = stacks[i]
            .volumes
            .iter()
            .any(|a| stacks[j].volumes.iter().any(|b| a.intersects(b)));
        if touches {
            exact.push((i, j));
        }
    }
    exact
}

/// Sweep over one axis's sorted intervals, collecting overlapping pairs.
fn axis_overlaps(stacks: &[Blockstack], axis: usize) -> BTreeSet<(usize, usize)> {
    let interval = |i: usize| -> (f64, f64) {
        let (min, max) = stacks[i].aabb;
        (min[axis], max[axis])
    };
    let mut order: Vec<usize> = (0..stacks.len()).collect();
    order.sort_by(|&a, &b| interval(a).0.total_cmp(&interval(b).0));

    let mut pairs = BTreeSet::new();
    for (position, &i) in order.iter().enumerate() {
        let (_, end) = interval(i);
        for &j in &order[position + 1..] {
            if interval(j).0 > end {
                break;
            }
            pairs.insert((i.min(j), i.max(j)));
        }
    }
    pairs
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::OrientedArea;
    use crate::model::{ElementData, ElementKind, SpaceData, SurfaceData};

    fn space(model: &mut BoundaryModel, name: &str) -> crate::model::SpaceId {
        model.add_space(SpaceData {
            name: name.into(),
            solid: Solid::from_faces(Vec::new()),
            is_outside: false,
            surfaces: Vec::new(),
        })
    }

    fn surface(
        model: &mut BoundaryModel,
        face: OrientedArea,
        space: crate::model::SpaceId,
    ) -> SurfaceId {
        let mut data = SurfaceData::new(face);
        data.space = Some(space);
        model.add_surface(data)
    }

    fn quad(ctx: &mut EqualityContext, pts: [(f64, f64, f64); 4]) -> OrientedArea {
        let points: Vec<Point3> = pts.iter().map(|&(x, y, z)| Point3::new(x, y, z)).collect();
        OrientedArea::from_loop(ctx, &points).unwrap()
    }

    /// Wall slice between x0 and x1: near face looks +x, far face -x.
    fn wall_pair(
        ctx: &mut EqualityContext,
        model: &mut BoundaryModel,
        x0: f64,
        x1: f64,
        left: crate::model::SpaceId,
        right: crate::model::SpaceId,
    ) -> (SurfaceId, SurfaceId) {
        let near = quad(ctx, [(x0, 0.0, 0.0), (x0, 4.0, 0.0), (x0, 4.0, 3.0), (x0, 0.0, 3.0)]);
        let far = quad(ctx, [(x1, 0.0, 0.0), (x1, 0.0, 3.0), (x1, 4.0, 3.0), (x1, 4.0, 0.0)]);
        let a = surface(model, near, left);
        let b = surface(model, far, right);
        model.link_opposites(a, b).unwrap();
        (a, b)
    }

    #[test]
    fn virtual_and_unopposed_surfaces_classify_directly() {
        let mut ctx = EqualityContext::new(0.01);
        let mut model = BoundaryModel::new();
        let s = space(&mut model, "room");

        let face = quad(&mut ctx, [(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (1.0, 1.0, 0.0), (0.0, 1.0, 0.0)]);
        let lonely = surface(&mut model, face.clone(), s);
        let ghost = surface(&mut model, face, s);
        model.surface_mut(ghost).unwrap().is_virtual = true;

        ResolveLevels::new().execute(&mut model, &mut ctx).unwrap();
        assert_eq!(model.surface(lonely).unwrap().level, Level::Five);
        assert_eq!(model.surface(ghost).unwrap().level, Level::Two);
    }

    #[test]
    fn fenestration_is_level_two() {
        let mut ctx = EqualityContext::new(0.01);
        let mut model = BoundaryModel::new();
        let s = space(&mut model, "room");
        let door = model.add_element(ElementData {
            name: "door".into(),
            kind: ElementKind::Door,
            material: 1,
            solid: Solid::from_faces(Vec::new()),
        });
        let face = quad(&mut ctx, [(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (1.0, 1.0, 0.0), (0.0, 1.0, 0.0)]);
        let id = surface(&mut model, face, s);
        model.surface_mut(id).unwrap().element = Some(door);

        ResolveLevels::new().execute(&mut model, &mut ctx).unwrap();
        assert_eq!(model.surface(id).unwrap().level, Level::Two);
    }

    #[test]
    fn same_space_pair_is_level_four() {
        let mut ctx = EqualityContext::new(0.01);
        let mut model = BoundaryModel::new();
        let s = space(&mut model, "room");
        let (a, b) = wall_pair(&mut ctx, &mut model, 0.0, 0.2, s, s);

        ResolveLevels::new().execute(&mut model, &mut ctx).unwrap();
        assert_eq!(model.surface(a).unwrap().level, Level::Four);
        assert_eq!(model.surface(b).unwrap().level, Level::Four);
    }

    #[test]
    fn crossing_equal_walls_promote_each_other_to_three() {
        let mut ctx = EqualityContext::new(0.01);
        let mut model = BoundaryModel::new();
        let left = space(&mut model, "left");
        let right = space(&mut model, "right");
        let (a, b) = wall_pair(&mut ctx, &mut model, 0.0, 0.2, left, right);

        // A second wall of the same thickness crossing the first.
        let front = space(&mut model, "front");
        let back = space(&mut model, "back");
        let near = quad(&mut ctx, [(0.0, 0.0, 0.0), (0.0, 0.0, 3.0), (4.0, 0.0, 3.0), (4.0, 0.0, 0.0)]);
        let far = quad(&mut ctx, [(0.0, 0.2, 0.0), (4.0, 0.2, 0.0), (4.0, 0.2, 3.0), (0.0, 0.2, 3.0)]);
        let c = surface(&mut model, near, front);
        let d = surface(&mut model, far, back);
        model.link_opposites(c, d).unwrap();

        // And one far away that touches nothing.
        let lone_l = space(&mut model, "l");
        let lone_r = space(&mut model, "r");
        let (e, f) = wall_pair(&mut ctx, &mut model, 10.0, 10.2, lone_l, lone_r);

        let outcome = ResolveLevels::new().execute(&mut model, &mut ctx).unwrap();
        assert_eq!(outcome.blockstacks, 3);

        for id in [a, b, c, d] {
            assert_eq!(model.surface(id).unwrap().level, Level::Three);
        }
        for id in [e, f] {
            assert_eq!(model.surface(id).unwrap().level, Level::Two);
        }
    }

    #[test]
    fn thin_wall_does_not_promote_against_thicker_one() {
        let mut ctx = EqualityContext::new(0.01);
        let mut model = BoundaryModel::new();
        let left = space(&mut model, "left");
        let right = space(&mut model, "right");
        // Thick slice through x in [0, 0.4].
        let (thick_a, thick_b) = wall_pair(&mut ctx, &mut model, 0.0, 0.4, left, right);

        let front = space(&mut model, "front");
        let back = space(&mut model, "back");
        let near = quad(&mut ctx, [(0.0, 0.0, 0.0), (0.0, 0.0, 3.0), (4.0, 0.0, 3.0), (4.0, 0.0, 0.0)]);
        let far = quad(&mut ctx, [(0.0, 0.2, 0.0), (4.0, 0.2, 0.0), (4.0, 0.2, 3.0), (0.0, 0.2, 3.0)]);
        let thin_a = surface(&mut model, near, front);
        let thin_b = surface(&mut model, far, back);
        model.link_opposites(thin_a, thin_b).unwrap();

        ResolveLevels::new().execute(&mut model, &mut ctx).unwrap();

        // The thick slice meets a thinner one: promoted. The thin slice
        // only meets something thicker: left at level 2.
        assert_eq!(model.surface(thick_a).unwrap().level, Level::Three);
        assert_eq!(model.surface(thick_b).unwrap().level, Level::Three);
        assert_eq!(model.surface(thin_a).unwrap().level, Level::Two);
        assert_eq!(model.surface(thin_b).unwrap().level, Level::Two);
    }
}
