use tracing::{debug, warn};

use crate::error::{ModelError, Result};
use crate::model::{BoundaryModel, SurfaceId};

/// Assigns every fenestration surface a host surface and, through it, a
/// bounding space and exterior flag.
///
/// A host must share the fenestration's orientation, sit on its plane
/// within twice the snapping tolerance, and cover its whole area. The
/// first surface that qualifies wins.
pub struct AssignOpenings {
    tolerance: f64,
    strict: bool,
}

#[derive(Debug, Default)]
pub struct OpeningOutcome {
    pub assigned: usize,
    pub unassigned: usize,
}

impl AssignOpenings {
    /// Creates the operation. Under `strict`, an unassignable opening is
    /// a fatal consistency error instead of a warning.
    #[must_use]
    pub fn new(tolerance: f64, strict: bool) -> Self {
        Self { tolerance, strict }
    }

    /// Executes the assignment over all fenestration surfaces.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::AssertionFailed`] for an orphaned opening in
    /// strict mode.
    pub fn execute(&self, model: &mut BoundaryModel) -> Result<OpeningOutcome> {
        let mut outcome = OpeningOutcome::default();

        let mut fenestrations: Vec<SurfaceId> = Vec::new();
        let mut hosts: Vec<SurfaceId> = Vec::new();
        for (surface_id, data) in model.surfaces() {
            if is_fenestration(model, surface_id)? {
                fenestrations.push(surface_id);
            } else if data.space.is_some() {
                hosts.push(surface_id);
            }
        }

        for fenestration_id in fenestrations {
            match self.find_host(model, fenestration_id, &hosts)? {
                Some(host_id) => {
                    let host = model.surface(host_id)?;
                    let (space, is_external) = (host.space, host.is_external);
                    let surface = model.surface_mut(fenestration_id)?;
                    surface.parent = Some(host_id);
                    surface.space = space;
                    surface.is_external = is_external;
                    if let Some(space_id) = space {
                        model.space_mut(space_id)?.surfaces.push(fenestration_id);
                    }
                    outcome.assigned += 1;
                }
                None => {
                    if self.strict {
                        return Err(ModelError::AssertionFailed(format!(
                            "no host surface for opening {fenestration_id:?}"
                        ))
                        .into());
                    }
                    warn!(?fenestration_id, "opening has no host surface");
                    outcome.unassigned += 1;
                }
            }
        }
        debug!(
            assigned = outcome.assigned,
            unassigned = outcome.unassigned,
            "openings assigned"
        );
        Ok(outcome)
    }

    fn find_host(
        &self,
        model: &BoundaryModel,
        fenestration_id: SurfaceId,
        hosts: &[SurfaceId],
    ) -> Result<Option<SurfaceId>> {
        let fenestration = &model.surface(fenestration_id)?.face;
        for &host_id in hosts {
            let host = &model.surface(host_id)?.face;
            if host.orientation() != fenestration.orientation() {
                continue;
            }
            if (host.height() - fenestration.height()).abs() > self.tolerance * 2.0 {
                continue;
            }
            if host.area().contains(fenestration.area()) {
                return Ok(Some(host_id));
            }
        }
        Ok(None)
    }
}

fn is_fenestration(model: &BoundaryModel, surface_id: SurfaceId) -> Result<bool> {
    let Some(element_id) = model.surface(surface_id)?.element else {
        return Ok(false);
    };
    Ok(model.element(element_id)?.kind.is_fenestration())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{OrientedArea, Solid};
    use crate::math::Point3;
    use crate::model::{ElementData, ElementKind, SpaceData, SurfaceData};
    use crate::snap::EqualityContext;

    fn rect(ctx: &mut EqualityContext, x0: f64, z0: f64, x1: f64, z1: f64) -> OrientedArea {
        // Wall-plane rectangle at y=0.
        OrientedArea::from_loop(
            ctx,
            &[
                Point3::new(x0, 0.0, z0),
                Point3::new(x0, 0.0, z1),
                Point3::new(x1, 0.0, z1),
                Point3::new(x1, 0.0, z0),
            ],
        )
        .unwrap()
    }

    struct Fixture {
        model: BoundaryModel,
        window: crate::model::SurfaceId,
        wall: crate::model::SurfaceId,
    }

    fn fixture(ctx: &mut EqualityContext) -> Fixture {
        let mut model = BoundaryModel::new();
        let space = model.add_space(SpaceData {
            name: "room".into(),
            solid: Solid::from_faces(Vec::new()),
            is_outside: false,
            surfaces: Vec::new(),
        });
        let window_element = model.add_element(ElementData {
            name: "win".into(),
            kind: ElementKind::Window,
            material: 9,
            solid: Solid::from_faces(Vec::new()),
        });

        let mut wall = SurfaceData::new(rect(ctx, 0.0, 0.0, 4.0, 2.5));
        wall.space = Some(space);
        let wall = model.add_surface(wall);

        let mut window = SurfaceData::new(rect(ctx, 1.0, 0.8, 2.0, 2.0));
        window.element = Some(window_element);
        let window = model.add_surface(window);

        Fixture { model, window, wall }
    }

    #[test]
    fn window_inside_wall_gets_parent_and_space() {
        let mut ctx = EqualityContext::new(0.01);
        let mut f = fixture(&mut ctx);

        let outcome = AssignOpenings::new(ctx.tolerance(), true)
            .execute(&mut f.model)
            .unwrap();
        assert_eq!(outcome.assigned, 1);

        let window = f.model.surface(f.window).unwrap();
        assert_eq!(window.parent, Some(f.wall));
        assert_eq!(window.space, f.model.surface(f.wall).unwrap().space);
    }

    #[test]
    fn shrinking_the_host_breaks_the_assignment() {
        let mut ctx = EqualityContext::new(0.01);
        let mut f = fixture(&mut ctx);
        // Shrink the wall so it no longer covers the window.
        let small = rect(&mut ctx, 0.0, 0.0, 1.5, 2.5);
        f.model.surface_mut(f.wall).unwrap().face = small;

        let outcome = AssignOpenings::new(ctx.tolerance(), false)
            .execute(&mut f.model)
            .unwrap();
        assert_eq!(outcome.assigned, 0);
        assert_eq!(outcome.unassigned, 1);
        assert!(f.model.surface(f.window).unwrap().parent.is_none());
    }

    #[test]
    fn orphaned_opening_is_fatal_in_strict_mode() {
        let mut ctx = EqualityContext::new(0.01);
        let mut f = fixture(&mut ctx);
        f.model.surface_mut(f.wall).unwrap().face = rect(&mut ctx, 0.0, 0.0, 0.5, 0.5);

        let result = AssignOpenings::new(ctx.tolerance(), true).execute(&mut f.model);
        assert!(result.is_err());
    }

    #[test]
    fn offset_plane_is_not_a_host() {
        let mut ctx = EqualityContext::new(0.01);
        let mut f = fixture(&mut ctx);
        // Move the window well off the wall plane.
        let face = OrientedArea::from_loop(
            &mut ctx,
            &[
                Point3::new(1.0, 0.5, 0.8),
                Point3::new(1.0, 0.5, 2.0),
                Point3::new(2.0, 0.5, 2.0),
                Point3::new(2.0, 0.5, 0.8),
            ],
        )
        .unwrap();
        f.model.surface_mut(f.window).unwrap().face = face;

        let outcome = AssignOpenings::new(ctx.tolerance(), false)
            .execute(&mut f.model)
            .unwrap();
        assert_eq!(outcome.unassigned, 1);
    }
}
