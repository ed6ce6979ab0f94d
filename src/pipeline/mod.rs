//! End-to-end boundary extraction.
//!
//! The pipeline feeds the inputs through the operations in order:
//! element decomposition into blocks, vertical stacking from the space
//! faces, opening assignment, level resolution, then exports the
//! space-bound surfaces as boundary records.

mod config;
mod output;

pub use config::{Config, DiagnosticSink, Diagnostics, ElementInput, SpaceInput};
pub use output::{Boundary, LevelCounts, LevelSummary, RunResult, RunStatus};

use std::collections::HashMap;

use crate::error::{ModelError, Result};
use crate::model::{BoundaryModel, ElementData, SpaceData, SpaceId, SurfaceId};
use crate::operations::{AssignOpenings, BuildStacks, DecomposeElements, ResolveLevels};
use crate::snap::EqualityContext;

/// Runs the whole extraction.
///
/// Geometry failures are contained per element or space; only invariant
/// violations and model-level failures abort the run.
///
/// # Errors
///
/// Returns an error when an internal invariant is violated, or for an
/// orphaned opening under `expensive_checks`.
pub fn run(
    config: &Config,
    elements: Vec<ElementInput>,
    spaces: Vec<SpaceInput>,
    diagnostics: &mut Diagnostics,
) -> Result<RunResult> {
    let mut ctx = EqualityContext::new(config.tolerance);
    let mut model = BoundaryModel::new();

    for element in elements {
        if !config.element_filter.is_empty() && !config.element_filter.contains(&element.name) {
            continue;
        }
        model.add_element(ElementData {
            name: element.name,
            kind: element.kind,
            material: element.material,
            solid: element.solid,
        });
    }
    for space in spaces {
        // The outside space is always carried; it only receives results.
        if !space.is_outside
            && !config.space_filter.is_empty()
            && !config.space_filter.contains(&space.name)
        {
            continue;
        }
        model.add_space(SpaceData {
            name: space.name,
            solid: space.solid,
            is_outside: space.is_outside,
            surfaces: Vec::new(),
        });
    }

    let decomposed =
        DecomposeElements::new(config.max_pair_distance).execute(&mut model, &mut ctx)?;
    if config.verbose_blocks {
        diagnostics.notify(&format!(
            "decomposed elements into {} blocks",
            decomposed.blocks
        ));
    }
    if decomposed.skipped > 0 {
        diagnostics.warn(&format!(
            "{} elements skipped for unprocessable geometry",
            decomposed.skipped
        ));
    }

    let stacked = BuildStacks::new().execute(&mut model, &mut ctx)?;
    if config.verbose_stacks {
        diagnostics.notify(&format!("built {} stacked boundaries", stacked.boundaries));
    }
    if stacked.degraded {
        diagnostics.warn("geometry too complicated in places; result is degraded");
    }

    let openings =
        AssignOpenings::new(ctx.tolerance(), config.expensive_checks).execute(&mut model)?;
    if openings.unassigned > 0 {
        diagnostics.warn(&format!("{} openings without host", openings.unassigned));
    }

    let levels = ResolveLevels::new().execute(&mut model, &mut ctx)?;
    if config.verbose_levels {
        diagnostics.notify(&format!(
            "{} blockstacks, {} surfaces promoted to level 3",
            levels.blockstacks, levels.promoted
        ));
    }

    if config.expensive_checks {
        verify_opposite_links(&model)?;
    }

    let (boundaries, summary) = export(&model, &ctx)?;
    diagnostics.notify(&format!("extracted {} space boundaries", boundaries.len()));
    Ok(RunResult {
        boundaries,
        status: if stacked.degraded {
            RunStatus::Degraded
        } else {
            RunStatus::Clean
        },
        summary,
    })
}

/// Every opposite link must point back at its origin.
fn verify_opposite_links(model: &BoundaryModel) -> Result<()> {
    for (surface_id, data) in model.surfaces() {
        let Some(opposite) = data.opposite else {
            continue;
        };
        if model.surface(opposite)?.opposite != Some(surface_id) {
            return Err(ModelError::AssertionFailed(format!(
                "asymmetric opposite link on {surface_id:?}"
            ))
            .into());
        }
    }
    Ok(())
}

/// Converts the space-bound surfaces into output records and tallies the
/// level summary.
fn export(model: &BoundaryModel, ctx: &EqualityContext) -> Result<(Vec<Boundary>, LevelSummary)> {
    let mut ids: HashMap<SurfaceId, String> = HashMap::new();
    let mut exported: Vec<SurfaceId> = Vec::new();
    for (surface_id, data) in model.surfaces() {
        if data.space.is_some() {
            ids.insert(surface_id, format!("sb-{}", exported.len()));
            exported.push(surface_id);
        }
    }

    let mut boundaries = Vec::with_capacity(exported.len());
    let mut global = LevelCounts::default();
    let mut by_space: HashMap<SpaceId, LevelCounts> = HashMap::new();

    for surface_id in exported {
        let data = model.surface(surface_id)?;
        let space_id = data
            .space
            .ok_or(ModelError::EntityNotFound("bounding space"))?;
        let space = model.space(space_id)?;
        let element = match data.element {
            Some(element_id) => Some(model.element(element_id)?.name.clone()),
            None => None,
        };
        let loop_3d = data
            .face
            .outer_loops_3d(ctx)
            .into_iter()
            .next()
            .unwrap_or_default();
        let level = data.level.as_number();

        global.record(level, data.is_external, data.is_virtual);
        if !space.is_outside {
            by_space
                .entry(space_id)
                .or_default()
                .record(level, data.is_external, data.is_virtual);
        }

        boundaries.push(Boundary {
            id: ids[&surface_id].clone(),
            element,
            loop_3d,
            normal: data.face.outward_normal(ctx),
            opposite: data.opposite.and_then(|o| ids.get(&o).cloned()),
            parent: data.parent.and_then(|p| ids.get(&p).cloned()),
            space: space.name.clone(),
            layers: data
                .layers
                .iter()
                .map(|layer| (layer.material, layer.thickness))
                .collect(),
            level,
            is_external: data.is_external,
            is_virtual: data.is_virtual,
        });
    }

    let mut summary = LevelSummary {
        global,
        per_space: Vec::new(),
    };
    for (space_id, space) in model.spaces() {
        if space.is_outside {
            continue;
        }
        summary
            .per_space
            .push((space.name.clone(), by_space.remove(&space_id).unwrap_or_default()));
    }
    Ok((boundaries, summary))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::Solid;
    use crate::math::{Point3, Vector3};
    use crate::model::ElementKind;

    fn box_solid(origin: (f64, f64, f64), size: (f64, f64, f64)) -> Solid {
        let (x, y, z) = origin;
        let (dx, dy, _) = size;
        let base = vec![
            Point3::new(x, y, z),
            Point3::new(x + dx, y, z),
            Point3::new(x + dx, y + dy, z),
            Point3::new(x, y + dy, z),
        ];
        Solid::from_extrusion(base, Vector3::z(), size.2)
    }

    fn two_rooms_and_wall() -> (Vec<ElementInput>, Vec<SpaceInput>) {
        let elements = vec![ElementInput {
            name: "wall".into(),
            kind: ElementKind::Wall,
            material: 3,
            solid: box_solid((4.0, 0.0, 0.0), (0.2, 3.0, 2.5)),
        }];
        let spaces = vec![
            SpaceInput {
                name: "a".into(),
                solid: box_solid((0.0, 0.0, 0.0), (4.0, 3.0, 2.5)),
                is_outside: false,
            },
            SpaceInput {
                name: "b".into(),
                solid: box_solid((4.2, 0.0, 0.0), (4.0, 3.0, 2.5)),
                is_outside: false,
            },
            SpaceInput {
                name: "outside".into(),
                solid: Solid::from_faces(Vec::new()),
                is_outside: true,
            },
        ];
        (elements, spaces)
    }

    #[test]
    fn two_rooms_share_one_layered_boundary_pair() {
        let (elements, spaces) = two_rooms_and_wall();
        let mut diagnostics = Diagnostics::new();
        let result = run(&Config::default(), elements, spaces, &mut diagnostics).unwrap();

        assert_eq!(result.status, RunStatus::Clean);
        // 6 boundaries per room, 10 mirrored onto the outside.
        assert_eq!(result.boundaries.len(), 22);

        let layered: Vec<_> = result
            .boundaries
            .iter()
            .filter(|b| !b.layers.is_empty())
            .collect();
        assert_eq!(layered.len(), 2);
        for boundary in &layered {
            assert_eq!(boundary.layers, vec![(3, 0.2)]);
            assert_eq!(boundary.level, Some(2));
            assert!(!boundary.is_external);
            assert_eq!(boundary.element.as_deref(), Some("wall"));
        }
        // The pair references each other by id.
        assert_eq!(layered[0].opposite.as_deref(), Some(layered[1].id.as_str()));
        assert_eq!(layered[1].opposite.as_deref(), Some(layered[0].id.as_str()));

        assert_eq!(result.summary.global.two_internal, 2);
        assert_eq!(result.summary.global.two_external, 20);
        assert_eq!(result.summary.global.total(), 22);
        assert_eq!(result.summary.per_space.len(), 2);
        for (_, counts) in &result.summary.per_space {
            assert_eq!(counts.total(), 6);
        }
    }

    #[test]
    fn element_filter_removes_the_wall() {
        let (elements, spaces) = two_rooms_and_wall();
        let config = Config {
            element_filter: vec!["no-such-element".into()],
            ..Config::default()
        };
        let mut diagnostics = Diagnostics::new();
        let result = run(&config, elements, spaces, &mut diagnostics).unwrap();

        assert!(result.boundaries.iter().all(|b| b.layers.is_empty()));
    }

    #[test]
    fn space_filter_keeps_outside_space() {
        let (elements, spaces) = two_rooms_and_wall();
        let config = Config {
            space_filter: vec!["a".into()],
            ..Config::default()
        };
        let mut diagnostics = Diagnostics::new();
        let result = run(&config, elements, spaces, &mut diagnostics).unwrap();

        assert!(result.boundaries.iter().any(|b| b.space == "a"));
        assert!(result.boundaries.iter().any(|b| b.space == "outside"));
        assert!(result.boundaries.iter().all(|b| b.space != "b"));
    }

    #[test]
    fn window_gets_its_host_boundary() {
        let (mut elements, spaces) = two_rooms_and_wall();
        elements.push(ElementInput {
            name: "window".into(),
            kind: ElementKind::Window,
            material: 9,
            // Panel inside the wall, spanning its full thickness.
            solid: box_solid((4.0, 1.0, 0.8), (0.2, 1.0, 1.2)),
        });
        let mut diagnostics = Diagnostics::new();
        let result = run(&Config::default(), elements, spaces, &mut diagnostics).unwrap();

        let openings: Vec<_> = result
            .boundaries
            .iter()
            .filter(|b| b.parent.is_some())
            .collect();
        assert_eq!(openings.len(), 2);
        for opening in &openings {
            assert_eq!(opening.element.as_deref(), Some("window"));
            assert_eq!(opening.level, Some(2));
            let host = result
                .boundaries
                .iter()
                .find(|b| Some(&b.id) == opening.parent.as_ref())
                .unwrap();
            assert_eq!(host.element.as_deref(), Some("wall"));
            assert_eq!(opening.space, host.space);
        }
    }

    #[test]
    fn results_survive_element_and_space_reordering() {
        // Ids are assigned in discovery order, so compare boundaries by
        // an order-free signature instead.
        fn signature(result: &RunResult) -> Vec<String> {
            let mut signatures: Vec<String> = result
                .boundaries
                .iter()
                .map(|b| {
                    let mut points: Vec<String> = b
                        .loop_3d
                        .iter()
                        .map(|p| format!("({:.6},{:.6},{:.6})", p.x, p.y, p.z))
                        .collect();
                    points.sort();
                    format!(
                        "{} {:?} {:?} ext={} virt={} {:?} [{}]",
                        b.space,
                        b.element,
                        b.level,
                        b.is_external,
                        b.is_virtual,
                        b.layers,
                        points.join(" ")
                    )
                })
                .collect();
            signatures.sort();
            signatures
        }

        fn build(reversed: bool) -> RunResult {
            let (mut elements, mut spaces) = two_rooms_and_wall();
            elements.push(ElementInput {
                name: "window".into(),
                kind: ElementKind::Window,
                material: 9,
                solid: box_solid((4.0, 1.0, 0.8), (0.2, 1.0, 1.2)),
            });
            if reversed {
                elements.reverse();
                spaces.reverse();
            }
            let mut diagnostics = Diagnostics::new();
            run(&Config::default(), elements, spaces, &mut diagnostics).unwrap()
        }

        let forward = build(false);
        let backward = build(true);
        assert_eq!(signature(&forward), signature(&backward));
        assert_eq!(forward.summary.global, backward.summary.global);
        assert_eq!(forward.status, backward.status);
    }

    #[test]
    fn diagnostic_sinks_receive_the_stream() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let messages = Rc::new(RefCell::new(Vec::new()));
        let captured = Rc::clone(&messages);
        let mut diagnostics =
            Diagnostics::new().on_notify(Box::new(move |m| captured.borrow_mut().push(m.to_owned())));

        let (elements, spaces) = two_rooms_and_wall();
        run(&Config::default(), elements, spaces, &mut diagnostics).unwrap();
        assert!(!messages.borrow().is_empty());
    }
}
