use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::error::{OperationError, Result};
use crate::geometry::{Area, OrientedArea};
use crate::model::{BoundaryModel, ElementId, MaterialLayer, SpaceId, SurfaceData};
use crate::operations::stacking::region::{build_groups, Group};
use crate::snap::EqualityContext;

/// Hard limit on how many material layers a single stack may traverse
/// before the geometry is declared too intricate.
const MAX_STACK_DEPTH: usize = 64;

/// Builds space boundaries by stacking through element blocks.
///
/// For every face of every space, descend along the face normal through
/// the blocks ahead until another space face closes the boundary or the
/// material runs out, accumulating the material layers crossed. Each
/// finalized portion becomes one or two mirrored, opposite-linked
/// surfaces in the model.
#[derive(Default)]
pub struct BuildStacks;

/// What stacking produced across all spaces.
#[derive(Debug, Default)]
pub struct StackOutcome {
    pub boundaries: usize,
    /// True when at least one space was abandoned as too complicated.
    pub degraded: bool,
}

/// One in-flight descent: a portion of a space face part-way through the
/// construction ahead of it.
///
/// Stacks are copy-on-branch: when the area ahead splits over several
/// candidate regions, each portion continues as its own cloned stack and
/// no state is shared between the branches.
#[derive(Debug, Clone)]
struct Stack {
    space: SpaceId,
    start: OrientedArea,
    sense: bool,
    /// Canonical height bits of the plane the stack currently sits on.
    height: u64,
    area: Area,
    layers: Vec<MaterialLayer>,
    first_element: Option<ElementId>,
    last_element: Option<ElementId>,
    depth: usize,
}

impl BuildStacks {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes stacking over all non-outside spaces.
    ///
    /// # Errors
    ///
    /// Geometry failures and over-deep descents abandon the affected
    /// space and mark the outcome degraded; only model-level failures
    /// propagate.
    pub fn execute(
        &self,
        model: &mut BoundaryModel,
        ctx: &mut EqualityContext,
    ) -> Result<StackOutcome> {
        let mut outcome = StackOutcome::default();
        let space_faces = collect_space_faces(model, ctx)?;
        let mut groups = build_groups(model, &space_faces, ctx.tolerance())?;

        let mut finalizer = Finalizer {
            model,
            boundaries: 0,
        };
        for group in &mut groups {
            for root in 0..group.space_faces.len() {
                match descend_root(group, root, &mut finalizer) {
                    Ok(()) => {}
                    Err(error) if error.is_degrading() => {
                        warn!(%error, "abandoning space face stack");
                        outcome.degraded = true;
                    }
                    Err(error) => return Err(error),
                }
            }
        }
        outcome.boundaries = finalizer.boundaries;
        debug!(
            boundaries = outcome.boundaries,
            degraded = outcome.degraded,
            "stack construction finished"
        );
        Ok(outcome)
    }
}

/// Oriented faces of every non-outside space, in model order. Spaces with
/// unprocessable geometry are skipped with a warning.
fn collect_space_faces(
    model: &mut BoundaryModel,
    ctx: &mut EqualityContext,
) -> Result<Vec<(SpaceId, OrientedArea)>> {
    let space_ids: Vec<SpaceId> = model.spaces().map(|(id, _)| id).collect();
    let mut faces = Vec::new();
    for space_id in space_ids {
        if model.space(space_id)?.is_outside {
            continue;
        }
        match model.space_mut(space_id)?.solid.oriented_faces(ctx) {
            Ok(space_faces) => {
                let owned: Vec<OrientedArea> = space_faces.to_vec();
                faces.extend(owned.into_iter().map(|face| (space_id, face)));
            }
            Err(error) if error.is_recoverable() => {
                warn!(
                    space = %model.space(space_id)?.name,
                    %error,
                    "skipping space with unprocessable geometry"
                );
            }
            Err(error) => return Err(error),
        }
    }
    Ok(faces)
}

/// Runs one space face's descent to completion through a FIFO worklist.
fn descend_root(group: &mut Group, root: usize, finalizer: &mut Finalizer<'_>) -> Result<()> {
    let seed = {
        let face = &mut group.space_faces[root];
        if face.area.is_empty() {
            return Ok(());
        }
        let stack = Stack {
            space: face.space,
            start: face.face.clone(),
            sense: face.sense,
            height: face.height,
            area: face.area.clone(),
            layers: Vec::new(),
            first_element: None,
            last_element: None,
            depth: 0,
        };
        // The whole face is now owned by its stack; closers from later
        // roots must not find it again.
        face.area = Area::empty();
        stack
    };

    let mut worklist = VecDeque::new();
    worklist.push_back(seed);
    while let Some(stack) = worklist.pop_front() {
        step(stack, group, finalizer, &mut worklist)?;
    }
    Ok(())
}

/// Advances one stack by one plane: close against opposing space faces,
/// branch into the regions ahead, exteriorize whatever remains uncovered.
fn step(
    mut stack: Stack,
    group: &mut Group,
    finalizer: &mut Finalizer<'_>,
    worklist: &mut VecDeque<Stack>,
) -> Result<()> {
    if stack.area.is_empty() {
        return Ok(());
    }

    // (1) Opposing space faces on this plane close the boundary.
    for index in 0..group.space_faces.len() {
        let face = &group.space_faces[index];
        if face.height != stack.height || face.sense == stack.sense || face.area.is_empty() {
            continue;
        }
        let portion = stack.area.intersection(&face.area);
        if portion.is_empty() {
            continue;
        }
        let closer_space = face.space;
        let closer_face = face.face.clone();
        group.space_faces[index].area = group.space_faces[index].area.difference(&portion);
        stack.area = stack.area.difference(&portion);
        finalizer.finalize_pair(&stack, &portion, closer_space, &closer_face)?;
        if stack.area.is_empty() {
            return Ok(());
        }
    }

    // (2) Step into the regions ahead; each one branches off a child.
    for index in 0..group.regions.len() {
        let region = &group.regions[index];
        if region.height != stack.height || region.sense == stack.sense || region.area.is_empty() {
            continue;
        }
        let portion = stack.area.intersection(&region.area);
        if portion.is_empty() {
            continue;
        }
        group.regions[index].area = group.regions[index].area.difference(&portion);
        stack.area = stack.area.difference(&portion);

        let region = &group.regions[index];
        let mut child = stack.clone();
        child.area = portion.clone();
        child.depth = stack.depth + 1;
        if child.depth > MAX_STACK_DEPTH {
            return Err(OperationError::TooComplicated(format!(
                "stack deeper than {MAX_STACK_DEPTH} layers"
            ))
            .into());
        }
        if let Some(layer) = region.layer {
            child.layers.push(layer);
        }
        if child.first_element.is_none() {
            child.first_element = region.element;
        }
        child.last_element = region.element;

        match region.opposed {
            Some(far_index) => {
                let far = &group.regions[far_index];
                // Heights here are relative to the shared start plane;
                // the base term is omitted and cancels in comparisons.
                let ahead = relative_height(stack.sense, f64::from_bits(far.height))
                    > relative_height(stack.sense, f64::from_bits(region.height));
                if !ahead {
                    finalizer.finalize_exterior(&child)?;
                    continue;
                }
                child.height = far.height;
                group.regions[far_index].area =
                    group.regions[far_index].area.difference(&portion);
                worklist.push_back(child);
            }
            // A half-block has no far side; the stack ends in material.
            None => finalizer.finalize_exterior(&child)?,
        }
        if stack.area.is_empty() {
            return Ok(());
        }
    }

    // (3) Nothing ahead: the rest of this stack faces the exterior.
    finalizer.finalize_exterior(&stack)
}

/// Height of a plane as seen by a stack traveling with the given sense.
///
/// Only valid for comparing two heights reached from the same base face.
fn relative_height(sense: bool, height: f64) -> f64 {
    if sense {
        height
    } else {
        -height
    }
}

/// Turns finalized stack portions into model surfaces.
struct Finalizer<'a> {
    model: &'a mut BoundaryModel,
    boundaries: usize,
}

impl Finalizer<'_> {
    /// A stack portion that reached an opposing space face: two mirrored
    /// surfaces, one per space, opposite-linked.
    fn finalize_pair(
        &mut self,
        stack: &Stack,
        portion: &Area,
        closer_space: SpaceId,
        closer_face: &OrientedArea,
    ) -> Result<()> {
        let is_virtual = stack.layers.is_empty();

        // One surface pair per disjoint piece, so every boundary has a
        // single outer loop.
        for piece in portion.split_pieces() {
            let mut near = SurfaceData::new(stack.start.with_area(piece.clone()));
            near.space = Some(stack.space);
            near.element = stack.first_element;
            near.layers = stack.layers.clone();
            near.is_virtual = is_virtual;

            let mut far = SurfaceData::new(closer_face.with_area(piece));
            far.space = Some(closer_space);
            far.element = stack.last_element;
            far.layers = stack.layers.iter().rev().copied().collect();
            far.is_virtual = is_virtual;

            let near_id = self.model.add_surface(near);
            let far_id = self.model.add_surface(far);
            self.model.link_opposites(near_id, far_id)?;
            self.model.space_mut(stack.space)?.surfaces.push(near_id);
            self.model.space_mut(closer_space)?.surfaces.push(far_id);
            self.boundaries += 2;
        }
        Ok(())
    }

    /// A stack portion with nothing left ahead of it: an external
    /// boundary, mirrored onto the outside space when one exists.
    fn finalize_exterior(&mut self, stack: &Stack) -> Result<()> {
        if stack.area.is_empty() {
            return Ok(());
        }
        for piece in stack.area.split_pieces() {
            let mut near = SurfaceData::new(stack.start.with_area(piece.clone()));
            near.space = Some(stack.space);
            near.element = stack.first_element;
            near.layers = stack.layers.clone();
            near.is_external = true;
            let near_id = self.model.add_surface(near);
            self.model.space_mut(stack.space)?.surfaces.push(near_id);
            self.boundaries += 1;

            if let Some(outside) = self.model.outside_space() {
                let face = OrientedArea::from_parts(
                    stack.start.orientation(),
                    f64::from_bits(stack.height),
                    !stack.sense,
                    piece,
                );
                let mut far = SurfaceData::new(face);
                far.space = Some(outside);
                far.element = stack.last_element;
                far.layers = stack.layers.iter().rev().copied().collect();
                far.is_external = true;
                let far_id = self.model.add_surface(far);
                self.model.link_opposites(near_id, far_id)?;
                self.model.space_mut(outside)?.surfaces.push(far_id);
                self.boundaries += 1;
            }
        }
        Ok(())
    }
}
