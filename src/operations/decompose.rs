use tracing::{debug, warn};

use crate::error::Result;
use crate::geometry::{OrientedArea, Solid};
use crate::model::{BoundaryModel, ElementId, MaterialLayer, SurfaceData};
use crate::operations::blocking;
use crate::snap::EqualityContext;

/// Decomposes every element's solid into blocks and registers the block
/// faces as element surfaces.
///
/// Multi-volume solids are exploded and each volume decomposed on its
/// own. Elements whose geometry cannot be processed are skipped with a
/// warning; the run continues without them.
pub struct DecomposeElements {
    max_pair_distance: f64,
}

/// What decomposition produced and what it had to give up on.
#[derive(Debug, Default)]
pub struct DecomposeOutcome {
    pub blocks: usize,
    pub skipped: usize,
}

impl DecomposeElements {
    /// Creates the operation with the half-block pairing cutoff.
    #[must_use]
    pub fn new(max_pair_distance: f64) -> Self {
        Self { max_pair_distance }
    }

    /// Executes the decomposition over all elements in the model.
    ///
    /// # Errors
    ///
    /// Returns an error only for model-level failures; geometry errors
    /// are contained per element.
    pub fn execute(
        &self,
        model: &mut BoundaryModel,
        ctx: &mut EqualityContext,
    ) -> Result<DecomposeOutcome> {
        let mut outcome = DecomposeOutcome::default();
        let element_ids: Vec<ElementId> = model.elements().map(|(id, _)| id).collect();

        for element_id in element_ids {
            match element_face_sets(model, element_id, ctx) {
                Ok(face_sets) => {
                    let material = model.element(element_id)?.material;
                    for faces in face_sets {
                        let blocks = blocking::decompose(&faces, ctx, self.max_pair_distance);
                        outcome.blocks += blocks.len();
                        for block in blocks {
                            register_block(model, element_id, material, &block)?;
                        }
                    }
                }
                Err(error) if error.is_recoverable() => {
                    warn!(
                        element = %model.element(element_id)?.name,
                        %error,
                        "skipping element with unprocessable geometry"
                    );
                    outcome.skipped += 1;
                }
                Err(error) => return Err(error),
            }
        }
        debug!(blocks = outcome.blocks, skipped = outcome.skipped, "elements decomposed");
        Ok(outcome)
    }
}

/// The element's oriented faces, one set per disjoint volume.
fn element_face_sets(
    model: &mut BoundaryModel,
    element_id: ElementId,
    ctx: &mut EqualityContext,
) -> Result<Vec<Vec<OrientedArea>>> {
    if model.element_mut(element_id)?.solid.is_single_volume(ctx)? {
        let faces = model
            .element_mut(element_id)?
            .solid
            .oriented_faces(ctx)?
            .to_vec();
        return Ok(vec![faces]);
    }

    let solid = std::mem::replace(
        &mut model.element_mut(element_id)?.solid,
        Solid::from_faces(Vec::new()),
    );
    let mut face_sets = Vec::new();
    let mut all_faces = Vec::new();
    for mut volume in solid.into_single_volumes(ctx)? {
        let faces = volume.oriented_faces(ctx)?.to_vec();
        all_faces.extend(faces.iter().cloned());
        face_sets.push(faces);
    }
    model.element_mut(element_id)?.solid = Solid::from_faces(all_faces);
    Ok(face_sets)
}

/// Inserts the one or two surfaces of a block and links them as
/// opposites.
///
/// Only full blocks carry a material layer; a half-block has no far side
/// and so no measurable thickness to record.
fn register_block(
    model: &mut BoundaryModel,
    element_id: ElementId,
    material: i64,
    block: &blocking::Block,
) -> Result<()> {
    let mut front = SurfaceData::new(block.front().clone());
    front.element = Some(element_id);

    let Some(back_face) = block.back() else {
        model.add_surface(front);
        return Ok(());
    };

    let layer = MaterialLayer {
        material,
        thickness: block.thickness(),
    };
    front.layers.push(layer);
    let front_id = model.add_surface(front);

    let mut back = SurfaceData::new(back_face.clone());
    back.element = Some(element_id);
    back.layers.push(layer);
    let back_id = model.add_surface(back);
    model.link_opposites(front_id, back_id)?;
    Ok(())
}
