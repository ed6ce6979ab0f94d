use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::error::Result;
use crate::geometry::{Area, OrientedArea};
use crate::model::{BoundaryModel, ElementId, MaterialLayer, SpaceId, SurfaceId};
use crate::snap::ScalarPool;

/// An element surface seen by the stacking traversal: a plane position
/// with the area still available for stacks to pass through.
#[derive(Debug)]
pub(crate) struct Region {
    pub surface: SurfaceId,
    pub element: Option<ElementId>,
    /// The material layer a stack picks up when it enters this region.
    pub layer: Option<MaterialLayer>,
    pub sense: bool,
    /// Canonical plane height, bit-exact within the group.
    pub height: u64,
    /// Remaining area; shrinks as stacks consume it.
    pub area: Area,
    /// Region backing this surface's opposite, the far side of its block.
    pub opposed: Option<usize>,
}

/// A space boundary face waiting to start or close a stack.
#[derive(Debug)]
pub(crate) struct SpaceFace {
    pub space: SpaceId,
    pub face: OrientedArea,
    pub sense: bool,
    pub height: u64,
    /// Remaining area; shrinks as portions are claimed or closed.
    pub area: Area,
}

/// All regions and space faces sharing one orientation.
#[derive(Debug)]
pub(crate) struct Group {
    pub regions: Vec<Region>,
    pub space_faces: Vec<SpaceFace>,
}

/// Partitions element surfaces and space faces by orientation and builds
/// the region graph for each group.
///
/// Heights are canonicalized through a per-group scalar pool so faces on
/// the same plane compare bit-equal even when their raw offsets differ
/// within tolerance.
pub(crate) fn build_groups(
    model: &BoundaryModel,
    space_faces: &[(SpaceId, OrientedArea)],
    tolerance: f64,
) -> Result<Vec<Group>> {
    let mut drafts: BTreeMap<usize, Group> = BTreeMap::new();
    let mut pools: BTreeMap<usize, ScalarPool> = BTreeMap::new();
    let mut region_of: HashMap<SurfaceId, (usize, usize)> = HashMap::new();

    for (surface_id, data) in model.surfaces() {
        let Some(element_id) = data.element else {
            continue;
        };
        if model.element(element_id)?.kind.is_fenestration() {
            continue;
        }
        let key = data.face.orientation().index();
        let pool = pools
            .entry(key)
            .or_insert_with(|| ScalarPool::new(tolerance));
        let group = drafts.entry(key).or_insert_with(|| Group {
            regions: Vec::new(),
            space_faces: Vec::new(),
        });
        region_of.insert(surface_id, (key, group.regions.len()));
        group.regions.push(Region {
            surface: surface_id,
            element: data.element,
            layer: data.layers.first().copied(),
            sense: data.face.sense(),
            height: pool.request(data.face.height()).to_bits(),
            area: data.face.area().clone(),
            opposed: None,
        });
    }

    // Opposed links follow the surfaces' opposite links, which at this
    // point only connect the two sides of a block.
    for (surface_id, data) in model.surfaces() {
        let Some(opposite) = data.opposite else {
            continue;
        };
        if let (Some(&(key, here)), Some(&(_, there))) =
            (region_of.get(&surface_id), region_of.get(&opposite))
        {
            if let Some(group) = drafts.get_mut(&key) {
                group.regions[here].opposed = Some(there);
            }
        }
    }

    for (space, face) in space_faces {
        let key = face.orientation().index();
        let pool = pools
            .entry(key)
            .or_insert_with(|| ScalarPool::new(tolerance));
        let group = drafts.entry(key).or_insert_with(|| Group {
            regions: Vec::new(),
            space_faces: Vec::new(),
        });
        group.space_faces.push(SpaceFace {
            space: *space,
            face: face.clone(),
            sense: face.sense(),
            height: pool.request(face.height()).to_bits(),
            area: face.area().clone(),
        });
    }

    Ok(drafts.into_values().collect())
}
