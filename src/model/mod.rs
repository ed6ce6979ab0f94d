pub mod element;
pub mod space;
pub mod surface;

pub use element::{ElementData, ElementId, ElementKind};
pub use space::{SpaceData, SpaceId};
pub use surface::{Level, MaterialLayer, SurfaceData, SurfaceId};

use crate::error::ModelError;
use slotmap::SlotMap;

/// Central arena that owns all model entities.
///
/// Entities reference each other via typed ids (generational indices); the
/// opposite/parent/space links on surfaces are plain optional ids with no
/// ownership implied, so reference cycles are harmless.
#[derive(Debug, Default)]
pub struct BoundaryModel {
    elements: SlotMap<ElementId, ElementData>,
    spaces: SlotMap<SpaceId, SpaceData>,
    surfaces: SlotMap<SurfaceId, SurfaceData>,
}

impl BoundaryModel {
    /// Creates a new, empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Element operations ---

    /// Inserts an element and returns its id.
    pub fn add_element(&mut self, data: ElementData) -> ElementId {
        self.elements.insert(data)
    }

    /// Returns a reference to the element data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn element(&self, id: ElementId) -> Result<&ElementData, ModelError> {
        self.elements
            .get(id)
            .ok_or(ModelError::EntityNotFound("element"))
    }

    /// Returns a mutable reference to the element data, or an error if not
    /// found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn element_mut(&mut self, id: ElementId) -> Result<&mut ElementData, ModelError> {
        self.elements
            .get_mut(id)
            .ok_or(ModelError::EntityNotFound("element"))
    }

    /// Iterates elements in insertion order.
    pub fn elements(&self) -> impl Iterator<Item = (ElementId, &ElementData)> {
        self.elements.iter()
    }

    // --- Space operations ---

    /// Inserts a space and returns its id.
    pub fn add_space(&mut self, data: SpaceData) -> SpaceId {
        self.spaces.insert(data)
    }

    /// Returns a reference to the space data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn space(&self, id: SpaceId) -> Result<&SpaceData, ModelError> {
        self.spaces
            .get(id)
            .ok_or(ModelError::EntityNotFound("space"))
    }

    /// Returns a mutable reference to the space data, or an error if not
    /// found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn space_mut(&mut self, id: SpaceId) -> Result<&mut SpaceData, ModelError> {
        self.spaces
            .get_mut(id)
            .ok_or(ModelError::EntityNotFound("space"))
    }

    /// Iterates spaces in insertion order.
    pub fn spaces(&self) -> impl Iterator<Item = (SpaceId, &SpaceData)> {
        self.spaces.iter()
    }

    /// The designated outside space, if one exists.
    #[must_use]
    pub fn outside_space(&self) -> Option<SpaceId> {
        self.spaces
            .iter()
            .find(|(_, data)| data.is_outside)
            .map(|(id, _)| id)
    }

    // --- Surface operations ---

    /// Inserts a surface and returns its id.
    pub fn add_surface(&mut self, data: SurfaceData) -> SurfaceId {
        self.surfaces.insert(data)
    }

    /// Returns a reference to the surface data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn surface(&self, id: SurfaceId) -> Result<&SurfaceData, ModelError> {
        self.surfaces
            .get(id)
            .ok_or(ModelError::EntityNotFound("surface"))
    }

    /// Returns a mutable reference to the surface data, or an error if not
    /// found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn surface_mut(&mut self, id: SurfaceId) -> Result<&mut SurfaceData, ModelError> {
        self.surfaces
            .get_mut(id)
            .ok_or(ModelError::EntityNotFound("surface"))
    }

    /// Iterates surfaces in insertion order.
    pub fn surfaces(&self) -> impl Iterator<Item = (SurfaceId, &SurfaceData)> {
        self.surfaces.iter()
    }

    /// Number of surfaces in the store.
    #[must_use]
    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Links two surfaces as opposites.
    ///
    /// The link is symmetric and may be set at most once per pair.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::AssertionFailed`] if either surface already has
    /// an opposite, or [`ModelError::EntityNotFound`] for a dangling id.
    pub fn link_opposites(&mut self, a: SurfaceId, b: SurfaceId) -> Result<(), ModelError> {
        if self.surface(a)?.opposite.is_some() || self.surface(b)?.opposite.is_some() {
            return Err(ModelError::AssertionFailed(
                "opposite link set more than once".into(),
            ));
        }
        self.surface_mut(a)?.opposite = Some(b);
        self.surface_mut(b)?.opposite = Some(a);
        Ok(())
    }
}
