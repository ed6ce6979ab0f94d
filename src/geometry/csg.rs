//! Conversions between oriented faces and the exact polyhedral boolean
//! form backed by csgrs.

use std::fmt;
use std::sync::OnceLock;

use csgrs::mesh::{polygon::Polygon, vertex::Vertex, Mesh as CsgMesh};
use csgrs::traits::CSG;

use crate::error::{GeometryError, Result};
use crate::geometry::oriented_area::OrientedArea;
use crate::snap::EqualityContext;

/// A solid held in exact polyhedral boolean form.
pub struct CsgSolid {
    mesh: CsgMesh<()>,
}

impl fmt::Debug for CsgSolid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsgSolid")
            .field("polygons", &self.mesh.polygons.len())
            .finish()
    }
}

impl Clone for CsgSolid {
    fn clone(&self) -> Self {
        Self {
            mesh: CsgMesh {
                polygons: self.mesh.polygons.clone(),
                bounding_box: OnceLock::new(),
                metadata: None,
            },
        }
    }
}

impl CsgSolid {
    /// Builds the boolean form from a closed set of oriented faces.
    ///
    /// Faces are triangulated (csgrs expects convex polygons) and wound so
    /// each triangle's plane normal matches the face's outward normal.
    ///
    /// # Errors
    ///
    /// Returns an error if a face cannot be triangulated.
    pub fn from_faces(faces: &[OrientedArea], ctx: &EqualityContext) -> Result<Self> {
        let mut polygons = Vec::new();
        for face in faces {
            let frame = ctx.orientation(face.orientation());
            let normal = face.outward_normal(ctx);
            for triangle in face.area().convex_pieces()? {
                let mut corners = triangle;
                if !face.sense() {
                    corners.reverse();
                }
                let vertices: Vec<Vertex> = corners
                    .iter()
                    .map(|q| Vertex::new(frame.unflatten(q, face.height()), normal))
                    .collect();
                polygons.push(Polygon::new(vertices, None));
            }
        }
        if polygons.is_empty() {
            return Err(GeometryError::Degenerate("solid has no faces".into()).into());
        }
        Ok(Self {
            mesh: CsgMesh::from_polygons(&polygons, None),
        })
    }

    /// Extracts the boolean form's polygons back into oriented faces.
    ///
    /// Degenerate result polygons (slivers from the boolean) are dropped.
    pub fn to_faces(&self, ctx: &mut EqualityContext) -> Vec<OrientedArea> {
        let mut faces = Vec::new();
        for polygon in &self.mesh.polygons {
            if polygon.vertices.len() < 3 {
                continue;
            }
            let points: Vec<crate::math::Point3> =
                polygon.vertices.iter().map(|v| v.pos).collect();
            if let Ok(face) = OrientedArea::from_loop(ctx, &points) {
                faces.push(face);
            }
        }
        faces
    }

    /// Boolean difference `self - other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        Self {
            mesh: self.mesh.difference(&other.mesh),
        }
    }

    /// Whether the two solids share any volume.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        !self.mesh.intersection(&other.mesh).polygons.is_empty()
    }

    /// Number of polygons in the boolean form.
    #[must_use]
    pub fn polygon_count(&self) -> usize {
        self.mesh.polygons.len()
    }
}
