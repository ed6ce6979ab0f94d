use crate::error::Result;
use crate::geometry::area::Area;
use crate::geometry::orientation::OrientationId;
use crate::math::polygon_2d::newell_normal;
use crate::math::{Point3, Vector3};
use crate::snap::EqualityContext;

/// A planar face: a pooled orientation, a signed plane offset, a 2D area in
/// the orientation's local frame, and a sense bit.
///
/// Height and sense together pick one unique supporting plane face: the
/// plane is `normal · x = height`, and sense distinguishes which of its two
/// face orientations is meant (`true` faces along the pooled normal).
#[derive(Debug, Clone)]
pub struct OrientedArea {
    orientation: OrientationId,
    height: f64,
    sense: bool,
    area: Area,
}

impl OrientedArea {
    /// Builds an oriented area from a 3D planar loop.
    ///
    /// Points are snapped through the context, the loop normal is
    /// canonicalized into an orientation, and the loop is flattened into the
    /// orientation's local frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the loop is degenerate.
    pub fn from_loop(ctx: &mut EqualityContext, points: &[Point3]) -> Result<Self> {
        let snapped: Vec<Point3> = points.iter().map(|p| ctx.request_point(p)).collect();
        let normal = newell_normal(&snapped)?;
        let (orientation, sense) = ctx.request_orientation(&normal)?;
        let frame = ctx.orientation(orientation);

        #[allow(clippy::cast_precision_loss)]
        let height = snapped.iter().map(|p| frame.height_of(p)).sum::<f64>() / snapped.len() as f64;
        let flat: Vec<_> = snapped.iter().map(|p| frame.flatten(p)).collect();

        Ok(Self {
            orientation,
            height,
            sense,
            area: Area::from_loop(&flat)?,
        })
    }

    /// Builds an oriented area from already-canonical parts.
    #[must_use]
    pub fn from_parts(orientation: OrientationId, height: f64, sense: bool, area: Area) -> Self {
        Self {
            orientation,
            height,
            sense,
            area,
        }
    }

    /// Returns a copy with the 2D area replaced.
    #[must_use]
    pub fn with_area(&self, area: Area) -> Self {
        Self {
            orientation: self.orientation,
            height: self.height,
            sense: self.sense,
            area,
        }
    }

    /// Returns a copy mirrored to the opposite sense on the same plane.
    #[must_use]
    pub fn mirrored(&self) -> Self {
        Self {
            orientation: self.orientation,
            height: self.height,
            sense: !self.sense,
            area: self.area.clone(),
        }
    }

    /// The pooled orientation id.
    #[must_use]
    pub fn orientation(&self) -> OrientationId {
        self.orientation
    }

    /// The signed plane offset (Hessian normal form).
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// The sense bit: `true` when the face looks along the pooled normal.
    #[must_use]
    pub fn sense(&self) -> bool {
        self.sense
    }

    /// The 2D area in the orientation's local frame.
    #[must_use]
    pub fn area(&self) -> &Area {
        &self.area
    }

    /// Mutable access to the 2D area.
    pub fn area_mut(&mut self) -> &mut Area {
        &mut self.area
    }

    /// The outward normal, taking the sense bit into account.
    #[must_use]
    pub fn outward_normal(&self, ctx: &EqualityContext) -> Vector3 {
        let n = *ctx.orientation(self.orientation).normal();
        if self.sense {
            n
        } else {
            -n
        }
    }

    /// Projects another face's polygon onto this face's plane, along this
    /// face's normal, and returns it as a 2D area in this face's frame.
    ///
    /// For faces sharing the orientation this is the identity on
    /// coordinates; for non-parallel faces it is a skewed shadow. Degenerate
    /// projections (near-perpendicular faces) come back empty.
    #[must_use]
    pub fn project_area(&self, other: &Self, ctx: &EqualityContext) -> Area {
        if other.orientation == self.orientation {
            return other.area.clone();
        }
        let own = ctx.orientation(self.orientation);
        let theirs = ctx.orientation(other.orientation);

        let mut acc = Area::empty();
        for piece in other.area.pieces() {
            let map = |pts: &[crate::math::Point2]| -> Vec<crate::math::Point2> {
                pts.iter()
                    .map(|q| own.flatten(&theirs.unflatten(q, other.height)))
                    .collect()
            };
            let Ok(outer) = Area::from_loop(&map(&piece.outer)) else {
                continue;
            };
            let mut projected = outer;
            for hole in &piece.holes {
                if let Ok(hole_area) = Area::from_loop(&map(hole)) {
                    projected = projected.difference(&hole_area);
                }
            }
            acc = acc.union(&projected);
        }
        acc
    }

    /// Converts the face's pieces back to 3D outer loops.
    ///
    /// Loops are wound so they circulate counter-clockwise around the
    /// outward normal.
    #[must_use]
    pub fn outer_loops_3d(&self, ctx: &EqualityContext) -> Vec<Vec<Point3>> {
        let frame = ctx.orientation(self.orientation);
        self.area
            .pieces()
            .iter()
            .map(|piece| {
                let mut points: Vec<Point3> = piece
                    .outer
                    .iter()
                    .map(|q| frame.unflatten(q, self.height))
                    .collect();
                if !self.sense {
                    points.reverse();
                }
                points
            })
            .collect()
    }
}

/// Tests whether two faces can bound one material layer.
///
/// True iff they share the orientation with opposite sense, sit on distinct
/// planes ordered consistently with their senses (the along-normal face
/// above the against-normal face), and carry equal 2D areas. Returns the
/// layer thickness.
#[must_use]
pub fn could_form_block(a: &OrientedArea, b: &OrientedArea, tolerance: f64) -> Option<f64> {
    if a.orientation != b.orientation || a.sense == b.sense {
        return None;
    }
    let (top, bottom) = if a.sense { (a, b) } else { (b, a) };
    let thickness = top.height - bottom.height;
    if thickness <= tolerance {
        return None;
    }
    if !top.area.equals(&bottom.area) {
        return None;
    }
    Some(thickness)
}
