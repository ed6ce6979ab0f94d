use std::collections::HashMap;

use crate::error::{GeometryError, Result};
use crate::geometry::csg::CsgSolid;
use crate::geometry::oriented_area::OrientedArea;
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::snap::EqualityContext;

/// An extrusion definition: a planar base loop swept along a direction.
#[derive(Debug, Clone)]
pub struct Extrusion {
    /// Base footprint loop.
    pub base: Vec<Point3>,
    /// Sweep direction (need not be unit length).
    pub direction: Vector3,
    /// Sweep depth.
    pub depth: f64,
}

/// One boundary-representation face: an outer loop and optional void loops.
#[derive(Debug, Clone)]
pub struct BrepFace {
    pub outer: Vec<Point3>,
    pub voids: Vec<Vec<Point3>>,
}

/// The representation states a solid can be in.
///
/// Extrusion and b-rep are the cheap input forms. The first call to
/// [`Solid::oriented_faces`] promotes either to the oriented-face-group
/// form; the first call to [`Solid::subtract`] promotes to the exact
/// boolean form. Promotions are one-way and memoized.
#[derive(Debug, Clone)]
pub enum SolidForm {
    Extrusion(Extrusion),
    Brep(Vec<BrepFace>),
    Faces(Vec<OrientedArea>),
    Boolean(CsgSolid),
}

/// A solid 3D geometry with lazy promotion between representations.
#[derive(Debug, Clone)]
pub struct Solid {
    form: SolidForm,
}

impl Solid {
    /// Wraps an extrusion definition.
    #[must_use]
    pub fn from_extrusion(base: Vec<Point3>, direction: Vector3, depth: f64) -> Self {
        Self {
            form: SolidForm::Extrusion(Extrusion {
                base,
                direction,
                depth,
            }),
        }
    }

    /// Wraps a boundary representation.
    #[must_use]
    pub fn from_brep(faces: Vec<BrepFace>) -> Self {
        Self {
            form: SolidForm::Brep(faces),
        }
    }

    /// Wraps an already-decomposed oriented face group.
    #[must_use]
    pub fn from_faces(faces: Vec<OrientedArea>) -> Self {
        Self {
            form: SolidForm::Faces(faces),
        }
    }

    /// The current representation state.
    #[must_use]
    pub fn form(&self) -> &SolidForm {
        &self.form
    }

    /// Returns the solid's oriented faces, promoting the representation on
    /// first use.
    ///
    /// # Errors
    ///
    /// [`GeometryError::ShallowExtrusion`] if an extrusion's depth is below
    /// the context tolerance; [`GeometryError::VoidFace`] if a b-rep face
    /// carries a void loop; [`GeometryError::BadBrep`] if the b-rep is not a
    /// closed polyhedron.
    pub fn oriented_faces(&mut self, ctx: &mut EqualityContext) -> Result<&[OrientedArea]> {
        match &self.form {
            SolidForm::Faces(_) => {}
            SolidForm::Extrusion(extrusion) => {
                let faces = extrude_faces(extrusion, ctx)?;
                self.form = SolidForm::Faces(faces);
            }
            SolidForm::Brep(brep) => {
                let faces = brep_faces(brep, ctx)?;
                self.form = SolidForm::Faces(faces);
            }
            SolidForm::Boolean(csg) => {
                let faces = csg.to_faces(ctx);
                self.form = SolidForm::Faces(faces);
            }
        }
        match &self.form {
            SolidForm::Faces(faces) => Ok(faces),
            // promotion above always lands on Faces
            _ => unreachable!(),
        }
    }

    /// Whether the solid is one connected volume.
    ///
    /// Extrusions are single-volume by construction and answer without
    /// promotion.
    ///
    /// # Errors
    ///
    /// Propagates promotion errors for b-rep and boolean forms.
    pub fn is_single_volume(&mut self, ctx: &mut EqualityContext) -> Result<bool> {
        if matches!(self.form, SolidForm::Extrusion(_)) {
            return Ok(true);
        }
        let tolerance = ctx.tolerance();
        let faces = self.oriented_faces(ctx)?;
        Ok(volume_components(faces, ctx, tolerance).len() <= 1)
    }

    /// Splits the solid into its connected volumes.
    ///
    /// # Errors
    ///
    /// Propagates promotion errors.
    pub fn into_single_volumes(mut self, ctx: &mut EqualityContext) -> Result<Vec<Self>> {
        if matches!(self.form, SolidForm::Extrusion(_)) {
            return Ok(vec![self]);
        }
        let tolerance = ctx.tolerance();
        let faces = self.oriented_faces(ctx)?.to_vec();
        let components = volume_components(&faces, ctx, tolerance);
        if components.len() <= 1 {
            return Ok(vec![self]);
        }
        Ok(components
            .into_iter()
            .map(|indices| Self::from_faces(indices.into_iter().map(|i| faces[i].clone()).collect()))
            .collect())
    }

    /// Subtracts another solid, promoting both operands to the exact
    /// boolean form.
    ///
    /// # Errors
    ///
    /// Propagates promotion errors.
    pub fn subtract(&mut self, other: &mut Self, ctx: &mut EqualityContext) -> Result<Self> {
        let a = self.promote_boolean(ctx)?.clone();
        let b = other.promote_boolean(ctx)?.clone();
        Ok(Self {
            form: SolidForm::Boolean(a.difference(&b)),
        })
    }

    /// Promotes to the exact boolean form (irreversible, memoized).
    ///
    /// # Errors
    ///
    /// Propagates face promotion errors.
    pub fn promote_boolean(&mut self, ctx: &mut EqualityContext) -> Result<&CsgSolid> {
        if !matches!(self.form, SolidForm::Boolean(_)) {
            let faces = self.oriented_faces(ctx)?.to_vec();
            let csg = CsgSolid::from_faces(&faces, ctx)?;
            self.form = SolidForm::Boolean(csg);
        }
        match &self.form {
            SolidForm::Boolean(csg) => Ok(csg),
            _ => unreachable!(),
        }
    }
}

/// Drops consecutive duplicates and collinear vertices from a 3D loop.
fn dedup_collinear_3d(points: &[Point3]) -> Vec<Point3> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let prev = points[(i + n - 1) % n];
        let curr = points[i];
        let next = points[(i + 1) % n];
        if (curr - prev).norm() < TOLERANCE {
            continue;
        }
        let a = curr - prev;
        let b = next - curr;
        if a.cross(&b).norm() < TOLERANCE && a.dot(&b) > 0.0 {
            continue;
        }
        out.push(curr);
    }
    out
}

/// Converts an extrusion definition into oriented boundary faces.
///
/// The base loop is cleaned of redundant collinear vertices so every planar
/// side becomes exactly one face, then capped top and bottom.
fn extrude_faces(extrusion: &Extrusion, ctx: &mut EqualityContext) -> Result<Vec<OrientedArea>> {
    if extrusion.depth <= ctx.tolerance() {
        return Err(GeometryError::ShallowExtrusion {
            depth: extrusion.depth,
            tolerance: ctx.tolerance(),
        }
        .into());
    }
    let direction = ctx.request_direction(&extrusion.direction)?;
    let sweep = direction * extrusion.depth;

    let base = dedup_collinear_3d(&extrusion.base);
    if base.len() < 3 {
        return Err(GeometryError::Degenerate("extrusion base collapses".into()).into());
    }
    let normal = crate::math::polygon_2d::newell_normal(&base)?;

    // Order the base so its Newell normal aligns with the sweep direction:
    //   - bottom face = reversed base, outward against the sweep
    //   - top face = translated base, outward along the sweep
    //   - side quads face outward
    let base: Vec<Point3> = if normal.dot(&direction) > 0.0 {
        base
    } else {
        base.into_iter().rev().collect()
    };

    let bottom: Vec<Point3> = base.iter().rev().copied().collect();
    let top: Vec<Point3> = base.iter().map(|p| p + sweep).collect();

    let n = base.len();
    let mut faces = Vec::with_capacity(n + 2);
    faces.push(OrientedArea::from_loop(ctx, &bottom)?);
    faces.push(OrientedArea::from_loop(ctx, &top)?);
    for i in 0..n {
        let j = (i + 1) % n;
        let quad = [base[i], base[j], top[j], top[i]];
        faces.push(OrientedArea::from_loop(ctx, &quad)?);
    }
    Ok(faces)
}

/// Converts a boundary representation into oriented faces, verifying the
/// polyhedron is closed (every edge shared by exactly two faces).
fn brep_faces(brep: &[BrepFace], ctx: &mut EqualityContext) -> Result<Vec<OrientedArea>> {
    let tolerance = ctx.tolerance();
    let mut faces = Vec::with_capacity(brep.len());
    let mut edge_counts: HashMap<(EdgeKey, EdgeKey), u32> = HashMap::new();

    for face in brep {
        if !face.voids.is_empty() {
            return Err(GeometryError::VoidFace.into());
        }
        let snapped: Vec<Point3> = face.outer.iter().map(|p| ctx.request_point(p)).collect();
        let loop_pts = dedup_collinear_3d(&snapped);
        if loop_pts.len() < 3 {
            return Err(GeometryError::BadBrep("face collapses to a line".into()).into());
        }
        for i in 0..loop_pts.len() {
            let j = (i + 1) % loop_pts.len();
            let a = edge_key(&loop_pts[i], tolerance);
            let b = edge_key(&loop_pts[j], tolerance);
            let key = if a <= b { (a, b) } else { (b, a) };
            *edge_counts.entry(key).or_insert(0) += 1;
        }
        faces.push(OrientedArea::from_loop(ctx, &loop_pts)?);
    }

    if let Some((_, &count)) = edge_counts.iter().find(|(_, &c)| c != 2) {
        return Err(GeometryError::BadBrep(format!(
            "open polyhedron: an edge is used {count} time(s) instead of 2"
        ))
        .into());
    }
    Ok(faces)
}

type EdgeKey = (i64, i64, i64);

/// Quantizes a point onto the tolerance grid for edge-identity keys.
#[allow(clippy::cast_possible_truncation)]
fn edge_key(point: &Point3, tolerance: f64) -> EdgeKey {
    let q = |v: f64| (v / tolerance).round() as i64;
    (q(point.x), q(point.y), q(point.z))
}

/// Groups face indices into connected components over shared edges.
fn volume_components(
    faces: &[OrientedArea],
    ctx: &EqualityContext,
    tolerance: f64,
) -> Vec<Vec<usize>> {
    let mut edge_to_faces: HashMap<(EdgeKey, EdgeKey), Vec<usize>> = HashMap::new();
    for (index, face) in faces.iter().enumerate() {
        for loop_pts in face.outer_loops_3d(ctx) {
            for i in 0..loop_pts.len() {
                let j = (i + 1) % loop_pts.len();
                let a = edge_key(&loop_pts[i], tolerance);
                let b = edge_key(&loop_pts[j], tolerance);
                let key = if a <= b { (a, b) } else { (b, a) };
                edge_to_faces.entry(key).or_default().push(index);
            }
        }
    }

    // Union-find over face indices.
    let mut parent: Vec<usize> = (0..faces.len()).collect();
    fn find(parent: &mut Vec<usize>, i: usize) -> usize {
        if parent[i] != i {
            let root = find(parent, parent[i]);
            parent[i] = root;
        }
        parent[i]
    }
    for members in edge_to_faces.values() {
        for pair in members.windows(2) {
            let a = find(&mut parent, pair[0]);
            let b = find(&mut parent, pair[1]);
            if a != b {
                parent[a] = b;
            }
        }
    }

    let mut groups: HashMap<usize, Vec<usize>> = HashMap::new();
    for i in 0..faces.len() {
        let root = find(&mut parent, i);
        groups.entry(root).or_default().push(i);
    }
    let mut components: Vec<Vec<usize>> = groups.into_values().collect();
    components.sort_by_key(|c| c.first().copied());
    components
}
