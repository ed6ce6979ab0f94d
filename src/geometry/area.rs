use std::collections::{HashMap, HashSet, VecDeque};

use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use spade::handles::FixedFaceHandle;
use spade::{
    ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation,
};

use crate::error::{GeometryError, Result};
use crate::math::polygon_2d::{
    bounding_box, boxes_overlap, dedup_collinear, ensure_ccw, loops_equal, point_in_loop,
    signed_area,
};
use crate::math::{Point2, TOLERANCE};

/// Contours smaller than this are treated as numerical slivers and dropped.
const MIN_PIECE_AREA: f64 = 1e-9;

/// Coordinate epsilon for the identical-simple-region fast paths.
const EPS: f64 = 1e-9;

/// One connected region: an outer loop plus zero or more hole loops.
#[derive(Debug, Clone)]
pub struct Piece {
    /// Counter-clockwise outer boundary.
    pub outer: Vec<Point2>,
    /// Clockwise hole boundaries.
    pub holes: Vec<Vec<Point2>>,
}

/// A 2D region, possibly multiply-connected.
///
/// Two representations: `Simple` is a single validated counter-clockwise
/// loop and supports cheap short-circuit comparisons; `General` is the full
/// polygon-set form produced by set algebra. Promotion from simple to
/// general is one-way and lazy.
#[derive(Debug, Clone)]
pub struct Area {
    repr: AreaRepr,
}

#[derive(Debug, Clone)]
enum AreaRepr {
    Simple(Vec<Point2>),
    General(Vec<Piece>),
}

impl Area {
    /// Builds an area from a single loop.
    ///
    /// The loop is cleaned of duplicate and collinear vertices and reordered
    /// counter-clockwise.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] if fewer than three distinct
    /// vertices remain or the loop spans no area.
    pub fn from_loop(points: &[Point2]) -> Result<Self> {
        let cleaned = dedup_collinear(points);
        if cleaned.len() < 3 {
            return Err(GeometryError::Degenerate("loop has fewer than 3 vertices".into()).into());
        }
        if signed_area(&cleaned).abs() < TOLERANCE {
            return Err(GeometryError::Degenerate("loop spans no area".into()).into());
        }
        Ok(Self {
            repr: AreaRepr::Simple(ensure_ccw(&cleaned)),
        })
    }

    /// Builds an area as the union of several loops.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] if no loop is valid.
    pub fn from_loops(loops: &[Vec<Point2>]) -> Result<Self> {
        let mut valid: Vec<Area> = Vec::new();
        for points in loops {
            if let Ok(area) = Self::from_loop(points) {
                valid.push(area);
            }
        }
        let Some(mut acc) = valid.first().cloned() else {
            return Err(GeometryError::Degenerate("no valid loop".into()).into());
        };
        for area in &valid[1..] {
            acc = acc.union(area);
        }
        Ok(acc)
    }

    /// The empty region.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            repr: AreaRepr::General(Vec::new()),
        }
    }

    /// Whether the region is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match &self.repr {
            AreaRepr::Simple(_) => false,
            AreaRepr::General(pieces) => pieces.is_empty(),
        }
    }

    /// Unsigned total area of the region (outer areas minus holes).
    #[must_use]
    pub fn measure(&self) -> f64 {
        match &self.repr {
            AreaRepr::Simple(outer) => signed_area(outer),
            AreaRepr::General(pieces) => pieces
                .iter()
                .map(|p| {
                    signed_area(&p.outer).abs()
                        - p.holes.iter().map(|h| signed_area(h).abs()).sum::<f64>()
                })
                .sum(),
        }
    }

    /// Axis-aligned bounding box over all outer loops.
    #[must_use]
    pub fn bounding_box(&self) -> Option<(Point2, Point2)> {
        match &self.repr {
            AreaRepr::Simple(outer) => bounding_box(outer),
            AreaRepr::General(pieces) => {
                let mut boxes = pieces.iter().filter_map(|p| bounding_box(&p.outer));
                let mut acc = boxes.next()?;
                for (min, max) in boxes {
                    acc.0.x = acc.0.x.min(min.x);
                    acc.0.y = acc.0.y.min(min.y);
                    acc.1.x = acc.1.x.max(max.x);
                    acc.1.y = acc.1.y.max(max.y);
                }
                Some(acc)
            }
        }
    }

    /// Promotes the representation to the general polygon-set form.
    ///
    /// One-way: a promoted area never returns to the simple form.
    pub fn promote(&mut self) {
        if let AreaRepr::Simple(outer) = &self.repr {
            self.repr = AreaRepr::General(vec![Piece {
                outer: outer.clone(),
                holes: Vec::new(),
            }]);
        }
    }

    /// Intersection of two regions.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        if let Some(result) = self.identical_fast_path(other) {
            return result;
        }
        if !self.boxes_touch(other) {
            return Self::empty();
        }
        self.overlay(other, OverlayRule::Intersect)
    }

    /// Difference `self - other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        if self.identical_fast_path(other).is_some() {
            return Self::empty();
        }
        if !self.boxes_touch(other) {
            return self.clone();
        }
        self.overlay(other, OverlayRule::Difference)
    }

    /// Symmetric difference of two regions.
    #[must_use]
    pub fn symmetric_difference(&self, other: &Self) -> Self {
        if self.identical_fast_path(other).is_some() {
            return Self::empty();
        }
        self.overlay(other, OverlayRule::Xor)
    }

    /// Union of two regions.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        if let Some(result) = self.identical_fast_path(other) {
            return result;
        }
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        self.overlay(other, OverlayRule::Union)
    }

    /// Whether the two regions cover the same point set.
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        if self.identical_fast_path(other).is_some() {
            return true;
        }
        if self.is_empty() || other.is_empty() {
            return self.is_empty() && other.is_empty();
        }
        if !self.boxes_touch(other) {
            return false;
        }
        self.symmetric_difference(other).is_empty()
    }

    /// Whether this region contains the other (`self >= other`).
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        if self.identical_fast_path(other).is_some() {
            return true;
        }
        other.difference(self).is_empty()
    }

    /// Whether the two regions share any area.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        if self.identical_fast_path(other).is_some() {
            return !self.is_empty();
        }
        if !self.boxes_touch(other) {
            return false;
        }
        !self.intersection(other).is_empty()
    }

    /// Point-membership query. Boundary points count as inside.
    #[must_use]
    pub fn contains_point(&self, point: Point2) -> bool {
        match &self.repr {
            AreaRepr::Simple(outer) => point_in_loop(point, outer),
            AreaRepr::General(pieces) => pieces.iter().any(|p| {
                point_in_loop(point, &p.outer)
                    && !p
                        .holes
                        .iter()
                        .any(|h| point_in_loop(point, h) && !on_loop_boundary(point, h))
            }),
        }
    }

    /// Enumerates the region as polygon-with-holes pieces.
    #[must_use]
    pub fn pieces(&self) -> Vec<Piece> {
        match &self.repr {
            AreaRepr::Simple(outer) => vec![Piece {
                outer: outer.clone(),
                holes: Vec::new(),
            }],
            AreaRepr::General(pieces) => pieces.clone(),
        }
    }

    /// Splits a multi-piece region into one single-piece area per piece.
    #[must_use]
    pub fn split_pieces(&self) -> Vec<Self> {
        match &self.repr {
            AreaRepr::Simple(_) => vec![self.clone()],
            AreaRepr::General(pieces) => pieces
                .iter()
                .map(|p| Self {
                    repr: AreaRepr::General(vec![p.clone()]),
                })
                .collect(),
        }
    }

    /// Enumerates the region as simple convex pieces (triangles from a
    /// constrained Delaunay triangulation).
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] if triangulation fails.
    pub fn convex_pieces(&self) -> Result<Vec<[Point2; 3]>> {
        let mut triangles = Vec::new();
        for piece in self.pieces() {
            triangulate_piece(&piece, &mut triangles)?;
        }
        Ok(triangles)
    }

    /// A point strictly interior to the region, if one exists.
    ///
    /// Taken as the centroid of the largest triangle of the triangulation,
    /// which is interior for any valid piece.
    #[must_use]
    pub fn representative_point(&self) -> Option<Point2> {
        let triangles = self.convex_pieces().ok()?;
        let best = triangles.iter().max_by(|a, b| {
            triangle_area(a)
                .partial_cmp(&triangle_area(b))
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        Some(Point2::new(
            (best[0].x + best[1].x + best[2].x) / 3.0,
            (best[0].y + best[1].y + best[2].y) / 3.0,
        ))
    }

    // --- Representation plumbing ---

    /// Identical-simple-region short-circuit. Returns a clone of `self` when
    /// both areas are simple and describe the same loop.
    fn identical_fast_path(&self, other: &Self) -> Option<Self> {
        if let (AreaRepr::Simple(a), AreaRepr::Simple(b)) = (&self.repr, &other.repr) {
            if loops_equal(a, b, EPS) {
                return Some(self.clone());
            }
        }
        None
    }

    fn boxes_touch(&self, other: &Self) -> bool {
        match (self.bounding_box(), other.bounding_box()) {
            (Some(a), Some(b)) => boxes_overlap(&a, &b),
            _ => false,
        }
    }

    fn to_paths(&self) -> Vec<Vec<[f64; 2]>> {
        match &self.repr {
            AreaRepr::Simple(outer) => vec![loop_to_path(outer)],
            AreaRepr::General(pieces) => {
                let mut paths = Vec::new();
                for piece in pieces {
                    paths.push(loop_to_path(&piece.outer));
                    for hole in &piece.holes {
                        paths.push(loop_to_path(hole));
                    }
                }
                paths
            }
        }
    }

    fn overlay(&self, other: &Self, rule: OverlayRule) -> Self {
        let subject = self.to_paths();
        let clip = other.to_paths();
        let shapes = subject.overlay(&clip, rule, FillRule::EvenOdd);
        Self {
            repr: AreaRepr::General(shapes_to_pieces(&shapes)),
        }
    }
}

fn loop_to_path(points: &[Point2]) -> Vec<[f64; 2]> {
    points.iter().map(|p| [p.x, p.y]).collect()
}

fn path_to_loop(path: &[[f64; 2]]) -> Vec<Point2> {
    path.iter().map(|p| Point2::new(p[0], p[1])).collect()
}

/// Converts i_overlay result shapes (shape -> contours -> points, first
/// contour outer, rest holes) into pieces, dropping numerical slivers.
fn shapes_to_pieces(shapes: &[Vec<Vec<[f64; 2]>>]) -> Vec<Piece> {
    let mut pieces = Vec::new();
    for shape in shapes {
        let Some(outer_path) = shape.first() else {
            continue;
        };
        let outer = path_to_loop(outer_path);
        if outer.len() < 3 || signed_area(&outer).abs() < MIN_PIECE_AREA {
            continue;
        }
        let holes = shape[1..]
            .iter()
            .map(|path| path_to_loop(path))
            .filter(|hole| hole.len() >= 3 && signed_area(hole).abs() >= MIN_PIECE_AREA)
            .collect();
        pieces.push(Piece { outer, holes });
    }
    pieces
}

fn on_loop_boundary(point: Point2, points: &[Point2]) -> bool {
    let n = points.len();
    let mut j = n - 1;
    for i in 0..n {
        let a = points[i];
        let b = points[j];
        let ab = b - a;
        let len_sq = ab.norm_squared();
        if len_sq > TOLERANCE {
            let t = ((point - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
            if (point - (a + ab * t)).norm() < TOLERANCE {
                return true;
            }
        }
        j = i;
    }
    false
}

fn triangle_area(tri: &[Point2; 3]) -> f64 {
    ((tri[1] - tri[0]).x * (tri[2] - tri[0]).y - (tri[1] - tri[0]).y * (tri[2] - tri[0]).x).abs()
        * 0.5
}

/// Triangulates one polygon-with-holes piece into the output buffer.
fn triangulate_piece(piece: &Piece, out: &mut Vec<[Point2; 3]>) -> Result<()> {
    let mut cdt = ConstrainedDelaunayTriangulation::<SpadePoint2<f64>>::new();
    insert_constraint_loop(&mut cdt, &piece.outer)?;
    for hole in &piece.holes {
        insert_constraint_loop(&mut cdt, hole)?;
    }

    let interior = classify_interior_faces(&cdt);

    for face_handle in cdt.inner_faces() {
        if !interior.contains(&face_handle.fix().index()) {
            continue;
        }
        let positions = face_handle.positions();
        out.push([
            Point2::new(positions[0].x, positions[0].y),
            Point2::new(positions[1].x, positions[1].y),
            Point2::new(positions[2].x, positions[2].y),
        ]);
    }
    Ok(())
}

/// Inserts a closed polygon as constraint edges into the CDT.
fn insert_constraint_loop(
    cdt: &mut ConstrainedDelaunayTriangulation<SpadePoint2<f64>>,
    points: &[Point2],
) -> Result<()> {
    if points.len() < 3 {
        return Err(GeometryError::Degenerate("constraint loop needs at least 3 points".into()).into());
    }

    let mut handles = Vec::with_capacity(points.len());
    for pt in points {
        let h = cdt
            .insert(SpadePoint2::new(pt.x, pt.y))
            .map_err(|e: InsertionError| GeometryError::Degenerate(format!("CDT insert: {e}")))?;
        handles.push(h);
    }

    for i in 0..handles.len() {
        let from = handles[i];
        let to = handles[(i + 1) % handles.len()];
        if from != to {
            cdt.add_constraint(from, to);
        }
    }

    Ok(())
}

/// Classifies which inner faces of the CDT are inside the polygon using
/// flood-fill from the outer face; each constraint-edge crossing flips
/// between exterior and interior (odd depth = interior).
fn classify_interior_faces(
    cdt: &ConstrainedDelaunayTriangulation<SpadePoint2<f64>>,
) -> HashSet<usize> {
    let mut interior = HashSet::new();
    let mut depth_map: HashMap<usize, u32> = HashMap::new();
    let mut queue: VecDeque<(FixedFaceHandle<spade::handles::InnerTag>, u32)> = VecDeque::new();

    let outer_fix = cdt.outer_face().fix();

    for edge in cdt.directed_edges() {
        if edge.face().fix() == outer_fix {
            let rev_face = edge.rev().face();
            if let Some(inner) = rev_face.as_inner() {
                let idx = inner.fix().index();
                if depth_map.contains_key(&idx) {
                    continue;
                }
                let depth = u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
                depth_map.insert(idx, depth);
                if depth % 2 == 1 {
                    interior.insert(idx);
                }
                queue.push_back((inner.fix(), depth));
            }
        }
    }

    while let Some((face_fix, depth)) = queue.pop_front() {
        let face = cdt.face(face_fix);
        for edge in face.adjacent_edges() {
            let neighbor = edge.rev().face();
            if let Some(inner_neighbor) = neighbor.as_inner() {
                let n_idx = inner_neighbor.fix().index();
                if depth_map.contains_key(&n_idx) {
                    continue;
                }
                let new_depth = if cdt.is_constraint_edge(edge.as_undirected().fix()) {
                    depth + 1
                } else {
                    depth
                };
                depth_map.insert(n_idx, new_depth);
                if new_depth % 2 == 1 {
                    interior.insert(n_idx);
                }
                queue.push_back((inner_neighbor.fix(), new_depth));
            }
        }
    }

    interior
}
