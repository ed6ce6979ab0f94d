use crate::math::{Point3, Vector3};

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every element and space processed normally.
    Clean,
    /// At least one element or space was abandoned as too complicated.
    Degraded,
}

/// One exported space boundary.
#[derive(Debug, Clone)]
pub struct Boundary {
    /// Stable id, unique within the run.
    pub id: String,
    /// Name of the producing element, absent for virtual boundaries.
    pub element: Option<String>,
    /// Outer loop in 3D, wound so the normal points out of the space.
    pub loop_3d: Vec<Point3>,
    pub normal: Vector3,
    /// Id of the boundary on the other side, if one exists.
    pub opposite: Option<String>,
    /// Id of the host boundary, set for openings only.
    pub parent: Option<String>,
    /// Name of the bounded space.
    pub space: String,
    /// Material layers crossed, as (material id, thickness).
    pub layers: Vec<(i64, f64)>,
    /// Adjacency level 2-5, when resolved.
    pub level: Option<u8>,
    pub is_external: bool,
    pub is_virtual: bool,
}

/// Boundary counts per classification bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelCounts {
    pub two_external: usize,
    pub two_internal: usize,
    pub three: usize,
    pub four: usize,
    pub five: usize,
    pub virtuals: usize,
}

impl LevelCounts {
    pub(crate) fn record(&mut self, level: Option<u8>, is_external: bool, is_virtual: bool) {
        match (level, is_virtual, is_external) {
            (_, true, _) => self.virtuals += 1,
            (Some(2), false, true) => self.two_external += 1,
            (Some(2), false, false) => self.two_internal += 1,
            (Some(3), ..) => self.three += 1,
            (Some(4), ..) => self.four += 1,
            (Some(5), ..) => self.five += 1,
            _ => {}
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.two_external + self.two_internal + self.three + self.four + self.five + self.virtuals
    }
}

/// Level counts, globally and per non-outside space.
#[derive(Debug, Clone, Default)]
pub struct LevelSummary {
    pub global: LevelCounts,
    pub per_space: Vec<(String, LevelCounts)>,
}

/// Everything a run produces.
#[derive(Debug)]
pub struct RunResult {
    pub boundaries: Vec<Boundary>,
    pub status: RunStatus,
    pub summary: LevelSummary,
}
