use thiserror::Error;

/// Top-level error type for the parclose boundary kernel.
#[derive(Debug, Error)]
pub enum ParcloseError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

impl ParcloseError {
    /// Whether the error is contained at the per-element/per-space boundary.
    ///
    /// Recoverable errors (unsupported geometry, excess complexity) skip the
    /// owning element or space with a warning and the run continues. Anything
    /// else aborts the run.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Geometry(_) | Self::Operation(OperationError::TooComplicated(_)) => true,
            Self::Model(_) => false,
        }
    }

    /// Whether the error marks the run as degraded rather than merely
    /// skipping unsupported input.
    #[must_use]
    pub fn is_degrading(&self) -> bool {
        matches!(self, Self::Operation(OperationError::TooComplicated(_)))
    }
}

/// Errors raised by unsupported or degenerate input geometry.
///
/// All of these are recoverable: the owning element or space is skipped.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("boundary representation is not a closed polyhedron: {0}")]
    BadBrep(String),

    #[error("b-rep face carries a void loop, which is not supported")]
    VoidFace,

    #[error("extrusion depth {depth} is below tolerance {tolerance}")]
    ShallowExtrusion { depth: f64, tolerance: f64 },

    #[error("zero-length vector")]
    ZeroVector,

    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}

/// Errors raised while running the decomposition pipeline.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("geometry too intricate: {0}")]
    TooComplicated(String),
}

/// Errors raised by the model stores and invariant checks.
///
/// These indicate an internal inconsistency and terminate the run.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("entity not found: {0}")]
    EntityNotFound(&'static str),

    #[error("invariant violated: {0}")]
    AssertionFailed(String),
}

/// Convenience type alias for results using [`ParcloseError`].
pub type Result<T> = std::result::Result<T, ParcloseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_errors_are_recoverable() {
        let err: ParcloseError = GeometryError::VoidFace.into();
        assert!(err.is_recoverable());
        assert!(!err.is_degrading());
    }

    #[test]
    fn too_complicated_degrades_the_run() {
        let err: ParcloseError = OperationError::TooComplicated("deep stack".into()).into();
        assert!(err.is_recoverable());
        assert!(err.is_degrading());
    }

    #[test]
    fn assertion_failures_are_fatal() {
        let err: ParcloseError = ModelError::AssertionFailed("opposite set twice".into()).into();
        assert!(!err.is_recoverable());
    }
}
