use std::fmt;

use crate::geometry::Solid;
use crate::model::ElementKind;

/// Tuning knobs for a pipeline run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Snapping tolerance used uniformly for scalar and direction pooling.
    pub tolerance: f64,
    /// Process only spaces with these names; empty means all.
    pub space_filter: Vec<String>,
    /// Process only elements with these names; empty means all.
    pub element_filter: Vec<String>,
    /// Half-block pairing cutoff: faces further apart never pair.
    pub max_pair_distance: f64,
    /// Extra invariant assertions, fatal on violation.
    pub expensive_checks: bool,
    /// Diagnostic verbosity, no behavior change.
    pub verbose_blocks: bool,
    pub verbose_stacks: bool,
    pub verbose_levels: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            space_filter: Vec::new(),
            element_filter: Vec::new(),
            max_pair_distance: f64::INFINITY,
            expensive_checks: false,
            verbose_blocks: false,
            verbose_stacks: false,
            verbose_levels: false,
        }
    }
}

/// One element to process.
pub struct ElementInput {
    pub name: String,
    pub kind: ElementKind,
    pub material: i64,
    pub solid: Solid,
}

/// One space to process.
pub struct SpaceInput {
    pub name: String,
    pub solid: Solid,
    pub is_outside: bool,
}

/// Text-stream callback for diagnostics.
pub type DiagnosticSink = Box<dyn FnMut(&str)>;

/// Optional text diagnostic sinks. Everything also goes through
/// `tracing`, so sinks are only needed by hosts that capture the stream
/// themselves.
#[derive(Default)]
pub struct Diagnostics {
    notify_sink: Option<DiagnosticSink>,
    warn_sink: Option<DiagnosticSink>,
    error_sink: Option<DiagnosticSink>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_notify(mut self, sink: DiagnosticSink) -> Self {
        self.notify_sink = Some(sink);
        self
    }

    #[must_use]
    pub fn on_warn(mut self, sink: DiagnosticSink) -> Self {
        self.warn_sink = Some(sink);
        self
    }

    #[must_use]
    pub fn on_error(mut self, sink: DiagnosticSink) -> Self {
        self.error_sink = Some(sink);
        self
    }

    pub fn notify(&mut self, message: &str) {
        tracing::info!("{message}");
        if let Some(sink) = &mut self.notify_sink {
            sink(message);
        }
    }

    pub fn warn(&mut self, message: &str) {
        tracing::warn!("{message}");
        if let Some(sink) = &mut self.warn_sink {
            sink(message);
        }
    }

    pub fn error(&mut self, message: &str) {
        tracing::error!("{message}");
        if let Some(sink) = &mut self.error_sink {
            sink(message);
        }
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("notify", &self.notify_sink.is_some())
            .field("warn", &self.warn_sink.is_some())
            .field("error", &self.error_sink.is_some())
            .finish()
    }
}
