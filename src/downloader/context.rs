//! Per-run context passed into every core call

use crate::output::AuditSink;
use crate::shutdown::SharedShutdown;

/// Audit sink, verbosity and shutdown flag of one run.
///
/// Replaces process-wide log and debug-level globals: every engine call
/// receives the context explicitly.
#[derive(Clone)]
pub struct RunContext<'a> {
    audit: &'a dyn AuditSink,
    verbosity: u8,
    shutdown: Option<SharedShutdown>,
}

impl<'a> RunContext<'a> {
    /// Context writing to `audit`, quiet, without shutdown handling
    pub fn new(audit: &'a dyn AuditSink) -> Self {
        Self {
            audit,
            verbosity: 0,
            shutdown: None,
        }
    }

    /// Set the verbosity (`-v` count)
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Attach a shutdown coordinator
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Audit sink
    pub fn audit(&self) -> &dyn AuditSink {
        self.audit
    }

    /// Verbosity level
    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    /// Whether per-URL traces are promoted to info
    pub fn is_verbose(&self) -> bool {
        self.verbosity > 0
    }

    /// Whether the run should stop before the next request
    pub fn is_cancelled(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|s| s.is_shutdown_requested())
    }
}

impl std::fmt::Debug for RunContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("verbosity", &self.verbosity)
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}
