//! Graceful shutdown coordination.
//!
//! The Ctrl+C handler in `main` flips a [`ShutdownCoordinator`]; the run
//! orchestrator checks it between requests so an in-flight tool invocation
//! always completes and no partial artifact is left behind.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared handle to a shutdown coordinator.
pub type SharedShutdown = Arc<ShutdownCoordinator>;

/// Shutdown flag shared between the signal handler and the run loop.
#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    is_shutdown: AtomicBool,
}

impl ShutdownCoordinator {
    /// Create a new coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new shared coordinator wrapped in [`Arc`].
    pub fn shared() -> SharedShutdown {
        Arc::new(Self::new())
    }

    /// Request shutdown. Returns `true` for the first request only.
    pub fn request_shutdown(&self) -> bool {
        !self.is_shutdown.swap(true, Ordering::SeqCst)
    }

    /// Whether shutdown has been requested.
    pub fn is_shutdown_requested(&self) -> bool {
        self.is_shutdown.load(Ordering::SeqCst)
    }
}
