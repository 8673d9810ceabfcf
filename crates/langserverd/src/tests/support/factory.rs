//! Handler factory that can be armed to take a worker down.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::cluster::{HandlerFactory, SessionContext};
use crate::placeholder_handler::PlaceholderHandler;

const DISARMED: usize = usize::MAX;

/// Builds placeholder handlers; once armed, panics on the chosen worker.
#[derive(Clone)]
pub struct TrapFactory {
    target: Arc<AtomicUsize>,
}

impl TrapFactory {
    /// Makes every later connection assigned to `worker` panic.
    pub fn arm(&self, worker: usize) {
        self.target.store(worker, Ordering::SeqCst);
    }
}

impl Default for TrapFactory {
    fn default() -> Self {
        Self {
            target: Arc::new(AtomicUsize::new(DISARMED)),
        }
    }
}

impl HandlerFactory for TrapFactory {
    type Handler = PlaceholderHandler;

    fn create(&self, context: SessionContext) -> PlaceholderHandler {
        assert_ne!(
            self.target.load(Ordering::SeqCst),
            context.worker,
            "handler construction failed on worker {}",
            context.worker
        );
        PlaceholderHandler::new(context)
    }
}
