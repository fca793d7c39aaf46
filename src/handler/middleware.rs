use std::time::Duration;

use crate::context::{Reply, Request};

/// Which branch of the pipeline produced the reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    StaticFile,
    Route,
    NotFound,
    TimedOut,
}

/// Handed to the after-phase once the outcome is known
#[derive(Debug, Clone, Copy)]
pub struct MiddlewareResult {
    /// Time from just before the before-phase until the outcome resolved
    pub process_time: Duration,
    pub outcome: Outcome,
}

/// The single before/after wrapper around outcome resolution.
///
/// `after` runs exactly once per dispatched request, before the session is
/// persisted and before the response is written.
pub trait Middleware: Send + Sync + 'static {
    fn before(&self, _req: &mut Request, _reply: &mut Reply) {}

    fn after(&self, req: &Request, reply: &Reply, result: &MiddlewareResult);
}
