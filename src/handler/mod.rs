//! Request handler module
//!
//! Handler contracts, the single middleware slot, the static asset bridge and
//! the per-request dispatch pipeline that ties them to the route table.

pub mod dispatch;
pub mod middleware;
pub mod static_files;

use std::future::Future;
use std::pin::Pin;

use crate::context::{Body, Reply, Request};

// Re-export main entry points
pub use dispatch::Dispatcher;
pub use middleware::{Middleware, MiddlewareResult, Outcome};
pub use static_files::{DiskFiles, FileSource, StaticAssets};

/// Future returned by a handler, borrowing the request and reply
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Body> + Send + 'a>>;

/// Async route or not-found handler
///
/// Implemented for any `Fn(&mut Request, &mut Reply) -> HandlerFuture`, so a
/// handler is usually written as
/// `|req, reply| Box::pin(async move { ... })`.
pub trait Handler: Send + Sync + 'static {
    fn call<'a>(&'a self, req: &'a mut Request, reply: &'a mut Reply) -> HandlerFuture<'a>;
}

impl<F> Handler for F
where
    F: for<'a> Fn(&'a mut Request, &'a mut Reply) -> HandlerFuture<'a> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, req: &'a mut Request, reply: &'a mut Reply) -> HandlerFuture<'a> {
        self(req, reply)
    }
}

pub type BoxHandler = Box<dyn Handler>;

/// Synchronous stage run before middleware and outcome resolution
pub type Preprocessor = Box<dyn Fn(&mut Request, &mut Reply) + Send + Sync>;
