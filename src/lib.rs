//! Embeddable HTTP request-dispatch engine
//!
//! Register handlers on an [`HttpServer`], then `listen`:
//!
//! ```no_run
//! use http_dispatch::{Body, Config, HttpServer};
//!
//! # async fn run() -> http_dispatch::Result<()> {
//! let mut app = HttpServer::new();
//! app.get("/api/joke", |_req, _reply| {
//!     Box::pin(async { Body::from("Why did the crab never share? Because he's shellfish.") })
//! })
//! .get("/users/:id", |req, reply| {
//!     Box::pin(async move {
//!         reply.status(200);
//!         Body::from(format!("user {}", req.path_param("id").unwrap_or_default()))
//!     })
//! });
//!
//! app.listen(&Config::default()).await
//! # }
//! ```

pub mod app;
pub mod config;
pub mod context;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod routing;
pub mod server;
pub mod session;

pub use app::HttpServer;
pub use config::Config;
pub use context::{Blob, Body, CookieOptions, Reply, Request, SameSite};
pub use error::{Error, Result};
pub use handler::{
    DiskFiles, Dispatcher, FileSource, Handler, HandlerFuture, Middleware, MiddlewareResult,
    Outcome,
};
pub use logger::AccessLog;
pub use routing::Method;
pub use server::{CloseHandle, Server};
pub use session::Session;
