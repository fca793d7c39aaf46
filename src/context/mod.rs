//! Request/reply context
//!
//! `Request` is the per-call view handed to preprocessors, middleware and
//! handlers; `Reply` is the mutable builder that becomes the response.

mod body;
mod reply;
mod request;

pub use body::Body;
pub use reply::{CookieOptions, Reply, SameSite};
pub use request::{Blob, BoxBody, BoxError, Request};

pub(crate) use request::under_prefix;
