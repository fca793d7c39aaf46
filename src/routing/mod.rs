//! Routing module
//!
//! Provides the route table used by the dispatch pipeline:
//! - Exact lookup keyed by `METHOD@path`
//! - Parameterized matching for paths containing `:name` segments

mod pattern;
mod table;

pub use pattern::{sanitize_param, RouteParam, RoutePattern, Segment};
pub use table::{Method, Route, RouteMatch, RouteTable};
