//! HTTP protocol layer module
//!
//! MIME detection and response assembly, decoupled from dispatch logic.

pub mod mime;
pub mod response;

pub use response::{build_reply_response, not_found_body, timeout_body};
