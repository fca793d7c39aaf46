//! Access log middleware
//!
//! Writes one access log line per request after the outcome is known.
//! Static asset requests are skipped.

use std::time::Duration;

use hyper::header::{REFERER, USER_AGENT};
use hyper::Version;

use super::AccessLogEntry;
use crate::config::LoggingConfig;
use crate::context::{Reply, Request};
use crate::handler::{Middleware, MiddlewareResult};

#[derive(Debug, Clone)]
pub struct AccessLog {
    format: String,
}

impl AccessLog {
    /// `format` is `combined`, `common`, `json` or a `$variable` pattern
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        Self::new(config.access_log_format.clone())
    }
}

impl Middleware for AccessLog {
    fn after(&self, req: &Request, reply: &Reply, result: &MiddlewareResult) {
        if req.resource_request {
            return;
        }
        super::log_access(&entry_for(req, reply, result.process_time), &self.format);
    }
}

fn entry_for(req: &Request, reply: &Reply, elapsed: Duration) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(req.remote_addr, req.method.as_str(), &req.path);
    entry.query.clone_from(&req.query);
    entry.http_version = version_label(req.version).to_string();
    entry.status = reply.status_code().as_u16();
    entry.body_bytes = reply.body().len();
    entry.referer = req.header(REFERER.as_str()).map(ToString::to_string);
    entry.user_agent = req.header(USER_AGENT.as_str()).map(ToString::to_string);
    entry.request_time = elapsed;
    entry
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
