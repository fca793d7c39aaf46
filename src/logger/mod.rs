//! Logger module
//!
//! Provides logging utilities for the dispatch engine including:
//! - Subscriber setup (stdout or append-mode file, `RUST_LOG` aware)
//! - Server lifecycle and routing events
//! - Access logging with multiple formats

mod access;
mod format;

pub use access::AccessLog;
pub use format::AccessLogEntry;

use std::fs::{File, OpenOptions};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};

/// Install the global tracing subscriber
///
/// Should be called once at application startup. `RUST_LOG` takes precedence
/// over the configured level.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = match config.log_file.as_deref() {
        Some(path) => {
            let file = open_log_file(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.try_init(),
    };

    installed.map_err(|e| Error::Logger(e.to_string()))
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> std::io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    tracing::info!("Dispatch server listening on http://{addr}");
    tracing::info!("Log level: {}", config.logging.level);
    if let Some(workers) = config.server.workers {
        tracing::info!("Worker threads: {workers}");
    }
    if let Some((prefix, dir)) = config.server.static_mapping() {
        tracing::info!("Static assets: {prefix} -> {dir}");
    }
    if config.server.session_secret.is_some() {
        tracing::info!("Encrypted sessions enabled");
    }
    if let Some(path) = &config.logging.log_file {
        tracing::info!("Log file: {path}");
    }
}

pub fn log_server_closed(addr: &SocketAddr) {
    tracing::info!("Server on {addr} closed");
}

pub fn log_route_added(name: &str) {
    tracing::debug!("Route registered: {name}");
}

pub fn log_duplicate_route(name: &str) {
    tracing::warn!("Route {name} already registered, keeping the first handler");
}

pub fn log_middleware_replaced() {
    tracing::warn!("Middleware already set, replacing it");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::debug!("Failed to serve connection: {err:?}");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: "access", "{}", entry.format(format));
}
