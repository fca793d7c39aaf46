//! Error types
//!
//! Only configuration errors are allowed to stop `listen`; everything else is
//! recovered inside the dispatch pipeline or at the connection boundary.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Session secret is not a valid AES key length
    #[error(
        "session secret must be 16, 24 or 32 bytes long (got {len}); \
         for example you could use: {suggestion}"
    )]
    InvalidSessionSecret { len: usize, suggestion: String },

    #[error("route {0} already registered")]
    DuplicateRoute(String),

    #[error("invalid listen address: {0}")]
    InvalidAddress(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("logger initialization failed: {0}")]
    Logger(String),

    #[error("request body already consumed")]
    BodyConsumed,

    #[error("failed to read request body: {0}")]
    Body(String),

    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid form body: {0}")]
    Form(#[from] serde_urlencoded::de::Error),
}
