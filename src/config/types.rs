// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub dispatch: DispatchConfig,
}

/// Listen options, static asset mapping and session settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Local directory served under `static_serve_path`
    pub static_local_dir: Option<String>,
    /// URL prefix for static assets, e.g. `/assets`
    pub static_serve_path: Option<String>,
    /// 16, 24 or 32 bytes; sessions are disabled when unset
    pub session_secret: Option<String>,
    pub session_expire: Option<SessionExpire>,
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            static_local_dir: None,
            static_serve_path: None,
            session_secret: None,
            session_expire: None,
            workers: None,
        }
    }
}

impl ServerConfig {
    /// Static mapping, only when both sides are configured
    pub fn static_mapping(&self) -> Option<(&str, &str)> {
        match (&self.static_serve_path, &self.static_local_dir) {
            (Some(prefix), Some(dir)) if !prefix.is_empty() => Some((prefix, dir)),
            _ => None,
        }
    }
}

/// Session cookie lifetime: a number of seconds, or `"never"`
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "RawSessionExpire", into = "RawSessionExpire")]
pub enum SessionExpire {
    After(u64),
    Never,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
enum RawSessionExpire {
    Seconds(u64),
    Word(String),
}

impl TryFrom<RawSessionExpire> for SessionExpire {
    type Error = String;

    fn try_from(raw: RawSessionExpire) -> Result<Self, Self::Error> {
        match raw {
            RawSessionExpire::Seconds(secs) => Ok(Self::After(secs)),
            RawSessionExpire::Word(word) if word.eq_ignore_ascii_case("never") => Ok(Self::Never),
            // Environment overrides always arrive as strings
            RawSessionExpire::Word(word) => word
                .parse()
                .map(Self::After)
                .map_err(|_| format!("invalid session_expire '{word}', expected seconds or \"never\"")),
        }
    }
}

impl From<SessionExpire> for RawSessionExpire {
    fn from(expire: SessionExpire) -> Self {
        match expire {
            SessionExpire::After(secs) => Self::Seconds(secs),
            SessionExpire::Never => Self::Word("never".to_string()),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    pub access_log_format: String,
    /// Log file path (optional, stdout if not set)
    pub log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            access_log: true,
            access_log_format: "combined".to_string(),
            log_file: None,
        }
    }
}

/// Performance configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Upper bound for a whole connection, in seconds
    pub connection_timeout: Option<u64>,
    /// Deadline for a single handler, in milliseconds
    pub handler_timeout_ms: Option<u64>,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            keep_alive: true,
            connection_timeout: None,
            handler_timeout_ms: None,
        }
    }
}

/// Paths that never reach preprocessors or handlers
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DispatchConfig {
    pub blocked_prefixes: Vec<String>,
    pub blocked_suffixes: Vec<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            blocked_prefixes: vec!["/_static".to_string()],
            blocked_suffixes: vec![".ico".to_string()],
        }
    }
}

impl DispatchConfig {
    pub fn is_blocked(&self, path: &str) -> bool {
        self.blocked_prefixes.iter().any(|p| path.starts_with(p.as_str()))
            || self.blocked_suffixes.iter().any(|s| path.ends_with(s.as_str()))
    }
}
