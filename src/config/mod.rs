// Configuration module entry point
// Loads listen options, session settings, logging and dispatch configuration

mod types;

use std::net::SocketAddr;

use crate::error::{Error, Result};
use crate::session::SessionKey;

// Re-export public types
pub use types::{
    Config, DispatchConfig, LoggingConfig, PerformanceConfig, ServerConfig, SessionExpire,
};

impl Config {
    /// Load configuration from specified file path (without extension).
    ///
    /// The file is optional; `DISPATCH__SECTION__KEY` environment variables
    /// override it, e.g. `DISPATCH__SERVER__PORT=9000`.
    pub fn load_from(config_path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("DISPATCH")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| Error::InvalidAddress(format!("{}:{} ({e})", self.server.host, self.server.port)))
    }

    /// Validate the session secret, if one is configured.
    ///
    /// An invalid length is fatal; the error suggests a freshly generated key.
    pub fn session_key(&self) -> Result<Option<SessionKey>> {
        self.server
            .session_secret
            .as_deref()
            .map(SessionKey::new)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert!(config.server.static_mapping().is_none());
        assert!(config.session_key().unwrap().is_none());
        assert!(config.dispatch.is_blocked("/_static/app.js"));
        assert!(config.dispatch.is_blocked("/favicon.ico"));
        assert!(!config.dispatch.is_blocked("/api/joke"));
    }

    #[test]
    fn test_from_toml() {
        let config = Config::from_toml_str(
            r#"
            [server]
            port = 9000
            static_local_dir = "/static"
            static_serve_path = "/assets"
            session_secret = "0123456789abcdef"
            session_expire = 3600

            [performance]
            handler_timeout_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.static_mapping(), Some(("/assets", "/static")));
        assert_eq!(config.server.session_expire, Some(SessionExpire::After(3600)));
        assert_eq!(config.performance.handler_timeout_ms, Some(250));
        assert!(config.performance.keep_alive);
        assert!(config.session_key().unwrap().is_some());
        assert_eq!(config.logging.access_log_format, "combined");
    }

    #[test]
    fn test_session_expire_never() {
        let config = Config::from_toml_str("[server]\nsession_expire = \"never\"\n").unwrap();
        assert_eq!(config.server.session_expire, Some(SessionExpire::Never));

        let config = Config::from_toml_str("[server]\nsession_expire = \"120\"\n").unwrap();
        assert_eq!(config.server.session_expire, Some(SessionExpire::After(120)));

        assert!(Config::from_toml_str("[server]\nsession_expire = \"soon\"\n").is_err());
    }

    #[test]
    fn test_invalid_session_secret_is_fatal() {
        let mut config = Config::default();
        config.server.session_secret = Some("short".to_string());
        match config.session_key() {
            Err(Error::InvalidSessionSecret { len, suggestion }) => {
                assert_eq!(len, 5);
                assert_eq!(suggestion.len(), 32);
            }
            other => panic!("expected invalid secret error, got {other:?}"),
        }
    }

    #[test]
    fn test_socket_addr() {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 3000;
        assert_eq!(config.get_socket_addr().unwrap().to_string(), "127.0.0.1:3000");

        config.server.host = "not a host".to_string();
        assert!(matches!(config.get_socket_addr(), Err(Error::InvalidAddress(_))));
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let config = Config::load_from("does-not-exist/dispatch").unwrap();
        assert_eq!(config.logging.level, "info");
    }
}
