// Connection handling module
// Serves one accepted TCP connection with the shared dispatcher

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;

use crate::config::PerformanceConfig;
use crate::handler::Dispatcher;
use crate::logger;

/// Per-connection HTTP settings
#[derive(Debug, Clone, Copy)]
pub struct ConnectionOptions {
    pub keep_alive: bool,
    /// Upper bound for the whole connection
    pub timeout: Option<Duration>,
}

impl From<&PerformanceConfig> for ConnectionOptions {
    fn from(config: &PerformanceConfig) -> Self {
        Self {
            keep_alive: config.keep_alive,
            timeout: config.connection_timeout.map(Duration::from_secs),
        }
    }
}

/// Handle a single connection in a spawned task.
///
/// Requests on one connection are served sequentially. Errors end this
/// connection only.
pub fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    dispatcher: Arc<Dispatcher>,
    options: ConnectionOptions,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let mut builder = http1::Builder::new();
        builder.keep_alive(options.keep_alive);

        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let dispatcher = Arc::clone(&dispatcher);
                async move { Ok::<_, Infallible>(dispatcher.dispatch(req, Some(peer_addr)).await) }
            }),
        );

        let result = match options.timeout {
            Some(limit) => match tokio::time::timeout(limit, conn).await {
                Ok(result) => result,
                Err(_) => {
                    logger::log_warning(&format!(
                        "Connection from {peer_addr} timed out after {} seconds",
                        limit.as_secs()
                    ));
                    return;
                }
            },
            None => conn.await,
        };

        if let Err(err) = result {
            logger::log_connection_error(&err);
        }
    });
}
