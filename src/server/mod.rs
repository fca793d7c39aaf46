// Server module entry point
// Binds the listener and runs the accept loop over a sealed dispatcher

pub mod connection;
pub mod listener;

// `loop` is a keyword, so the module is exposed as server_loop
#[path = "loop.rs"]
pub mod server_loop;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::handler::Dispatcher;
use crate::logger;

// Re-export commonly used types
pub use connection::ConnectionOptions;
pub use listener::create_reusable_listener;
pub use server_loop::{start_server_loop, CloseHandle};

/// A bound server that has not started serving yet
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    dispatcher: Arc<Dispatcher>,
    options: ConnectionOptions,
    close: CloseHandle,
}

impl Server {
    pub(crate) fn new(
        listener: TcpListener,
        dispatcher: Dispatcher,
        options: ConnectionOptions,
        close: CloseHandle,
    ) -> std::io::Result<Self> {
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
            dispatcher: Arc::new(dispatcher),
            options,
            close,
        })
    }

    /// Actual bound address; useful when binding port 0
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn close_handle(&self) -> CloseHandle {
        self.close.clone()
    }

    /// Serve until `CloseHandle::close` is called
    pub async fn serve(self) {
        start_server_loop(self.listener, self.dispatcher, self.options, self.close).await;
        logger::log_server_closed(&self.local_addr);
    }
}
