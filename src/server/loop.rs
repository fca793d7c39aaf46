// Server loop module
// Accepts connections until the close handle fires

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::{handle_connection, ConnectionOptions};
use crate::handler::Dispatcher;
use crate::logger;

/// Stops a running server; cheap to clone and usable from any task
#[derive(Debug, Clone, Default)]
pub struct CloseHandle {
    notify: Arc<Notify>,
    closed: Arc<AtomicBool>,
}

impl CloseHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop accepting connections. In-flight connections finish on their own.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            // notify_one stores a permit if the loop is not waiting yet
            self.notify.notify_one();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn closed(&self) {
        if self.is_closed() {
            return;
        }
        self.notify.notified().await;
    }
}

/// Accept loop: one spawned task per connection
#[allow(clippy::ignored_unit_patterns)]
pub async fn start_server_loop(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    options: ConnectionOptions,
    close: CloseHandle,
) {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        handle_connection(stream, peer_addr, Arc::clone(&dispatcher), options);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            _ = close.closed() => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_close_before_wait() {
        let handle = CloseHandle::new();
        handle.close();
        handle.close();
        assert!(handle.is_closed());
        tokio::time::timeout(Duration::from_secs(1), handle.closed())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_close_wakes_waiter() {
        let handle = CloseHandle::new();
        let waiter = handle.clone();
        let task = tokio::spawn(async move { waiter.closed().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.close();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
    }
}
