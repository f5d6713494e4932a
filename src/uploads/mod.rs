//! Uploads WebSocket channel: open, wait for readiness, send commands.
//!
//! DESIGN
//! ======
//! `open` builds the channel URL from a [`ClientConfig`] with the bearer
//! token as a query parameter, spawns the transport task, and returns the
//! handle immediately in `Connecting`. Callers gate every send on
//! readiness through [`send_command`], which waits at most a bounded time
//! for the handle to open.
//!
//! There is no automatic reconnect here. A handle that closes stays closed;
//! whoever owns the handle decides whether to open a new one.
//!
//! ERROR HANDLING
//! ==============
//! Readiness failures are reported as [`SocketError`] values carrying a
//! user-facing message. Nothing is retried internally.

pub mod command;
mod readiness;
pub mod socket;
mod transport;

use std::time::Duration;

use tokio::runtime::Handle;

use crate::config::ClientConfig;

pub use command::{CommandData, UploadCommand};
pub use readiness::{SendOptions, ensure_ready, send_command, wait_for_open};
pub use socket::{ConnectionState, Outgoing, SocketDriver, SocketHandle};

/// Server path of the uploads notification channel.
pub const UPLOADS_SOCKET_PATH: &str = "/ws/core/upload/";
pub const DEFAULT_UPLOAD_SOCKET_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    /// No handle exists yet.
    #[error("live updates connection is not available yet")]
    Unavailable,
    /// The handle was already closed when readiness was requested.
    #[error("uploads websocket is not connected")]
    NotConnected,
    #[error("uploads websocket closed before it was ready")]
    ClosedBeforeReady,
    #[error("uploads websocket did not open within {timeout_ms} ms")]
    OpenTimeout { timeout_ms: u64 },
    /// The handle settled into a non-open state while the caller waited.
    #[error("live updates connection lost; wait for the dashboard to reconnect")]
    ConnectionLost {
        #[source]
        cause: Option<Box<SocketError>>,
    },
    #[error("uploads websocket is {0:?}, not open")]
    NotOpen(ConnectionState),
    #[error("failed to encode upload command: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("uploads websocket transport error: {0}")]
    Transport(String),
}

/// Open the uploads channel at [`UPLOADS_SOCKET_PATH`].
#[must_use]
pub fn open(config: &ClientConfig, token: &str) -> SocketHandle {
    open_at(config, token, UPLOADS_SOCKET_PATH)
}

/// Open a channel at `path` on the configured backend.
///
/// Outside a tokio runtime the transport cannot start, so the returned
/// handle is already `Closed`.
#[must_use]
pub fn open_at(config: &ClientConfig, token: &str, path: &str) -> SocketHandle {
    let url = config.build_websocket_url_with_query(path, &[("token", token)]);
    let (handle, driver) = SocketHandle::pair(url.clone());
    match Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn(transport::drive(url, driver));
        }
        Err(error) => {
            tracing::warn!(%error, "no tokio runtime, uploads websocket not started");
            driver.mark_closed();
        }
    }
    handle
}

#[cfg(test)]
#[path = "uploads_test.rs"]
mod tests;
