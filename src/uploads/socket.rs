//! Connection handle for a single uploads WebSocket.
//!
//! DESIGN
//! ======
//! A `SocketHandle` is the caller's side of one connection; a
//! `SocketDriver` is the transport's side. They share a `watch` channel
//! carrying the connection state plus two unbounded queues (outbound text
//! and inbound text). The tokio-tungstenite task in `transport.rs` owns the
//! driver for real connections; tests own it directly to script open,
//! close, and error events without a network.
//!
//! Lifecycle: `Connecting -> Open -> Closed`, or `Connecting -> Closed`.
//! `Closed` is terminal. Dropping the driver moves the handle to `Closed`.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, watch};

use super::SocketError;

/// Lifecycle state of a connection handle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Open,
    /// Closed by either side or failed while connecting.
    Closed,
}

/// Work queued by the handle for the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outgoing {
    Text(String),
    Close,
}

struct Shared {
    url: String,
    state: watch::Receiver<ConnectionState>,
    outbound: mpsc::UnboundedSender<Outgoing>,
    inbound: Mutex<mpsc::UnboundedReceiver<String>>,
}

/// Caller-side handle to one uploads WebSocket. Cheap to clone; clones
/// address the same connection.
#[derive(Clone)]
pub struct SocketHandle {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for SocketHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketHandle")
            .field("url", &self.shared.url)
            .field("state", &self.state())
            .finish()
    }
}

impl SocketHandle {
    /// Create a handle in `Connecting` together with the driver that moves it.
    pub fn pair(url: impl Into<String>) -> (Self, SocketDriver) {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        let handle = Self {
            shared: Arc::new(Shared {
                url: url.into(),
                state: state_rx,
                outbound: outbound_tx,
                inbound: Mutex::new(inbound_rx),
            }),
        };
        let driver = SocketDriver {
            state: state_tx,
            outbound: outbound_rx,
            inbound: inbound_tx,
        };
        (handle, driver)
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.shared.url
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    /// A fresh state listener. Dropping it unregisters it.
    pub(crate) fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.clone()
    }

    /// Queue text for transmission.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::NotOpen`] unless the handle is `Open`, and
    /// [`SocketError::Transport`] if the transport has already shut down.
    pub fn send_text(&self, text: String) -> Result<(), SocketError> {
        let state = self.state();
        if state != ConnectionState::Open {
            return Err(SocketError::NotOpen(state));
        }
        self.shared
            .outbound
            .send(Outgoing::Text(text))
            .map_err(|_| {
                SocketError::Transport("uploads websocket transport has shut down".to_owned())
            })
    }

    /// Ask the transport to close the connection. Has no effect once closed.
    pub fn close(&self) {
        if self.state() != ConnectionState::Closed {
            let _ = self.shared.outbound.send(Outgoing::Close);
        }
    }

    /// Wait until the handle reaches `Closed`.
    pub async fn closed(&self) {
        let mut state = self.watch_state();
        // An error means the driver is gone, which also means closed.
        let _ = state.wait_for(|s| *s == ConnectionState::Closed).await;
    }

    /// Next text message received from the server, or `None` once the
    /// connection is closed and every buffered message has been read.
    pub async fn next_message(&self) -> Option<String> {
        self.shared.inbound.lock().await.recv().await
    }
}

/// Transport-side counterpart of a [`SocketHandle`].
pub struct SocketDriver {
    state: watch::Sender<ConnectionState>,
    outbound: mpsc::UnboundedReceiver<Outgoing>,
    inbound: mpsc::UnboundedSender<String>,
}

impl SocketDriver {
    /// Report a completed handshake. Ignored unless still connecting.
    pub fn mark_open(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == ConnectionState::Connecting {
                *state = ConnectionState::Open;
                true
            } else {
                false
            }
        })
    }

    /// Report a close or error event.
    pub fn mark_closed(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == ConnectionState::Closed {
                false
            } else {
                *state = ConnectionState::Closed;
                true
            }
        })
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Hand a received text message to the handle.
    pub fn deliver(&self, text: String) {
        let _ = self.inbound.send(text);
    }

    /// A sender for received messages that can outlive borrows of the driver.
    #[must_use]
    pub fn inbound_sender(&self) -> mpsc::UnboundedSender<String> {
        self.inbound.clone()
    }

    /// Wait for the next outbound item; `None` once every handle is dropped.
    pub async fn next_outbound(&mut self) -> Option<Outgoing> {
        self.outbound.recv().await
    }

    /// Take an already-queued outbound item without waiting.
    pub fn try_next_outbound(&mut self) -> Option<Outgoing> {
        self.outbound.try_recv().ok()
    }

    /// Number of live state listeners, including the handle's own.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.state.receiver_count()
    }
}

impl Drop for SocketDriver {
    fn drop(&mut self) {
        self.mark_closed();
    }
}

#[cfg(test)]
#[path = "socket_test.rs"]
mod tests;
