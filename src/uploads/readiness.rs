//! Readiness gating for outbound commands.

use std::time::Duration;

use super::{
    ConnectionState, DEFAULT_UPLOAD_SOCKET_TIMEOUT, SocketError, SocketHandle, UploadCommand,
};

/// Per-call overrides for [`send_command`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SendOptions {
    /// Readiness timeout; [`DEFAULT_UPLOAD_SOCKET_TIMEOUT`] when `None`.
    pub timeout: Option<Duration>,
}

/// Wait until `handle` is open.
///
/// Resolves immediately for an open handle. For a connecting handle a
/// single state listener is registered and dropped again as soon as the
/// wait settles, whether by open, close, or timeout.
///
/// # Errors
///
/// - [`SocketError::Unavailable`] when `handle` is `None`
/// - [`SocketError::NotConnected`] when the handle is already closed
/// - [`SocketError::ClosedBeforeReady`] when it closes while waiting
/// - [`SocketError::OpenTimeout`] when it does not open within `timeout`
pub async fn wait_for_open(
    handle: Option<&SocketHandle>,
    timeout: Duration,
) -> Result<&SocketHandle, SocketError> {
    let Some(handle) = handle else {
        return Err(SocketError::Unavailable);
    };
    match handle.state() {
        ConnectionState::Open => return Ok(handle),
        ConnectionState::Closed => return Err(SocketError::NotConnected),
        ConnectionState::Connecting => {}
    }

    let mut listener = handle.watch_state();
    let settled = tokio::time::timeout(timeout, async {
        listener
            .wait_for(|state| *state != ConnectionState::Connecting)
            .await
            .map(|state| *state)
    })
    .await;

    match settled {
        Ok(Ok(ConnectionState::Open)) => Ok(handle),
        // Driver gone counts as closed.
        Ok(_) => Err(SocketError::ClosedBeforeReady),
        Err(_) => Err(SocketError::OpenTimeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

/// Make sure `handle` can accept outbound messages.
///
/// # Errors
///
/// [`SocketError::Unavailable`] when `handle` is `None`; otherwise
/// [`SocketError::ConnectionLost`], carrying the wait failure (if any) as
/// its source.
pub async fn ensure_ready(
    handle: Option<&SocketHandle>,
    timeout: Duration,
) -> Result<&SocketHandle, SocketError> {
    let Some(handle) = handle else {
        return Err(SocketError::Unavailable);
    };
    match handle.state() {
        ConnectionState::Open => Ok(handle),
        ConnectionState::Connecting => match wait_for_open(Some(handle), timeout).await {
            Ok(ready) if ready.state() == ConnectionState::Open => Ok(ready),
            Ok(_) => Err(SocketError::ConnectionLost { cause: None }),
            Err(error) => {
                tracing::debug!(%error, "uploads websocket never became ready");
                Err(SocketError::ConnectionLost {
                    cause: Some(Box::new(error)),
                })
            }
        },
        ConnectionState::Closed => Err(SocketError::ConnectionLost { cause: None }),
    }
}

/// Wait for readiness, then transmit `command` as JSON text.
///
/// # Errors
///
/// Propagates readiness failures from [`ensure_ready`], encoding failures,
/// and transport failures from [`SocketHandle::send_text`].
pub async fn send_command(
    handle: Option<&SocketHandle>,
    command: &UploadCommand,
    options: SendOptions,
) -> Result<(), SocketError> {
    let timeout = options.timeout.unwrap_or(DEFAULT_UPLOAD_SOCKET_TIMEOUT);
    let ready = ensure_ready(handle, timeout).await?;
    let wire = command.to_wire()?;
    tracing::debug!(kind = command.kind(), "sending upload command");
    ready.send_text(wire)
}

#[cfg(test)]
#[path = "readiness_test.rs"]
mod tests;
