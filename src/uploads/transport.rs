//! tokio-tungstenite transport behind a [`SocketDriver`].
//!
//! One task per connection: perform the handshake, report `Open`, then
//! pump outbound text to the server and inbound text to the handle until
//! either side closes. Every exit path reports `Closed`.

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use super::{Outgoing, SocketDriver};

enum Step {
    Outgoing(Option<Outgoing>),
    Incoming(Option<Result<Message, WsError>>),
}

pub(crate) async fn drive(url: String, mut driver: SocketDriver) {
    // Never log the query string: it carries the bearer token.
    let endpoint = url.split('?').next().unwrap_or_default().to_owned();

    let connected = tokio::select! {
        result = connect_async(url.as_str()) => Some(result),
        // Close requested (or every handle dropped) before the handshake finished.
        _ = driver.next_outbound() => None,
    };
    let stream = match connected {
        Some(Ok((stream, _response))) => stream,
        Some(Err(error)) => {
            tracing::warn!(%endpoint, %error, "uploads websocket failed to connect");
            driver.mark_closed();
            return;
        }
        None => {
            tracing::debug!(%endpoint, "uploads websocket abandoned while connecting");
            driver.mark_closed();
            return;
        }
    };

    driver.mark_open();
    tracing::info!(%endpoint, "uploads websocket open");

    let inbound = driver.inbound_sender();
    let (mut write, mut read) = stream.split();
    loop {
        let step = tokio::select! {
            outgoing = driver.next_outbound() => Step::Outgoing(outgoing),
            incoming = read.next() => Step::Incoming(incoming),
        };
        match step {
            Step::Outgoing(Some(Outgoing::Text(text))) => {
                if let Err(error) = write.send(Message::text(text)).await {
                    tracing::warn!(%endpoint, %error, "uploads websocket send failed");
                    break;
                }
            }
            Step::Outgoing(Some(Outgoing::Close) | None) => {
                let _ = write.close().await;
                break;
            }
            Step::Incoming(Some(Ok(Message::Text(text)))) => {
                let _ = inbound.send(text.as_str().to_owned());
            }
            Step::Incoming(Some(Ok(Message::Close(_))) | None) => break,
            Step::Incoming(Some(Ok(_))) => {}
            Step::Incoming(Some(Err(error))) => {
                tracing::warn!(%endpoint, %error, "uploads websocket receive failed");
                break;
            }
        }
    }

    driver.mark_closed();
    tracing::info!(%endpoint, "uploads websocket closed");
}
