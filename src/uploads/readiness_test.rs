use tokio::time::Instant;

use super::*;
use crate::uploads::{Outgoing, SocketDriver};

const URL: &str = "ws://localhost:3000/ws/core/upload/?token=t";

fn connecting() -> (SocketHandle, SocketDriver) {
    SocketHandle::pair(URL)
}

// =============================================================
// wait_for_open
// =============================================================

#[tokio::test]
async fn wait_for_open_rejects_missing_handle() {
    let err = wait_for_open(None, DEFAULT_UPLOAD_SOCKET_TIMEOUT).await.unwrap_err();
    assert!(matches!(err, SocketError::Unavailable));
}

#[tokio::test]
async fn wait_for_open_resolves_immediately_when_open() {
    let (handle, driver) = connecting();
    driver.mark_open();

    let ready = wait_for_open(Some(&handle), Duration::ZERO).await.expect("open handle");
    assert_eq!(ready.state(), ConnectionState::Open);
    assert_eq!(driver.listener_count(), 1);
}

#[tokio::test]
async fn wait_for_open_rejects_closed_handle() {
    let (handle, driver) = connecting();
    driver.mark_closed();

    let err = wait_for_open(Some(&handle), DEFAULT_UPLOAD_SOCKET_TIMEOUT).await.unwrap_err();
    assert!(matches!(err, SocketError::NotConnected));
}

#[tokio::test(start_paused = true)]
async fn wait_for_open_resolves_when_open_fires_before_timeout() {
    let (handle, driver) = connecting();
    let start = Instant::now();
    let opener = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        driver.mark_open();
        driver
    });

    wait_for_open(Some(&handle), Duration::from_secs(5)).await.expect("opened");
    assert!(start.elapsed() < Duration::from_secs(5));

    let driver = opener.await.expect("opener task");
    assert_eq!(driver.listener_count(), 1, "listener released on settlement");
}

#[tokio::test(start_paused = true)]
async fn wait_for_open_times_out_and_releases_listener() {
    let (handle, driver) = connecting();

    let err = wait_for_open(Some(&handle), Duration::from_millis(250)).await.unwrap_err();
    assert!(matches!(err, SocketError::OpenTimeout { timeout_ms: 250 }));
    assert_eq!(driver.listener_count(), 1);

    // A late open after the timeout settled does not resurrect the failed wait.
    driver.mark_open();
    assert_eq!(handle.state(), ConnectionState::Open);
}

#[tokio::test(start_paused = true)]
async fn wait_for_open_settles_once_when_open_races_timeout() {
    let (handle, driver) = connecting();
    let timeout = Duration::from_millis(250);
    let opener = tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        driver.mark_open();
        driver
    });

    let started = Instant::now();
    let outcome = wait_for_open(Some(&handle), timeout).await;
    assert_eq!(started.elapsed(), timeout);
    match outcome {
        Ok(ready) => assert_eq!(ready.state(), ConnectionState::Open),
        Err(err) => assert!(matches!(err, SocketError::OpenTimeout { timeout_ms: 250 })),
    }

    let driver = opener.await.expect("opener task");
    assert_eq!(handle.state(), ConnectionState::Open);
    assert_eq!(driver.listener_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn wait_for_open_rejects_close_before_open() {
    let (handle, driver) = connecting();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        driver.mark_closed();
        // A later open must not flip a closed handle.
        assert!(!driver.mark_open());
    });

    let err = wait_for_open(Some(&handle), Duration::from_secs(5)).await.unwrap_err();
    assert!(matches!(err, SocketError::ClosedBeforeReady));
    assert_eq!(handle.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn wait_for_open_treats_dropped_transport_as_closed() {
    let (handle, driver) = connecting();
    drop(driver);

    let err = wait_for_open(Some(&handle), Duration::from_secs(5)).await.unwrap_err();
    assert!(matches!(err, SocketError::NotConnected));
}

// =============================================================
// ensure_ready
// =============================================================

#[tokio::test]
async fn ensure_ready_rejects_missing_handle_as_unavailable() {
    let err = ensure_ready(None, DEFAULT_UPLOAD_SOCKET_TIMEOUT).await.unwrap_err();
    assert!(matches!(err, SocketError::Unavailable));
    assert!(err.to_string().contains("not available"));
}

#[tokio::test]
async fn ensure_ready_passes_open_handle_without_listening() {
    let (handle, driver) = connecting();
    driver.mark_open();

    ensure_ready(Some(&handle), Duration::ZERO).await.expect("ready");
    assert_eq!(driver.listener_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn ensure_ready_waits_for_connecting_handle() {
    let (handle, driver) = connecting();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        driver.mark_open();
        // Keep the transport alive past the open.
        tokio::time::sleep(Duration::from_secs(60)).await;
    });

    let ready = ensure_ready(Some(&handle), Duration::from_secs(1)).await.expect("ready");
    assert_eq!(ready.state(), ConnectionState::Open);
}

#[tokio::test(start_paused = true)]
async fn ensure_ready_reports_timeout_as_connection_lost() {
    let (handle, _driver) = connecting();

    let err = ensure_ready(Some(&handle), Duration::from_millis(100)).await.unwrap_err();
    let SocketError::ConnectionLost { cause: Some(cause) } = &err else {
        panic!("expected connection lost with cause, got {err:?}");
    };
    assert!(matches!(**cause, SocketError::OpenTimeout { timeout_ms: 100 }));
    assert!(err.to_string().contains("reconnect"));
    assert!(std::error::Error::source(&err).is_some());
}

#[tokio::test]
async fn ensure_ready_reports_closed_handle_as_connection_lost() {
    let (handle, driver) = connecting();
    driver.mark_closed();

    let err = ensure_ready(Some(&handle), Duration::from_secs(1)).await.unwrap_err();
    assert!(matches!(err, SocketError::ConnectionLost { cause: None }));
}

// =============================================================
// send_command
// =============================================================

#[tokio::test]
async fn send_command_transmits_wire_text_when_open() {
    let (handle, mut driver) = connecting();
    driver.mark_open();

    let command = UploadCommand::retrieve("9");
    send_command(Some(&handle), &command, SendOptions::default())
        .await
        .expect("sent");

    assert_eq!(
        driver.try_next_outbound(),
        Some(Outgoing::Text(
            r#"{"type":"retrieve","instance_id":"9"}"#.to_owned()
        ))
    );
}

#[tokio::test(start_paused = true)]
async fn send_command_never_transmits_when_stuck_connecting() {
    let (handle, mut driver) = connecting();

    let options = SendOptions {
        timeout: Some(Duration::from_millis(200)),
    };
    let err = send_command(Some(&handle), &UploadCommand::list(), options)
        .await
        .unwrap_err();

    assert!(matches!(err, SocketError::ConnectionLost { .. }));
    assert_eq!(driver.try_next_outbound(), None);
}

#[tokio::test(start_paused = true)]
async fn send_command_uses_default_timeout() {
    let (handle, _driver) = connecting();
    let start = Instant::now();

    let command = UploadCommand::subscribe();
    let _ = send_command(Some(&handle), &command, SendOptions::default()).await;
    let elapsed = start.elapsed();
    assert!(elapsed >= DEFAULT_UPLOAD_SOCKET_TIMEOUT);
    assert!(elapsed < DEFAULT_UPLOAD_SOCKET_TIMEOUT + Duration::from_millis(10));
}

#[tokio::test]
async fn send_text_refuses_handle_that_is_not_open() {
    let (handle, mut driver) = connecting();

    let err = handle.send_text("early".to_owned()).unwrap_err();
    assert!(matches!(err, SocketError::NotOpen(ConnectionState::Connecting)));
    assert_eq!(driver.try_next_outbound(), None);
}
