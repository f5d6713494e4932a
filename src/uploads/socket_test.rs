use super::*;

fn pair() -> (SocketHandle, SocketDriver) {
    SocketHandle::pair("ws://localhost:3000/ws/core/upload/")
}

#[test]
fn connection_state_default_is_connecting() {
    assert_eq!(ConnectionState::default(), ConnectionState::Connecting);
}

#[test]
fn new_handle_starts_connecting() {
    let (handle, driver) = pair();
    assert_eq!(handle.state(), ConnectionState::Connecting);
    assert_eq!(driver.state(), ConnectionState::Connecting);
    assert_eq!(handle.url(), "ws://localhost:3000/ws/core/upload/");
}

#[test]
fn open_then_close_follows_lifecycle() {
    let (handle, driver) = pair();
    assert!(driver.mark_open());
    assert_eq!(handle.state(), ConnectionState::Open);
    assert!(!driver.mark_open(), "second open is ignored");

    assert!(driver.mark_closed());
    assert_eq!(handle.state(), ConnectionState::Closed);
    assert!(!driver.mark_closed());
    assert!(!driver.mark_open(), "closed is terminal");
}

#[test]
fn dropping_driver_closes_handle() {
    let (handle, driver) = pair();
    driver.mark_open();
    drop(driver);
    assert_eq!(handle.state(), ConnectionState::Closed);
}

#[test]
fn clones_share_state() {
    let (handle, driver) = pair();
    let other = handle.clone();
    driver.mark_open();
    assert_eq!(other.state(), ConnectionState::Open);
}

#[test]
fn close_queues_close_request_until_closed() {
    let (handle, mut driver) = pair();
    handle.close();
    assert_eq!(driver.try_next_outbound(), Some(Outgoing::Close));

    driver.mark_closed();
    handle.close();
    assert_eq!(driver.try_next_outbound(), None);
}

#[test]
fn debug_output_names_url_and_state() {
    let (handle, _driver) = pair();
    let rendered = format!("{handle:?}");
    assert!(rendered.contains("ws://localhost:3000/ws/core/upload/"));
    assert!(rendered.contains("Connecting"));
}

#[tokio::test]
async fn delivered_messages_arrive_in_order() {
    let (handle, driver) = pair();
    driver.deliver("one".to_owned());
    driver.inbound_sender().send("two".to_owned()).expect("handle alive");

    assert_eq!(handle.next_message().await.as_deref(), Some("one"));
    assert_eq!(handle.next_message().await.as_deref(), Some("two"));
}

#[tokio::test]
async fn next_message_ends_after_transport_drops() {
    let (handle, driver) = pair();
    driver.deliver("last".to_owned());
    drop(driver);

    assert_eq!(handle.next_message().await.as_deref(), Some("last"));
    assert_eq!(handle.next_message().await, None);
}

#[tokio::test]
async fn closed_resolves_once_transport_reports_close() {
    let (handle, driver) = pair();
    driver.mark_open();
    let waiter = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.closed().await })
    };
    tokio::task::yield_now().await;
    driver.mark_closed();

    waiter.await.expect("waiter task");
    assert_eq!(handle.state(), ConnectionState::Closed);
}
