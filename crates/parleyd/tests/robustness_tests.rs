//! Robustness tests for the relay.
//!
//! Capacity limits, oversized and malformed input, abrupt disconnects and
//! idle timeouts. None of these may take down the relay or another member's
//! session.

mod common;

use std::time::Duration;

use common::TestServer;
use parleyd::config::SessionLimits;

// ============================================================================
// Capacity
// ============================================================================

#[tokio::test]
async fn test_full_relay_refuses_join() {
    let server = TestServer::spawn_with(1, SessionLimits::default()).await;
    let (mut a, _) = server.join().await;

    let mut refused = server.connect().await;
    refused.expect("Assigned ID: 00002").await;
    refused.expect("Server is full.").await;
    refused.expect_closed().await;

    // The existing member is unaffected
    a.send("anyone else?").await;
    a.expect("00001: anyone else?").await;
    assert_eq!(server.context().registry().member_ids().await.len(), 1);

    server.shutdown().await;
}

#[tokio::test]
async fn test_slot_is_reusable_after_departure() {
    let server = TestServer::spawn_with(1, SessionLimits::default()).await;
    let (mut a, _) = server.join().await;

    a.send("/quit").await;
    a.expect_closed().await;

    let (b, status) = server.join().await;
    assert_eq!(b.id, "00002");
    assert_eq!(status, "You are the coordinator.");

    server.shutdown().await;
}

// ============================================================================
// Input Handling
// ============================================================================

#[tokio::test]
async fn test_oversized_line_is_discarded() {
    let limits = SessionLimits {
        max_line_length: 16,
        ..SessionLimits::default()
    };
    let server = TestServer::spawn_with(4, limits).await;
    let (mut a, _) = server.join().await;

    a.send(&"x".repeat(64)).await;
    a.send("short").await;

    a.expect("00001: short").await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_blank_lines_are_ignored() {
    let server = TestServer::spawn().await;
    let (mut a, _) = server.join().await;
    let (mut b, _) = server.join().await;

    a.send_raw(b"\n   \n\t\n").await;
    a.send("  padded  ").await;

    a.expect("00001: padded").await;
    b.expect("00001: padded").await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_commands_are_case_insensitive() {
    let server = TestServer::spawn().await;
    let (mut a, _) = server.join().await;
    let (mut b, _) = server.join().await;

    a.send("/PRIVATE 00002 psst").await;
    b.expect("Private message from 00001: psst").await;
    a.expect("Private message to 00002: psst").await;

    b.send("/Quit").await;
    b.expect_closed().await;
    a.expect("User 00002 has left the chat.").await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_malformed_commands_are_ignored() {
    let server = TestServer::spawn().await;
    let (mut a, _) = server.join().await;

    a.send("/kick").await;
    a.send("/private 00001").await;
    a.send("after").await;

    a.expect("00001: after").await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_invalid_utf8_is_replaced_not_fatal() {
    let server = TestServer::spawn().await;
    let (mut a, _) = server.join().await;
    let (mut b, _) = server.join().await;

    b.send_raw(b"na\xefve\n").await;

    a.expect("00002: na\u{fffd}ve").await;
    b.expect("00002: na\u{fffd}ve").await;
    assert_eq!(server.context().registry().member_ids().await.len(), 2);

    server.shutdown().await;
}

#[tokio::test]
async fn test_unterminated_flood_is_discarded() {
    let limits = SessionLimits {
        max_line_length: 64,
        ..SessionLimits::default()
    };
    let server = TestServer::spawn_with(4, limits).await;
    let (mut a, _) = server.join().await;

    for _ in 0..64 {
        a.send_raw(&[b'y'; 4096]).await;
    }
    a.send_raw(b"\n").await;
    a.send("still connected").await;

    a.expect("00001: still connected").await;

    server.shutdown().await;
}

// ============================================================================
// Disconnects
// ============================================================================

#[tokio::test]
async fn test_coordinator_dropping_connection_hands_off() {
    let server = TestServer::spawn().await;
    let (a, _) = server.join().await;
    let (mut b, _) = server.join().await;

    drop(a);

    b.expect("You are the new coordinator.").await;
    b.expect("New coordinator is: 00002").await;
    b.expect("User 00001 has left the chat.").await;

    b.send("/kick 00001").await;
    b.expect("00001 not found").await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_every_member_dropping_leaves_relay_empty() {
    let server = TestServer::spawn().await;

    let mut clients = Vec::new();
    for _ in 0..5 {
        clients.push(server.join().await.0);
    }
    drop(clients);

    let context = server.context();
    let deadline = tokio::time::Instant::now() + common::RECV_TIMEOUT;
    while !context.registry().member_ids().await.is_empty()
        || context.coordinator().current().is_some()
    {
        assert!(tokio::time::Instant::now() < deadline, "relay never emptied");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let (late, status) = server.join().await;
    assert_eq!(late.id, "00006");
    assert_eq!(status, "You are the coordinator.");

    server.shutdown().await;
}

// ============================================================================
// Timeouts
// ============================================================================

#[tokio::test]
async fn test_idle_member_is_disconnected() {
    let limits = SessionLimits {
        idle_timeout: Some(Duration::from_millis(200)),
        ..SessionLimits::default()
    };
    let server = TestServer::spawn_with(4, limits).await;
    let (mut a, _) = server.join().await;

    a.expect_closed().await;

    assert_eq!(server.context().coordinator().current(), None);

    server.shutdown().await;
}
