//! Client integration tests
//!
//! Each test drives a real client against a scripted in-process gateway
//! over a local WebSocket: full identify/resume handshakes, heartbeats,
//! and dispatch fan-out, with no external services involved.
//!
//! Run with: cargo test -p integration-tests --test client_tests

use std::time::Duration;

use banter_client::{AppError, ConnectionState, Event, EventType, Snowflake};
use banter_gateway::protocol::{GatewayMessage, OpCode};
use integration_tests::{fixtures::*, test_client, wait_until, ScriptedGateway};
use tokio::sync::mpsc;

// ============================================================================
// Connection Tests
// ============================================================================

#[tokio::test]
async fn test_connect_performs_identify_handshake() {
    let gateway = ScriptedGateway::start(|mut conn| async move {
        conn.send(hello_frame(45_000)).await?;
        let identify = conn.expect_identify().await?;
        anyhow::ensure!(identify.token == "secret-token");
        conn.send(ready_frame("sess-1", 1, 1, &[42])).await?;
        conn.ack_until_disconnect().await;
        Ok(())
    })
    .await
    .expect("Failed to start gateway");

    let client = test_client("secret-token", &gateway, 1);
    client.connect().await.expect("Failed to connect");

    assert!(client.is_connected());
    assert_eq!(client.state(), ConnectionState::Connected);

    let user = client.user().expect("current user should be cached");
    assert_eq!(user.id, Snowflake::new(1));

    // Guilds from the READY snapshot land in the cache
    assert_eq!(client.guilds().len(), 1);
    assert!(client.get_guild(Snowflake::new(42)).is_some());

    client.close().await.unwrap();
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_second_connect_is_rejected() {
    let gateway = ScriptedGateway::start(|mut conn| async move {
        conn.handshake(45_000, "sess-dup", 8).await?;
        conn.ack_until_disconnect().await;
        Ok(())
    })
    .await
    .expect("Failed to start gateway");

    let client = test_client("tok", &gateway, 8);
    client.connect().await.expect("Failed to connect");

    let result = client.connect().await;
    assert!(matches!(result, Err(AppError::AlreadyConnected)));

    client.close().await.unwrap();

    // A closed client may connect again on a fresh session
    client.connect().await.expect("Failed to reconnect");
    assert_eq!(gateway.log.connection_count(), 2);
    assert_eq!(gateway.log.frames_with_op(OpCode::Identify).len(), 2);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_authentication_close_code_is_fatal() {
    let gateway = ScriptedGateway::start(|mut conn| async move {
        conn.send(hello_frame(45_000)).await?;
        conn.expect_identify().await?;
        conn.close_with(4004).await
    })
    .await
    .expect("Failed to start gateway");

    let client = test_client("bad-token", &gateway, 1);
    let result = client.connect().await;

    assert!(matches!(result, Err(AppError::AuthenticationFailed)));
    assert_eq!(client.state(), ConnectionState::Disconnected);

    // No retry follows a fatal close
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(gateway.log.connection_count(), 1);
}

// ============================================================================
// Event Tests
// ============================================================================

#[tokio::test]
async fn test_dispatch_reaches_listener_and_waiter() {
    let gateway = ScriptedGateway::start(|mut conn| async move {
        conn.handshake(45_000, "sess-events", 1).await?;
        conn.send(message_frame(2, 7, "ping")).await?;

        // Hold the second message until the client's presence update shows
        // up, so the test can register a waiter first
        loop {
            let frame = conn.recv().await?;
            if frame.as_presence_update().is_some() {
                break;
            }
            if frame.as_heartbeat_seq().is_some() {
                conn.send(GatewayMessage::heartbeat_ack()).await?;
            }
        }
        conn.send(message_frame(3, 7, "pong")).await?;
        conn.ack_until_disconnect().await;
        Ok(())
    })
    .await
    .expect("Failed to start gateway");

    let client = test_client("tok", &gateway, 1);

    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
    client
        .on_event(EventType::MessageCreate, move |event| {
            let seen_tx = seen_tx.clone();
            async move {
                if let Event::MessageCreate(message) = event {
                    let _ = seen_tx.send(message.content);
                }
                Ok(())
            }
        })
        .unwrap();

    client.connect().await.expect("Failed to connect");

    // The listener registered before connecting sees the first message
    let content = tokio::time::timeout(Duration::from_secs(5), seen_rx.recv())
        .await
        .expect("listener should see the first message")
        .unwrap();
    assert_eq!(content, "ping");

    // The waiter registers on its first poll, before the presence update
    // that releases the second message reaches the wire
    let (waited, presence) = tokio::join!(
        client.wait_for(
            EventType::MessageCreate,
            |event| matches!(event, Event::MessageCreate(m) if m.content == "pong"),
            Some(Duration::from_secs(5)),
        ),
        client.update_presence("online"),
    );
    presence.unwrap();
    let event = waited.unwrap();
    assert!(matches!(event, Event::MessageCreate(m) if m.content == "pong"));

    // Both messages are cached under their channel
    assert_eq!(client.channel_history(Snowflake::new(7)).len(), 2);

    client.close().await.unwrap();
}

// ============================================================================
// Session Recovery Tests
// ============================================================================

#[tokio::test]
async fn test_resumes_session_after_disruption() {
    let gateway = ScriptedGateway::start(|mut conn| async move {
        match conn.attempt {
            0 => {
                conn.handshake(45_000, "sess-resume", 5).await?;
                conn.send(guild_frame(2, 42, "before the drop")).await?;
                conn.close_with(4000).await
            }
            _ => {
                conn.send(hello_frame(45_000)).await?;
                let resume = conn.expect_resume().await?;
                anyhow::ensure!(resume.session_id == "sess-resume");
                anyhow::ensure!(resume.seq == 2);
                conn.send(resumed_frame(3)).await?;
                conn.ack_until_disconnect().await;
                Ok(())
            }
        }
    })
    .await
    .expect("Failed to start gateway");

    let client = test_client("tok", &gateway, 5);

    // Register before connecting so the resume cannot race past the test
    let (resumed_tx, mut resumed_rx) = mpsc::unbounded_channel();
    client
        .on_event(EventType::Resumed, move |_| {
            let resumed_tx = resumed_tx.clone();
            async move {
                let _ = resumed_tx.send(());
                Ok(())
            }
        })
        .unwrap();

    client.connect().await.expect("Failed to connect");

    tokio::time::timeout(Duration::from_secs(5), resumed_rx.recv())
        .await
        .expect("client should resume after the scripted close")
        .unwrap();

    assert_eq!(gateway.log.connection_count(), 2);
    assert_eq!(gateway.log.frames_with_op(OpCode::Resume).len(), 1);
    assert!(client.is_connected());

    // State cached before the drop survives the resume
    let guild = client.get_guild(Snowflake::new(42)).unwrap();
    assert_eq!(guild.name, "before the drop");

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_invalid_session_starts_over_with_identify() {
    let gateway = ScriptedGateway::start(|mut conn| async move {
        match conn.attempt {
            0 => {
                conn.handshake(45_000, "sess-stale", 9).await?;
                conn.send(GatewayMessage::invalid_session(false)).await?;
                conn.ack_until_disconnect().await;
                Ok(())
            }
            _ => {
                conn.send(hello_frame(45_000)).await?;
                conn.expect_identify().await?;
                conn.send(ready_frame("sess-fresh", 1, 9, &[])).await?;
                conn.ack_until_disconnect().await;
                Ok(())
            }
        }
    })
    .await
    .expect("Failed to start gateway");

    let client = test_client("tok", &gateway, 9);

    let (ready_tx, mut ready_rx) = mpsc::unbounded_channel();
    client
        .on_event(EventType::Ready, move |_| {
            let ready_tx = ready_tx.clone();
            async move {
                let _ = ready_tx.send(());
                Ok(())
            }
        })
        .unwrap();

    client.connect().await.expect("Failed to connect");

    // One READY per session: the original and the re-identified one
    for _ in 0..2 {
        tokio::time::timeout(Duration::from_secs(5), ready_rx.recv())
            .await
            .expect("client should identify afresh after the invalid session")
            .unwrap();
    }

    assert_eq!(gateway.log.connection_count(), 2);
    assert_eq!(gateway.log.frames_with_op(OpCode::Identify).len(), 2);
    assert!(gateway.log.frames_with_op(OpCode::Resume).is_empty());

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_zombie_connection_is_detected_and_resumed() {
    let gateway = ScriptedGateway::start(|mut conn| async move {
        match conn.attempt {
            0 => {
                conn.handshake(40, "sess-zombie", 4).await?;
                // Never acknowledge a beat; swallow frames until the client
                // gives the connection up
                while conn.recv().await.is_ok() {}
                Ok(())
            }
            _ => {
                conn.send(hello_frame(45_000)).await?;
                conn.expect_resume().await?;
                conn.send(resumed_frame(2)).await?;
                conn.ack_until_disconnect().await;
                Ok(())
            }
        }
    })
    .await
    .expect("Failed to start gateway");

    let client = test_client("tok", &gateway, 4);

    let (resumed_tx, mut resumed_rx) = mpsc::unbounded_channel();
    client
        .on_event(EventType::Resumed, move |_| {
            let resumed_tx = resumed_tx.clone();
            async move {
                let _ = resumed_tx.send(());
                Ok(())
            }
        })
        .unwrap();

    client.connect().await.expect("Failed to connect");

    tokio::time::timeout(Duration::from_secs(5), resumed_rx.recv())
        .await
        .expect("client should detect the dead connection and resume")
        .unwrap();

    assert_eq!(gateway.log.connection_count(), 2);
    assert!(client.is_connected());

    client.close().await.unwrap();
}

// ============================================================================
// Heartbeat Tests
// ============================================================================

#[tokio::test]
async fn test_heartbeats_flow_and_latency_is_measured() {
    let gateway = ScriptedGateway::start(|mut conn| async move {
        conn.handshake(30, "sess-hb", 3).await?;
        for _ in 0..2 {
            conn.expect_heartbeat().await?;
            conn.send(GatewayMessage::heartbeat_ack()).await?;
        }
        conn.ack_until_disconnect().await;
        Ok(())
    })
    .await
    .expect("Failed to start gateway");

    let client = test_client("tok", &gateway, 3);
    client.connect().await.expect("Failed to connect");

    assert!(wait_until(Duration::from_secs(5), || client.latency().is_some()).await);

    client.close().await.unwrap();
}

// ============================================================================
// Presence Tests
// ============================================================================

#[tokio::test]
async fn test_update_presence_reaches_the_wire() {
    let gateway = ScriptedGateway::start(|mut conn| async move {
        conn.handshake(45_000, "sess-presence", 2).await?;
        conn.ack_until_disconnect().await;
        Ok(())
    })
    .await
    .expect("Failed to start gateway");

    let client = test_client("tok", &gateway, 2);
    client.connect().await.expect("Failed to connect");

    client.update_presence("idle").await.unwrap();

    assert!(
        wait_until(Duration::from_secs(5), || {
            gateway
                .log
                .frames_with_op(OpCode::PresenceUpdate)
                .iter()
                .any(|f| f.as_presence_update().is_some_and(|p| p.status == "idle"))
        })
        .await
    );

    client.close().await.unwrap();
}
