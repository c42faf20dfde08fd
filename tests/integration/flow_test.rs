//! Login, connect, and deliver across the whole stack.

use std::time::Duration;

use chrono::Utc;

use courier_core::error::ErrorKind;
use courier_core::types::id::{ConversationId, MessageId, UserId};
use courier_entity::presence::PresenceStatus;
use courier_realtime::message::types::NewMessage;
use courier_realtime::{DisconnectReason, ServerEvent};

use crate::helpers::{TestEnv, recv_until};

fn is_presence(user_id: UserId, status: PresenceStatus) -> impl FnMut(&ServerEvent) -> bool {
    move |event| matches!(event, ServerEvent::PresenceUpdate(p) if p.user_id == user_id && p.status == status)
}

#[tokio::test]
async fn test_logged_in_users_exchange_messages() {
    let env = TestEnv::new();
    let alice = env.login("+15550000001").await;
    let bob = env.login("+15550000002").await;

    let alice_subject = env
        .authenticator
        .authenticate(Some(&format!("Bearer {}", alice.tokens.access_token)))
        .unwrap();
    let bob_subject = env
        .authenticator
        .authenticate(Some(&format!("bearer {}", bob.tokens.access_token)))
        .unwrap();
    assert_eq!(alice_subject.user_id, alice.user.id);

    let (mut alice_client, _alice_task) = env.connect(alice_subject);
    recv_until(&mut alice_client, is_presence(alice.user.id, PresenceStatus::Online)).await;
    let (mut bob_client, _bob_task) = env.connect(bob_subject);
    recv_until(&mut alice_client, is_presence(bob.user.id, PresenceStatus::Online)).await;

    let sent = NewMessage {
        message_id: MessageId::new(),
        conversation_id: ConversationId::new(),
        sender_id: alice.user.id,
        content: "hello bob".to_string(),
        sent_at: Utc::now(),
    };
    let report = env
        .hub
        .broadcast_message(sent.clone(), &[alice.user.id, bob.user.id])
        .await;
    assert_eq!(report.delivered, 2);

    for client in [&mut alice_client, &mut bob_client] {
        let event = recv_until(client, |e| matches!(e, ServerEvent::NewMessage(_))).await;
        assert!(matches!(event, ServerEvent::NewMessage(m) if m == sent));
    }
}

#[tokio::test]
async fn test_stream_rejects_refresh_token_and_accepts_rotated_access() {
    let env = TestEnv::new();
    let login = env.login("+15550000003").await;

    let err = env
        .authenticator
        .authenticate(Some(&format!("Bearer {}", login.tokens.refresh_token)))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);

    let rotated = env.sessions.refresh(&login.tokens.refresh_token).await.unwrap();
    let subject = env
        .authenticator
        .authenticate_token(&rotated.access_token)
        .unwrap();
    assert_eq!(subject.user_id, login.user.id);
}

#[tokio::test]
async fn test_logout_all_ends_refresh_but_not_open_streams() {
    let env = TestEnv::new();
    let login = env.login("+15550000004").await;
    let subject = env
        .authenticator
        .authenticate_token(&login.tokens.access_token)
        .unwrap();
    let (mut client, _task) = env.connect(subject);
    recv_until(&mut client, is_presence(login.user.id, PresenceStatus::Online)).await;

    let revoked = env
        .sessions
        .revoke_all_sessions(&login.tokens.access_token)
        .await
        .unwrap();
    assert_eq!(revoked, 1);

    let err = env.sessions.refresh(&login.tokens.refresh_token).await.unwrap_err();
    assert!(err.is_unauthenticated());
    assert!(env.hub.is_online(login.user.id).await);
}

#[tokio::test]
async fn test_disconnect_announces_offline() {
    let env = TestEnv::new();
    let watcher = env.login("+15550000005").await;
    let leaver = env.login("+15550000006").await;

    let (mut watcher_client, _w) = env.connect(
        env.authenticator
            .authenticate_token(&watcher.tokens.access_token)
            .unwrap(),
    );
    let (mut leaver_client, leaver_task) = env.connect(
        env.authenticator
            .authenticate_token(&leaver.tokens.access_token)
            .unwrap(),
    );
    recv_until(&mut watcher_client, is_presence(leaver.user.id, PresenceStatus::Online)).await;

    leaver_client.hang_up();
    assert_eq!(leaver_task.await.unwrap(), DisconnectReason::EndOfStream);

    recv_until(&mut watcher_client, is_presence(leaver.user.id, PresenceStatus::Offline)).await;
    assert!(!env.hub.is_online(leaver.user.id).await);
}

#[tokio::test]
async fn test_shutdown_cancels_every_stream() {
    let env = TestEnv::new();
    let login = env.login("+15550000007").await;
    let (mut client, task) = env.connect(
        env.authenticator
            .authenticate_token(&login.tokens.access_token)
            .unwrap(),
    );
    recv_until(&mut client, is_presence(login.user.id, PresenceStatus::Online)).await;

    env.hub.shutdown().await;

    let reason = tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("stream did not stop")
        .unwrap();
    assert_eq!(reason, DisconnectReason::Cancelled);
    assert!(client.recv().await.is_none());
}
