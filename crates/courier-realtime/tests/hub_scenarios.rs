//! Delivery scenarios for the hub's actor and targeted paths.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;

use courier_core::config::RealtimeConfig;
use courier_core::types::id::{ConversationId, MessageId, UserId};
use courier_entity::presence::PresenceStatus;
use courier_realtime::message::types::{NewMessage, Ping, ReadReceipt, TypingSignal};
use courier_realtime::{
    AuthenticatedSubject, ClientEvent, ConnectionAdapter, DeliveryMiss, Hub, MemoryParticipants,
    ParticipantRelay, ServerEvent, loopback,
};

fn hub_with_capacity(client_queue_capacity: usize) -> Hub {
    Hub::start(&RealtimeConfig {
        client_queue_capacity,
        hub_queue_capacity: 64,
    })
}

fn message(conversation_id: ConversationId, sender_id: UserId, content: &str) -> NewMessage {
    NewMessage {
        message_id: MessageId::new(),
        conversation_id,
        sender_id,
        content: content.to_string(),
        sent_at: Utc::now(),
    }
}

fn drain(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn presence_of(events: &[ServerEvent], user_id: UserId) -> Vec<PresenceStatus> {
    events
        .iter()
        .filter_map(|e| match e {
            ServerEvent::PresenceUpdate(update) if update.user_id == user_id => Some(update.status),
            _ => None,
        })
        .collect()
}

fn new_messages(events: &[ServerEvent]) -> Vec<&NewMessage> {
    events
        .iter()
        .filter_map(|e| match e {
            ServerEvent::NewMessage(m) => Some(m),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_targeted_event_reaches_registered_user_once() {
    let hub = hub_with_capacity(8);
    let user = UserId::new();
    let (_client, mut rx) = hub.register(user).await.unwrap();

    let sent = message(ConversationId::new(), UserId::new(), "hello");
    let report = hub
        .broadcast_to_users(&ServerEvent::NewMessage(sent.clone()), &[user])
        .await;
    assert_eq!(report.delivered, 1);
    assert!(report.is_complete());

    let events = drain(&mut rx);
    assert_eq!(new_messages(&events), vec![&sent]);
}

#[tokio::test]
async fn test_unregistered_targets_are_skipped_silently() {
    let hub = hub_with_capacity(8);
    let online = UserId::new();
    let offline = UserId::new();
    let (_client, mut rx) = hub.register(online).await.unwrap();

    let report = hub
        .broadcast_message(message(ConversationId::new(), online, "hi"), &[offline, online])
        .await;
    assert_eq!(report.delivered, 1);
    assert_eq!(report.miss_for(offline), Some(DeliveryMiss::RecipientOffline));
    assert_eq!(new_messages(&drain(&mut rx)).len(), 1);
    assert_eq!(hub.metrics_snapshot().missed_offline, 1);
}

#[tokio::test]
async fn test_conversation_delivery_follows_registration() {
    let hub = hub_with_capacity(16);
    let (u1, u2) = (UserId::new(), UserId::new());
    let conversation = ConversationId::new();

    let (_c2, mut rx2) = hub.register(u2).await.unwrap();
    let (c1, mut rx1) = hub.register(u1).await.unwrap();

    let first = message(conversation, u1, "first");
    hub.broadcast_message(first.clone(), &[u1, u2]).await;
    assert_eq!(new_messages(&drain(&mut rx1)), vec![&first]);

    assert!(hub.unregister(&c1).await);

    let second = message(conversation, u2, "second");
    let report = hub.broadcast_message(second.clone(), &[u1, u2]).await;
    assert_eq!(report.delivered, 1);
    assert_eq!(report.miss_for(u1), Some(DeliveryMiss::RecipientOffline));

    let events = drain(&mut rx2);
    assert_eq!(new_messages(&events), vec![&first, &second]);
    assert_eq!(
        presence_of(&events, u1),
        vec![PresenceStatus::Online, PresenceStatus::Offline]
    );
    assert!(rx1.recv().await.is_none());
}

#[tokio::test]
async fn test_saturated_queue_drops_extra_event_and_keeps_backlog() {
    let capacity = 4;
    let hub = hub_with_capacity(capacity);
    let user = UserId::new();
    let (_client, mut rx) = hub.register(user).await.unwrap();
    let conversation = ConversationId::new();

    // The online presence event already holds one slot.
    let mut queued = Vec::new();
    for i in 0..capacity - 1 {
        let m = message(conversation, UserId::new(), &format!("m{i}"));
        let report = hub.broadcast_message(m.clone(), &[user]).await;
        assert_eq!(report.delivered, 1);
        queued.push(m);
    }

    let overflow = message(conversation, UserId::new(), "overflow");
    let report = hub.broadcast_message(overflow, &[user]).await;
    assert_eq!(report.delivered, 0);
    assert_eq!(report.miss_for(user), Some(DeliveryMiss::QueueFull));
    assert_eq!(hub.metrics_snapshot().missed_queue_full, 1);

    let events = drain(&mut rx);
    assert_eq!(events.len(), capacity);
    assert_eq!(new_messages(&events), queued.iter().collect::<Vec<_>>());
}

#[tokio::test]
async fn test_typing_skips_the_typer() {
    let hub = hub_with_capacity(8);
    let (typer, reader) = (UserId::new(), UserId::new());
    let (_t, mut typer_rx) = hub.register(typer).await.unwrap();
    let (_r, mut reader_rx) = hub.register(reader).await.unwrap();
    drain(&mut typer_rx);
    drain(&mut reader_rx);

    let report = hub
        .broadcast_typing(ConversationId::new(), typer, &[typer, reader], true)
        .await;
    assert_eq!(report.delivered, 1);
    assert!(drain(&mut typer_rx).is_empty());
    assert!(matches!(
        drain(&mut reader_rx).as_slice(),
        [ServerEvent::TypingIndicator(t)] if t.user_id == typer && t.is_typing
    ));
}

#[tokio::test]
async fn test_typing_signal_is_relayed_through_hooks() {
    let hub = hub_with_capacity(8);
    let conversation = ConversationId::new();
    let (typer, reader) = (UserId::new(), UserId::new());

    let participants = Arc::new(MemoryParticipants::new());
    participants.set(conversation, vec![typer, reader]);
    let adapter = ConnectionAdapter::new(
        hub.clone(),
        Arc::new(ParticipantRelay::new(hub.clone(), participants)),
    );

    let (_r, mut reader_rx) = hub.register(reader).await.unwrap();
    let (mut client, source, sink) = loopback(8);
    let served = tokio::spawn({
        let adapter = adapter.clone();
        async move {
            adapter
                .serve(AuthenticatedSubject::trusted(typer), source, sink)
                .await
        }
    });
    client.recv().await;

    client
        .send(ClientEvent::TypingIndicator(TypingSignal {
            conversation_id: conversation,
            is_typing: true,
        }))
        .await;
    // The pong proves the typing event was handled first.
    client.send(ClientEvent::Ping(Ping { timestamp: 5 })).await;
    assert!(matches!(client.recv().await, Some(ServerEvent::Pong(_))));

    let events = drain(&mut reader_rx);
    assert!(events.iter().any(|e| matches!(
        e,
        ServerEvent::TypingIndicator(t) if t.user_id == typer && t.conversation_id == conversation
    )));

    client.hang_up();
    served.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_read_receipt_is_relayed_as_delivered() {
    let hub = hub_with_capacity(8);
    let conversation = ConversationId::new();
    let (author, reader, outsider) = (UserId::new(), UserId::new(), UserId::new());

    let participants = Arc::new(MemoryParticipants::new());
    participants.set(conversation, vec![author, reader]);
    let adapter = ConnectionAdapter::new(
        hub.clone(),
        Arc::new(ParticipantRelay::new(hub.clone(), participants)),
    );

    let (_a, mut author_rx) = hub.register(author).await.unwrap();
    let (_o, mut outsider_rx) = hub.register(outsider).await.unwrap();
    let (mut client, source, sink) = loopback(8);
    let served = tokio::spawn({
        let adapter = adapter.clone();
        async move {
            adapter
                .serve(AuthenticatedSubject::trusted(reader), source, sink)
                .await
        }
    });
    client.recv().await;

    let message_id = MessageId::new();
    client
        .send(ClientEvent::ReadReceipt(ReadReceipt {
            message_id,
            conversation_id: conversation,
        }))
        .await;
    client.send(ClientEvent::Ping(Ping { timestamp: 6 })).await;
    let mut reader_events = Vec::new();
    while let Some(event) = client.recv().await {
        if matches!(event, ServerEvent::Pong(_)) {
            break;
        }
        reader_events.push(event);
    }

    let delivered: Vec<_> = drain(&mut author_rx)
        .into_iter()
        .filter_map(|e| match e {
            ServerEvent::Delivered(d) => Some(d),
            _ => None,
        })
        .collect();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].message_id, message_id);
    assert_eq!(delivered[0].conversation_id, conversation);
    assert_eq!(delivered[0].user_id, reader);

    assert!(!drain(&mut outsider_rx).iter().any(|e| matches!(e, ServerEvent::Delivered(_))));
    assert!(!reader_events.iter().any(|e| matches!(e, ServerEvent::Delivered(_))));

    client.hang_up();
    served.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_read_receipt_from_non_participant_is_dropped() {
    let hub = hub_with_capacity(8);
    let conversation = ConversationId::new();
    let (author, stranger) = (UserId::new(), UserId::new());

    let participants = Arc::new(MemoryParticipants::new());
    participants.set(conversation, vec![author]);
    let adapter = ConnectionAdapter::new(
        hub.clone(),
        Arc::new(ParticipantRelay::new(hub.clone(), participants)),
    );

    let (_a, mut author_rx) = hub.register(author).await.unwrap();
    let (mut client, source, sink) = loopback(8);
    let served = tokio::spawn({
        let adapter = adapter.clone();
        async move {
            adapter
                .serve(AuthenticatedSubject::trusted(stranger), source, sink)
                .await
        }
    });
    client.recv().await;

    client
        .send(ClientEvent::ReadReceipt(ReadReceipt {
            message_id: MessageId::new(),
            conversation_id: conversation,
        }))
        .await;
    client.send(ClientEvent::Ping(Ping { timestamp: 7 })).await;
    while let Some(event) = client.recv().await {
        if matches!(event, ServerEvent::Pong(_)) {
            break;
        }
    }

    assert!(!drain(&mut author_rx).iter().any(|e| matches!(e, ServerEvent::Delivered(_))));

    client.hang_up();
    served.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_reconnect_cancels_previous_connection() {
    let hub = hub_with_capacity(8);
    let adapter = ConnectionAdapter::without_hooks(hub.clone());
    let user = UserId::new();

    let (mut first, source, sink) = loopback(8);
    let first_served = tokio::spawn({
        let adapter = adapter.clone();
        async move {
            adapter
                .serve(AuthenticatedSubject::trusted(user), source, sink)
                .await
        }
    });
    first.recv().await;

    let (mut second, source, sink) = loopback(8);
    let second_served = tokio::spawn({
        let adapter = adapter.clone();
        async move {
            adapter
                .serve(AuthenticatedSubject::trusted(user), source, sink)
                .await
        }
    });

    assert_eq!(
        first_served.await.unwrap().unwrap(),
        courier_realtime::DisconnectReason::Cancelled
    );
    assert!(first.recv().await.is_none());
    assert!(hub.is_online(user).await);

    second.send(ClientEvent::Ping(Ping { timestamp: 9 })).await;
    let mut saw_pong = false;
    while let Some(event) = second.recv().await {
        if matches!(event, ServerEvent::Pong(_)) {
            saw_pong = true;
            break;
        }
    }
    assert!(saw_pong);

    second.hang_up();
    second_served.await.unwrap().unwrap();
    assert!(!hub.is_online(user).await);
}
