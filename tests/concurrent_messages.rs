//! Integration tests for concurrent writers
//!
//! Many callers append to the same chat at once; the log must still hand out
//! gap-free sequences with non-decreasing timestamps.

mod common;

use chatsum::chat::NewChat;
use chrono::{Duration, Utc};
use common::{create_service, error_kind, signup, ScriptedProvider};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_senders_get_distinct_sequences() {
    let (service, _tmp) = create_service(ScriptedProvider::new(vec![]));
    let service = Arc::new(service);

    let owner = signup(&service, "owner").await;
    let chat = service
        .create_chat(
            &owner.token,
            NewChat {
                name: "firehose".to_string(),
                end_time: Utc::now() + Duration::hours(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let mut tokens = vec![owner.token.clone()];
    for i in 0..4 {
        let member = signup(&service, &format!("member{}", i)).await;
        service
            .add_participant(&owner.token, &chat.id, &member.user.username)
            .await
            .unwrap();
        tokens.push(member.token);
    }

    let tasks = tokens.iter().flat_map(|token| {
        (0..20).map(|n| {
            let service = Arc::clone(&service);
            let token = token.clone();
            let chat_id = chat.id.clone();
            tokio::spawn(async move {
                service
                    .send_message(&token, &chat_id, &format!("message {}", n))
                    .await
            })
        })
    });
    let results = join_all(tasks).await;

    let mut sequences = HashSet::new();
    for joined in results {
        let message = joined.expect("task panicked").expect("send failed");
        assert!(sequences.insert(message.sequence));
    }
    assert_eq!(sequences.len(), 100);

    let history = service
        .list_messages(&owner.token, &chat.id, None)
        .await
        .unwrap();
    let order: Vec<u64> = history.iter().map(|m| m.sequence).collect();
    assert_eq!(order, (1..=100).collect::<Vec<u64>>());
    assert!(history
        .windows(2)
        .all(|pair| pair[0].timestamp <= pair[1].timestamp));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_writer_racing_creator_exit() {
    let (service, _tmp) = create_service(ScriptedProvider::new(vec![]));
    let service = Arc::new(service);

    let owner = signup(&service, "owner").await;
    let guest = signup(&service, "guest").await;
    let chat = service
        .create_chat(
            &owner.token,
            NewChat {
                name: "race".to_string(),
                end_time: Utc::now() + Duration::hours(1),
                invited_ids: vec![guest.user.id.clone()],
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let writer = {
        let service = Arc::clone(&service);
        let token = guest.token.clone();
        let chat_id = chat.id.clone();
        tokio::spawn(async move {
            let mut accepted = 0;
            for n in 0..50 {
                match service.send_message(&token, &chat_id, &format!("n{}", n)).await {
                    Ok(_) => accepted += 1,
                    Err(e) => {
                        assert_eq!(error_kind(&e), "chat_not_active");
                        break;
                    }
                }
            }
            accepted
        })
    };

    service.exit_chat(&owner.token, &chat.id).await.unwrap();
    let accepted = writer.await.unwrap();

    let history = service
        .list_messages(&guest.token, &chat.id, None)
        .await
        .unwrap();
    assert_eq!(history.len(), accepted);

    let err = service
        .send_message(&guest.token, &chat.id, "after close")
        .await
        .unwrap_err();
    assert_eq!(error_kind(&err), "chat_not_active");
}
