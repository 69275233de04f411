use super::*;
use std::time::Duration;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::time::timeout;
use url::Url;

async fn serve(router: Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    Url::parse(&format!("http://{addr}/data/conversation.json")).expect("fixture url")
}

fn fixture_value() -> Value {
    json!({
        "results": [{
            "room": {
                "name": "Product A inquiry",
                "id": 12456,
                "image_url": "https://example.com/room.jpg",
                "participant": [
                    { "id": "admin@mail.com", "name": "Admin", "role": 0 },
                    { "id": "agent@mail.com", "name": "Agent A", "role": 1 },
                    { "id": "customer@mail.com", "name": "King Customer", "role": 2 }
                ]
            },
            "comments": [
                {
                    "id": 885512,
                    "type": "text",
                    "message": "Hello, how can I help you today?",
                    "sender": "agent@mail.com",
                    "timestamp": "2024-06-01T08:00:00Z"
                },
                {
                    "id": 885513,
                    "type": "image",
                    "message": "",
                    "sender": "customer@mail.com",
                    "timestamp": "2024-06-01T08:01:00Z",
                    "media": {
                        "url": "https://example.com/receipt.jpg",
                        "filename": "receipt.jpg",
                        "size": 2048,
                        "alt": "receipt.jpg"
                    }
                }
            ]
        }]
    })
}

fn fixture_data() -> ChatData {
    serde_json::from_value(fixture_value()).expect("fixture parses")
}

fn current_user() -> ParticipantId {
    ParticipantId::from("customer@mail.com")
}

async fn next_event(events: &mut broadcast::Receiver<ClientEvent>) -> ClientEvent {
    timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("timed out waiting for client event")
        .expect("client event stream open")
}

#[tokio::test]
async fn load_seeds_the_transcript_from_the_first_room() {
    let url = serve(Router::new().route(
        "/data/conversation.json",
        get(|| async { Json(fixture_value()) }),
    ))
    .await;

    let client = ChatClient::new(FixtureLoader::from_url(url), current_user());
    let mut events = client.subscribe_events();
    client.load().await;

    assert!(client.load_state().await.is_ready());

    let expected = fixture_data();
    assert_eq!(client.messages().await, expected.results[0].comments);
    assert_eq!(
        client.participants().await,
        expected.results[0].room.participant
    );
    assert_eq!(
        client.room().await.map(|room| room.name),
        Some("Product A inquiry".to_string())
    );

    assert!(matches!(next_event(&mut events).await, ClientEvent::LoadStarted));
    match next_event(&mut events).await {
        ClientEvent::TranscriptReady { room } => {
            assert_eq!(room.map(|r| r.name), Some("Product A inquiry".to_string()));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn load_surfaces_a_non_success_status_as_an_error_state() {
    // No route registered: the fixture path answers 404.
    let url = serve(Router::new()).await;

    let client = ChatClient::new(FixtureLoader::from_url(url), current_user());
    let mut events = client.subscribe_events();
    client.load().await;

    match client.load_state().await {
        LoadState::Failed(message) => assert!(message.contains("404"), "got: {message}"),
        other => panic!("expected failed state, got {other:?}"),
    }

    assert!(matches!(next_event(&mut events).await, ClientEvent::LoadStarted));
    assert!(matches!(
        next_event(&mut events).await,
        ClientEvent::LoadFailed(_)
    ));
    assert!(client.messages().await.is_empty());
}

#[tokio::test]
async fn load_surfaces_a_malformed_body_as_an_error_state() {
    let url = serve(Router::new().route(
        "/data/conversation.json",
        get(|| async { "definitely not chat data" }),
    ))
    .await;

    let client = ChatClient::new(FixtureLoader::from_url(url), current_user());
    client.load().await;

    match client.load_state().await {
        LoadState::Failed(message) => {
            assert!(message.contains("not valid chat data"), "got: {message}")
        }
        other => panic!("expected failed state, got {other:?}"),
    }
}

#[tokio::test]
async fn loader_reads_the_fixture_from_a_local_file() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = std::env::temp_dir().join(format!("chat_fixture_{suffix}.json"));
    std::fs::write(&path, fixture_value().to_string()).expect("write fixture");

    let loaded = FixtureLoader::from_path(&path).load().await.expect("load");
    assert_eq!(loaded, fixture_data());

    std::fs::remove_file(path).expect("cleanup");
}

#[tokio::test]
async fn loader_reports_a_missing_file_as_an_io_error() {
    let err = FixtureLoader::from_path("/nonexistent/conversation.json")
        .load()
        .await
        .expect_err("missing file");
    assert!(matches!(err, LoadError::Io(_)));
}

#[tokio::test]
async fn append_message_emits_an_event_and_preserves_order() {
    let client = ChatClient::new(
        FixtureLoader::from_path("/unused/fixture.json"),
        current_user(),
    );
    client.seed(fixture_data()).await;
    let before = client.messages().await;

    let mut events = client.subscribe_events();
    let message = Message {
        id: shared::domain::MessageId(885514),
        kind: shared::domain::MessageKind::Text,
        text: "thanks!".to_string(),
        sender: current_user(),
        timestamp: chrono::Utc::now(),
        media: None,
    };
    client.append_message(message.clone()).await;

    let after = client.messages().await;
    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(&after[..before.len()], before.as_slice());
    assert_eq!(after.last(), Some(&message));

    match next_event(&mut events).await {
        ClientEvent::MessageAppended(appended) => assert_eq!(appended, message),
        other => panic!("unexpected event {other:?}"),
    }

    assert!(client.is_own_message(&message).await);
}

#[tokio::test]
async fn unknown_senders_resolve_to_the_placeholder_customer() {
    let client = ChatClient::new(
        FixtureLoader::from_path("/unused/fixture.json"),
        current_user(),
    );
    client.seed(fixture_data()).await;

    let known = client
        .resolve_participant(&ParticipantId::from("agent@mail.com"))
        .await;
    assert_eq!(known.name, "Agent A");

    let unknown = client
        .resolve_participant(&ParticipantId::from("ghost@mail.com"))
        .await;
    assert_eq!(unknown.name, UNKNOWN_SENDER_NAME);
    assert_eq!(client.participants().await.len(), 3);
}
