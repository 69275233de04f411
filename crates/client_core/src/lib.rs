use std::sync::Arc;

use shared::domain::{ChatData, Message, Participant, ParticipantId, Room};
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info};

pub mod classify;
pub mod composer;
pub mod loader;
pub mod preview;
pub mod transcript;

pub use classify::{classify, preview_kind, AttachmentKind};
pub use composer::{
    AttachedFile, AttachmentPreview, ComposeError, Composer, ComposerEvent,
    MissingThumbnailCapturer, ThumbnailCaptureError, ThumbnailCapturer,
};
pub use loader::{FixtureLoader, LoadError, LoadState};
pub use preview::ObjectUrlRegistry;
pub use transcript::{Transcript, UNKNOWN_SENDER_NAME};

const CLIENT_EVENT_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub enum ClientEvent {
    LoadStarted,
    TranscriptReady { room: Option<Room> },
    LoadFailed(String),
    MessageAppended(Message),
}

struct ClientState {
    load: LoadState,
    transcript: Transcript,
}

/// Facade over the one-shot fixture load and the live transcript for the
/// active room. The view layer observes it through snapshots and the event
/// stream; all mutation happens through `load` and `append_message`.
pub struct ChatClient {
    loader: FixtureLoader,
    current_user: ParticipantId,
    inner: Mutex<ClientState>,
    events: broadcast::Sender<ClientEvent>,
}

impl ChatClient {
    pub fn new(loader: FixtureLoader, current_user: ParticipantId) -> Arc<Self> {
        let (events, _) = broadcast::channel(CLIENT_EVENT_CAPACITY);
        Arc::new(Self {
            loader,
            current_user,
            inner: Mutex::new(ClientState {
                load: LoadState::Loading,
                transcript: Transcript::new(),
            }),
            events,
        })
    }

    /// Single load attempt: fetches the fixture and seeds the transcript
    /// from its first room. Dropping the future mid-fetch discards the
    /// result without touching any state.
    pub async fn load(&self) {
        {
            self.inner.lock().await.load = LoadState::Loading;
        }
        let _ = self.events.send(ClientEvent::LoadStarted);

        match self.loader.load().await {
            Ok(data) => {
                let room = {
                    let mut inner = self.inner.lock().await;
                    inner.transcript.seed(&data);
                    let room = inner.transcript.room().cloned();
                    inner.load = LoadState::Ready(data);
                    room
                };
                info!(
                    room = room.as_ref().map(|r| r.name.as_str()).unwrap_or("<none>"),
                    "chat fixture loaded"
                );
                let _ = self.events.send(ClientEvent::TranscriptReady { room });
            }
            Err(err) => {
                let message = err.to_string();
                {
                    self.inner.lock().await.load = LoadState::Failed(message.clone());
                }
                error!(error = %message, "chat fixture load failed");
                let _ = self.events.send(ClientEvent::LoadFailed(message));
            }
        }
    }

    /// Seeds directly from already-loaded data, bypassing the fetch.
    pub async fn seed(&self, data: ChatData) {
        let room = {
            let mut inner = self.inner.lock().await;
            inner.transcript.seed(&data);
            let room = inner.transcript.room().cloned();
            inner.load = LoadState::Ready(data);
            room
        };
        let _ = self.events.send(ClientEvent::TranscriptReady { room });
    }

    pub async fn load_state(&self) -> LoadState {
        self.inner.lock().await.load.clone()
    }

    pub async fn room(&self) -> Option<Room> {
        self.inner.lock().await.transcript.room().cloned()
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.inner.lock().await.transcript.messages().to_vec()
    }

    pub async fn participants(&self) -> Vec<Participant> {
        self.inner.lock().await.transcript.participants().to_vec()
    }

    pub async fn resolve_participant(&self, sender: &ParticipantId) -> Participant {
        self.inner.lock().await.transcript.resolve_participant(sender)
    }

    pub async fn is_own_message(&self, message: &Message) -> bool {
        message.sender == self.current_user
    }

    pub fn current_user(&self) -> &ParticipantId {
        &self.current_user
    }

    /// Append cannot fail; the list is unbounded and in-memory only.
    pub async fn append_message(&self, message: Message) {
        {
            self.inner.lock().await.transcript.append(message.clone());
        }
        let _ = self.events.send(ClientEvent::MessageAppended(message));
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
