use std::{path::PathBuf, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use shared::domain::{MediaContent, Message, MessageId, MessageKind, ParticipantId};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

use crate::{
    classify::{classify, preview_kind, AttachmentKind, PDF_MIME},
    preview::ObjectUrlRegistry,
};

/// Frame grabbed for video thumbnails is taken one second into the stream.
pub const THUMBNAIL_SEEK_OFFSET: Duration = Duration::from_secs(1);

const COMPOSER_EVENT_CAPACITY: usize = 64;

/// A file selected for the next outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedFile {
    pub name: String,
    pub content_type: String,
    pub size: u64,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ThumbnailCaptureError {
    #[error("failed to decode video: {0}")]
    Decode(String),
    #[error("file has no video stream")]
    NoVideoStream,
}

/// Seam for the video-thumbnail pipeline: decode the file, seek to `offset`,
/// rasterize a single frame and return a reference to the encoded still.
#[async_trait]
pub trait ThumbnailCapturer: Send + Sync {
    async fn capture(
        &self,
        file: &AttachedFile,
        offset: Duration,
    ) -> Result<String, ThumbnailCaptureError>;
}

pub struct MissingThumbnailCapturer;

#[async_trait]
impl ThumbnailCapturer for MissingThumbnailCapturer {
    async fn capture(
        &self,
        file: &AttachedFile,
        _offset: Duration,
    ) -> Result<String, ThumbnailCaptureError> {
        Err(ThumbnailCaptureError::Decode(format!(
            "no video backend available for {}",
            file.name
        )))
    }
}

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("nothing to send: draft is empty and no file is attached")]
    NothingToSend,
    #[error("unsupported attachment content type '{0}'")]
    UnsupportedAttachment(String),
}

#[derive(Debug, Clone)]
pub enum ComposerEvent {
    AttachmentSelected { filename: String },
    ThumbnailReady { filename: String },
    ThumbnailDiscarded { filename: String },
    AttachmentCleared,
    Reset,
}

/// Snapshot of the pending attachment for the preview region.
#[derive(Debug, Clone)]
pub struct AttachmentPreview {
    pub kind: AttachmentKind,
    pub filename: String,
    pub size: u64,
    pub preview_url: String,
    pub thumbnail_url: Option<String>,
}

struct PendingAttachment {
    seq: u64,
    file: AttachedFile,
    preview_url: String,
    thumbnail: Option<String>,
}

struct ComposerState {
    draft: String,
    attachment: Option<PendingAttachment>,
    next_seq: u64,
}

/// Owns the draft text and the pending-attachment lifecycle:
/// none -> selected -> (video only) thumbnail-pending -> thumbnail-ready.
/// Submit finalizes a `Message` and resets to empty.
pub struct Composer {
    current_user: ParticipantId,
    capturer: Arc<dyn ThumbnailCapturer>,
    urls: Arc<ObjectUrlRegistry>,
    inner: Mutex<ComposerState>,
    events: broadcast::Sender<ComposerEvent>,
}

impl Composer {
    pub fn new(current_user: ParticipantId) -> Arc<Self> {
        Self::new_with_dependencies(
            current_user,
            Arc::new(MissingThumbnailCapturer),
            Arc::new(ObjectUrlRegistry::new()),
        )
    }

    pub fn new_with_dependencies(
        current_user: ParticipantId,
        capturer: Arc<dyn ThumbnailCapturer>,
        urls: Arc<ObjectUrlRegistry>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(COMPOSER_EVENT_CAPACITY);
        Arc::new(Self {
            current_user,
            capturer,
            urls,
            inner: Mutex::new(ComposerState {
                draft: String::new(),
                attachment: None,
                next_seq: 0,
            }),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ComposerEvent> {
        self.events.subscribe()
    }

    pub async fn set_draft(&self, text: impl Into<String>) {
        self.inner.lock().await.draft = text.into();
    }

    pub async fn draft(&self) -> String {
        self.inner.lock().await.draft.clone()
    }

    /// Selects a file for the next message, replacing any previous
    /// attachment and releasing its preview handle. Content types outside
    /// the image/video/pdf set are rejected so a finalized message can
    /// never carry media under the text kind.
    pub async fn attach(self: &Arc<Self>, file: AttachedFile) -> Result<(), ComposeError> {
        let kind = classify(&file.content_type);
        if kind == MessageKind::Text {
            return Err(ComposeError::UnsupportedAttachment(file.content_type));
        }

        let filename = file.name.clone();
        {
            let mut inner = self.inner.lock().await;
            if let Some(previous) = inner.attachment.take() {
                self.urls.revoke(&previous.preview_url);
            }

            let seq = inner.next_seq;
            inner.next_seq += 1;

            inner.attachment = Some(PendingAttachment {
                seq,
                preview_url: self.urls.create(&file.name),
                thumbnail: None,
                file: file.clone(),
            });

            if kind == MessageKind::Video {
                let composer = Arc::clone(self);
                tokio::spawn(async move {
                    composer.run_capture(seq, file).await;
                });
            }
        }

        let _ = self.events.send(ComposerEvent::AttachmentSelected { filename });
        Ok(())
    }

    /// Applies a finished capture only if the attachment it was started for
    /// is still the live one; results for a cleared or replaced attachment
    /// are discarded.
    async fn run_capture(&self, seq: u64, file: AttachedFile) {
        match self.capturer.capture(&file, THUMBNAIL_SEEK_OFFSET).await {
            Ok(still) => {
                let applied = {
                    let mut inner = self.inner.lock().await;
                    match inner.attachment.as_mut() {
                        Some(pending) if pending.seq == seq => {
                            pending.thumbnail = Some(still);
                            true
                        }
                        _ => false,
                    }
                };
                if applied {
                    let _ = self
                        .events
                        .send(ComposerEvent::ThumbnailReady { filename: file.name });
                } else {
                    debug!(filename = %file.name, "discarding thumbnail for stale attachment");
                    let _ = self
                        .events
                        .send(ComposerEvent::ThumbnailDiscarded { filename: file.name });
                }
            }
            Err(err) => {
                warn!(filename = %file.name, error = %err, "thumbnail capture failed, continuing without one");
            }
        }
    }

    pub async fn clear_attachment(&self) {
        let released = self.inner.lock().await.attachment.take();
        if let Some(attachment) = released {
            self.urls.revoke(&attachment.preview_url);
            let _ = self.events.send(ComposerEvent::AttachmentCleared);
        }
    }

    pub async fn attachment_preview(&self) -> Option<AttachmentPreview> {
        let inner = self.inner.lock().await;
        inner.attachment.as_ref().map(|pending| AttachmentPreview {
            kind: preview_kind(&pending.file.content_type),
            filename: pending.file.name.clone(),
            size: pending.file.size,
            preview_url: pending.preview_url.clone(),
            thumbnail_url: pending.thumbnail.clone(),
        })
    }

    pub async fn can_submit(&self) -> bool {
        let inner = self.inner.lock().await;
        !inner.draft.trim().is_empty() || inner.attachment.is_some()
    }

    /// Finalizes the draft and attachment into a message and resets the
    /// composer, releasing the preview handle. The message's media url is a
    /// fresh handle owned by the message itself.
    pub async fn submit(&self) -> Result<Message, ComposeError> {
        let (text, attachment) = {
            let mut inner = self.inner.lock().await;
            let text = inner.draft.trim().to_string();
            if text.is_empty() && inner.attachment.is_none() {
                return Err(ComposeError::NothingToSend);
            }
            inner.draft.clear();
            (text, inner.attachment.take())
        };

        let now = Utc::now();
        let (kind, media) = match attachment {
            Some(pending) => {
                let media = self.build_media(&pending);
                self.urls.revoke(&pending.preview_url);
                (classify(&pending.file.content_type), Some(media))
            }
            None => (MessageKind::Text, None),
        };

        let message = Message {
            id: MessageId(now.timestamp_millis() as u64),
            kind,
            text,
            sender: self.current_user.clone(),
            timestamp: now,
            media,
        };

        let _ = self.events.send(ComposerEvent::Reset);
        Ok(message)
    }

    fn build_media(&self, pending: &PendingAttachment) -> MediaContent {
        let url = self.urls.create(&pending.file.name);
        let mut media = MediaContent {
            url: url.clone(),
            filename: pending.file.name.clone(),
            size: pending.file.size,
            alt: Some(pending.file.name.clone()),
            duration: None,
            thumbnail: None,
            pages: None,
        };

        if pending.file.content_type.starts_with("video/") {
            // Fallback when capture never completed: point at the video itself.
            media.thumbnail = Some(pending.thumbnail.clone().unwrap_or_else(|| url.clone()));
            // Duration is never measured; the literal default is kept.
            media.duration = Some(0);
        }

        if pending.file.content_type == PDF_MIME {
            // Page count is never read from the document.
            media.pages = Some(1);
        }

        media
    }
}

#[cfg(test)]
#[path = "tests/composer_tests.rs"]
mod tests;
