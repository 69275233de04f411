use shared::domain::MessageKind;

pub const PDF_MIME: &str = "application/pdf";

/// Maps a file's declared content type to a message kind. Anything outside
/// the closed set falls back to `Text`; the composer rejects such
/// attachments before a message can be built from them.
pub fn classify(content_type: &str) -> MessageKind {
    if content_type.starts_with("image/") {
        MessageKind::Image
    } else if content_type.starts_with("video/") {
        MessageKind::Video
    } else if content_type == PDF_MIME {
        MessageKind::Pdf
    } else {
        MessageKind::Text
    }
}

/// Dispatch kind for the attachment preview, where an unrecognized content
/// type shows as a generic file rather than a message kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Video,
    Pdf,
    File,
}

pub fn preview_kind(content_type: &str) -> AttachmentKind {
    match classify(content_type) {
        MessageKind::Image => AttachmentKind::Image,
        MessageKind::Video => AttachmentKind::Video,
        MessageKind::Pdf => AttachmentKind::Pdf,
        MessageKind::Text => AttachmentKind::File,
    }
}
