//! Inbound message from a channel: one message drives one pipeline run.

/// Reference to a photo attached to a message (channel file id, resolved to
/// bytes only when the photo path actually runs).
#[derive(Debug, Clone)]
pub struct PhotoRef {
    pub file_id: String,
}

/// A message from a channel. Carries either text or a photo; when a photo is
/// present, `text` holds its caption (auxiliary context for extraction).
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub channel_id: String,
    pub conversation_id: String,
    pub text: Option<String>,
    pub photo: Option<PhotoRef>,
}
