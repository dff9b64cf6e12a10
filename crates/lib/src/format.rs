//! Response sanitizer and channel router.
//!
//! Replies may contain model-produced markdown; the push channel renders
//! plain text only, so markers are stripped rather than escaped.

use crate::channels::{ChannelRegistry, InboundMessage, CHAT_CHANNEL_ID};

/// Strip markup the minimal-markup channel cannot render: bold/italic
/// markers and backticks are removed, underscores become spaces, square
/// brackets become parentheses. Applying this twice changes nothing.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '*' | '`' => None,
            '_' => Some(' '),
            '[' => Some('('),
            ']' => Some(')'),
            other => Some(other),
        })
        .collect()
}

/// Deliver a reply to exactly one destination, selected solely by the inbound
/// message's channel: the chat channel gets the text returned directly, any
/// other channel gets a push send keyed by its conversation id.
pub async fn route_reply(
    registry: &ChannelRegistry,
    inbound: &InboundMessage,
    text: String,
) -> Result<Option<String>, String> {
    if inbound.channel_id == CHAT_CHANNEL_ID {
        return Ok(Some(text));
    }
    let handle = registry
        .get(&inbound.channel_id)
        .ok_or_else(|| format!("no channel registered for id {}", inbound.channel_id))?;
    handle.send_message(&inbound.conversation_id, &text).await?;
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::ChannelHandle;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[test]
    fn markup_is_stripped_and_brackets_converted() {
        assert_eq!(
            sanitize("**Total**: `KES 5,000` for [Unit_701]"),
            "Total: KES 5,000 for (Unit 701)"
        );
    }

    #[test]
    fn code_fences_are_removed() {
        assert_eq!(sanitize("```json\n{}\n```"), "json\n{}\n");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let raw = "**Units_list**: [201; 204] `done` *ok*";
        let once = sanitize(raw);
        assert_eq!(sanitize(&once), once);
    }

    struct RecordingChannel {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl ChannelHandle for RecordingChannel {
        fn id(&self) -> &str {
            "telegram"
        }

        fn stop(&self) {}

        async fn send_message(&self, conversation_id: &str, text: &str) -> Result<(), String> {
            self.sent
                .lock()
                .unwrap()
                .push((conversation_id.to_string(), text.to_string()));
            Ok(())
        }
    }

    fn inbound(channel_id: &str) -> InboundMessage {
        InboundMessage {
            channel_id: channel_id.to_string(),
            conversation_id: "42".to_string(),
            text: Some("hi".to_string()),
            photo: None,
        }
    }

    #[tokio::test]
    async fn chat_channel_returns_the_text_directly() {
        let registry = ChannelRegistry::new();
        let out = route_reply(&registry, &inbound(CHAT_CHANNEL_ID), "hello".to_string())
            .await
            .expect("route");
        assert_eq!(out.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn push_channel_sends_keyed_by_conversation_id() {
        let registry = ChannelRegistry::new();
        let channel = Arc::new(RecordingChannel {
            sent: Mutex::new(Vec::new()),
        });
        registry.register("telegram".to_string(), channel.clone());
        let out = route_reply(&registry, &inbound("telegram"), "hello".to_string())
            .await
            .expect("route");
        assert!(out.is_none());
        assert_eq!(
            channel.sent.lock().unwrap().as_slice(),
            &[("42".to_string(), "hello".to_string())]
        );
    }

    #[tokio::test]
    async fn unregistered_channel_is_an_error() {
        let registry = ChannelRegistry::new();
        assert!(route_reply(&registry, &inbound("telegram"), "hello".to_string())
            .await
            .is_err());
    }
}
