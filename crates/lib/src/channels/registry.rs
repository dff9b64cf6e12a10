//! Channel registry: register and look up push-capable channels by id.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Handle to a running channel connector (stop, send message).
#[async_trait]
pub trait ChannelHandle: Send + Sync {
    /// Channel id (e.g. "telegram").
    fn id(&self) -> &str;

    /// Stop the channel connector.
    fn stop(&self);

    /// Push a text message to a conversation (e.g. a Telegram chat id).
    async fn send_message(&self, _conversation_id: &str, _text: &str) -> Result<(), String> {
        Err("send not implemented".to_string())
    }
}

/// Registry of channel ids to handles. The reply router looks up the
/// destination here when the inbound channel is not the direct-return one.
#[derive(Default)]
pub struct ChannelRegistry {
    inner: RwLock<HashMap<String, Arc<dyn ChannelHandle>>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle under an id; a previous handle under the same id is stopped.
    pub fn register(&self, id: String, handle: Arc<dyn ChannelHandle>) {
        let mut g = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = g.insert(id, handle) {
            old.stop();
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn ChannelHandle>> {
        let g = self.inner.read().unwrap_or_else(|e| e.into_inner());
        g.get(id).cloned()
    }
}
