//! Telegram channel: long-poll getUpdates, sendMessage, and photo download
//! via getFile + the file endpoint.

use crate::channels::inbound::{InboundMessage, PhotoRef};
use crate::channels::registry::ChannelHandle;
use crate::vision::PhotoSource;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const LONG_POLL_TIMEOUT: u64 = 30;

#[derive(Debug, Deserialize)]
struct GetUpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<TelegramUpdate>,
}

/// Telegram update payload (getUpdates result item).
#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    pub chat: TelegramChat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub photo: Option<Vec<TelegramPhotoSize>>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

/// One size variant of an attached photo. Telegram orders these smallest
/// first; the connector picks the last (largest) one.
#[derive(Debug, Deserialize)]
pub struct TelegramPhotoSize {
    pub file_id: String,
}

#[derive(Debug, Deserialize)]
struct GetFileResponse {
    ok: bool,
    #[serde(default)]
    result: Option<TelegramFile>,
}

#[derive(Debug, Deserialize)]
struct TelegramFile {
    #[serde(default)]
    file_path: Option<String>,
}

/// Telegram channel connector: long-polls for updates, sends replies via
/// sendMessage, and resolves photo file ids to bytes for the vision path.
pub struct TelegramChannel {
    id: String,
    token: Option<String>,
    running: AtomicBool,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(token: Option<String>) -> Self {
        Self {
            id: "telegram".to_string(),
            token,
            running: AtomicBool::new(false),
            client: reqwest::Client::new(),
        }
    }

    fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn token(&self) -> Result<&str, String> {
        self.token
            .as_deref()
            .ok_or_else(|| "telegram bot token not configured".to_string())
    }

    /// Start the getUpdates long-poll loop and forward messages to the pipeline.
    /// Returns a handle to await on shutdown.
    pub fn start_inbound(
        self: Arc<Self>,
        inbound_tx: mpsc::Sender<InboundMessage>,
    ) -> JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);
        log::info!("telegram channel: starting getUpdates long-poll loop");
        tokio::spawn(async move {
            run_get_updates_loop(self, inbound_tx).await;
        })
    }

    /// Call Telegram getUpdates (long poll). Returns (updates, next_offset).
    async fn get_updates(
        &self,
        offset: Option<i64>,
    ) -> Result<(Vec<TelegramUpdate>, Option<i64>), String> {
        let token = self.token()?;
        let url = format!(
            "{}/bot{}/getUpdates?timeout={}",
            TELEGRAM_API_BASE, token, LONG_POLL_TIMEOUT
        );
        let url = if let Some(off) = offset {
            format!("{}&offset={}", url, off)
        } else {
            url
        };
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("getUpdates failed: {} {}", status, body));
        }
        let data: GetUpdatesResponse = res.json().await.map_err(|e| e.to_string())?;
        if !data.ok {
            return Err("getUpdates returned ok: false".to_string());
        }
        let next_offset = data
            .result
            .iter()
            .map(|u| u.update_id)
            .max()
            .map(|id| id + 1);
        Ok((data.result, next_offset))
    }

    /// Send a text message to a chat via sendMessage API.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), String> {
        let token = self.token()?;
        let url = format!("{}/bot{}/sendMessage", TELEGRAM_API_BASE, token);
        let body = serde_json::json!({ "chat_id": chat_id, "text": text });
        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("sendMessage failed: {} {}", status, body));
        }
        Ok(())
    }

    /// Resolve a photo file id to its server-side file path via getFile.
    async fn get_file_path(&self, file_id: &str) -> Result<String, String> {
        let token = self.token()?;
        let url = format!(
            "{}/bot{}/getFile?file_id={}",
            TELEGRAM_API_BASE, token, file_id
        );
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("getFile failed: {} {}", status, body));
        }
        let data: GetFileResponse = res.json().await.map_err(|e| e.to_string())?;
        if !data.ok {
            return Err("getFile returned ok: false".to_string());
        }
        data.result
            .and_then(|f| f.file_path)
            .ok_or_else(|| "getFile response had no file_path".to_string())
    }

    /// Download a file's bytes from the Telegram file endpoint.
    async fn download_file(&self, file_path: &str) -> Result<Vec<u8>, String> {
        let token = self.token()?;
        let url = format!("{}/file/bot{}/{}", TELEGRAM_API_BASE, token, file_path);
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            let status = res.status();
            return Err(format!("file download failed: {}", status));
        }
        let bytes = res.bytes().await.map_err(|e| e.to_string())?;
        Ok(bytes.to_vec())
    }
}

async fn run_get_updates_loop(
    channel: Arc<TelegramChannel>,
    inbound_tx: mpsc::Sender<InboundMessage>,
) {
    let mut offset: Option<i64> = None;
    while channel.running() {
        match channel.get_updates(offset).await {
            Ok((updates, next)) => {
                offset = next;
                for u in updates {
                    let Some(msg) = u.message else { continue };
                    let Some(inbound) = inbound_from_message(&channel.id, msg) else {
                        continue;
                    };
                    if inbound_tx.send(inbound).await.is_err() {
                        log::debug!("telegram: inbound channel closed, stopping loop");
                        return;
                    }
                }
            }
            Err(e) => {
                log::debug!("telegram getUpdates error: {}", e);
                tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;
            }
        }
    }
    log::info!("telegram channel: getUpdates loop stopped");
}

/// Build an inbound message from a Telegram message: photo messages carry the
/// largest size's file id plus the caption; plain messages carry text only.
/// Messages with neither are dropped.
fn inbound_from_message(channel_id: &str, msg: TelegramMessage) -> Option<InboundMessage> {
    let conversation_id = msg.chat.id.to_string();
    let photo = msg
        .photo
        .as_ref()
        .and_then(|sizes| sizes.last())
        .map(|p| PhotoRef {
            file_id: p.file_id.clone(),
        });
    let text = if photo.is_some() {
        msg.caption
    } else {
        msg.text
    };
    if photo.is_none() && text.as_deref().map(str::trim).unwrap_or("").is_empty() {
        return None;
    }
    Some(InboundMessage {
        channel_id: channel_id.to_string(),
        conversation_id,
        text,
        photo,
    })
}

#[async_trait]
impl ChannelHandle for TelegramChannel {
    fn id(&self) -> &str {
        &self.id
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    async fn send_message(&self, conversation_id: &str, text: &str) -> Result<(), String> {
        TelegramChannel::send_message(self, conversation_id, text).await
    }
}

#[async_trait]
impl PhotoSource for TelegramChannel {
    async fn fetch(&self, file_id: &str) -> Result<Vec<u8>, String> {
        let path = self.get_file_path(file_id).await?;
        self.download_file(&path).await
    }
}
