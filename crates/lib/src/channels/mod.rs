//! Communication channels (interactive chat and Telegram).
//!
//! Channel trait and registry so the CLI can start/stop connectors and
//! deliver replies. Inbound messages are handed to the pipeline one at a time.

mod inbound;
mod registry;
mod telegram;

pub use inbound::{InboundMessage, PhotoRef};
pub use registry::{ChannelHandle, ChannelRegistry};
pub use telegram::{TelegramChannel, TelegramUpdate};

/// Channel id of the interactive chat surface (replies are returned directly).
pub const CHAT_CHANNEL_ID: &str = "chat";
