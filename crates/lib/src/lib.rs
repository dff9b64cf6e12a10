//! Keja core library — config, channels, CRM and LLM clients, and the
//! intent-resolution pipeline used by the CLI.

pub mod channels;
pub mod classify;
pub mod config;
pub mod crm;
pub mod dispatch;
pub mod format;
pub mod intent;
pub mod llm;
pub mod narrate;
pub mod pipeline;
pub mod prompts;
pub mod vision;
