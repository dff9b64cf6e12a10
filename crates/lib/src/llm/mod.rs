//! LLM abstraction and OpenAI-compatible client.
//!
//! Supports plain chat completion and a vision variant that inlines an image
//! payload. Classification callers pin temperature 0; narration uses a low
//! non-zero temperature.

mod openai;

pub use openai::{LlmError, OpenAiClient};
