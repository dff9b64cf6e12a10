//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.keja/config.json`) and environment.
//! Tokens and API keys can always be supplied via environment variables instead
//! of the file; env wins when both are set.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Channel settings (e.g. Telegram).
    #[serde(default)]
    pub channels: ChannelsConfig,

    /// Language-model service settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// CRM backend settings.
    #[serde(default)]
    pub crm: CrmConfig,
}

/// Per-channel config (e.g. Telegram bot token).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsConfig {
    #[serde(default)]
    pub telegram: TelegramChannelConfig,
}

/// Telegram channel config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramChannelConfig {
    /// Bot token from BotFather. Overridden by TELEGRAM_BOT_TOKEN env when set.
    pub bot_token: Option<String>,
}

/// Language-model service config (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    /// API base URL (default "https://api.openai.com/v1").
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// API key. Overridden by OPENAI_API_KEY env when set.
    pub api_key: Option<String>,

    /// Model for classification, extraction and narration.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Vision-capable model for photo extraction.
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
}

/// CRM backend config (Zoho-style REST API).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrmConfig {
    /// API base URL (default "https://www.zohoapis.com/crm/v2").
    #[serde(default = "default_crm_base_url")]
    pub base_url: String,

    /// OAuth access token. Overridden by ZOHO_ACCESS_TOKEN env when set.
    pub access_token: Option<String>,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_vision_model() -> String {
    "gpt-4o".to_string()
}

fn default_crm_base_url() -> String {
    "https://www.zohoapis.com/crm/v2".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key: None,
            chat_model: default_chat_model(),
            vision_model: default_vision_model(),
        }
    }
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            base_url: default_crm_base_url(),
            access_token: None,
        }
    }
}

fn env_or(var: &str, from_config: Option<&String>) -> Option<String> {
    std::env::var(var)
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            from_config
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Resolve the Telegram bot token: env TELEGRAM_BOT_TOKEN overrides config.
pub fn resolve_telegram_token(config: &Config) -> Option<String> {
    env_or("TELEGRAM_BOT_TOKEN", config.channels.telegram.bot_token.as_ref())
}

/// Resolve the LLM API key: env OPENAI_API_KEY overrides config.
pub fn resolve_llm_api_key(config: &Config) -> Option<String> {
    env_or("OPENAI_API_KEY", config.llm.api_key.as_ref())
}

/// Resolve the CRM access token: env ZOHO_ACCESS_TOKEN overrides config.
pub fn resolve_crm_token(config: &Config) -> Option<String> {
    env_or("ZOHO_ACCESS_TOKEN", config.crm.access_token.as_ref())
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("KEJA_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".keja").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the default path (or KEJA_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_llm_models_and_base_url() {
        let c = LlmConfig::default();
        assert_eq!(c.base_url, "https://api.openai.com/v1");
        assert_eq!(c.chat_model, "gpt-4o-mini");
        assert_eq!(c.vision_model, "gpt-4o");
        assert!(c.api_key.is_none());
    }

    #[test]
    fn default_crm_base_url_points_at_v2() {
        let c = CrmConfig::default();
        assert_eq!(c.base_url, "https://www.zohoapis.com/crm/v2");
    }

    #[test]
    fn empty_config_file_parses_to_defaults() {
        let c: Config = serde_json::from_str("{}").expect("parse");
        assert_eq!(c.llm.chat_model, "gpt-4o-mini");
        assert!(c.channels.telegram.bot_token.is_none());
    }

    #[test]
    fn camel_case_keys_are_accepted() {
        let c: Config = serde_json::from_str(
            r#"{"crm": {"baseUrl": "http://localhost:9090/crm/v2", "accessToken": "t"}}"#,
        )
        .expect("parse");
        assert_eq!(c.crm.base_url, "http://localhost:9090/crm/v2");
        assert_eq!(c.crm.access_token.as_deref(), Some("t"));
    }
}
