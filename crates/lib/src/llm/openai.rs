//! OpenAI-style chat-completions client (https://api.openai.com/v1 by default).

use serde::{Deserialize, Serialize};

/// Client for an OpenAI-compatible chat-completions API.
#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("llm request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("llm api error: {0}")]
    Api(String),
}

impl OpenAiClient {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn api_key(&self) -> Result<&str, LlmError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| LlmError::Api("llm api key not configured".to_string()))
    }

    /// POST /chat/completions — non-streaming text completion. Returns the
    /// assistant message content (empty string when the reply carried none).
    pub async fn chat(
        &self,
        model: &str,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let messages = vec![
            ChatRequestMessage {
                role: "system",
                content: MessageContent::Text(system.to_string()),
            },
            ChatRequestMessage {
                role: "user",
                content: MessageContent::Text(user.to_string()),
            },
        ];
        self.complete(model, messages, max_tokens, temperature).await
    }

    /// POST /chat/completions with an inlined base64 image payload.
    pub async fn chat_vision(
        &self,
        model: &str,
        system: &str,
        user_text: &str,
        mime_type: &str,
        image_base64: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let parts = vec![
            ContentPart::Text {
                text: user_text.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: format!("data:{};base64,{}", mime_type, image_base64),
                },
            },
        ];
        let messages = vec![
            ChatRequestMessage {
                role: "system",
                content: MessageContent::Text(system.to_string()),
            },
            ChatRequestMessage {
                role: "user",
                content: MessageContent::Parts(parts),
            },
        ];
        self.complete(model, messages, max_tokens, temperature).await
    }

    async fn complete(
        &self,
        model: &str,
        messages: Vec<ChatRequestMessage>,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let key = self.api_key()?;
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: model.to_string(),
            messages,
            max_tokens,
            temperature,
        };
        let res = self
            .client
            .post(&url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("{} {}", status, body)));
        }
        let data: ChatResponse = res.json().await?;
        Ok(data
            .choices
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatRequestMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequestMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<Choice>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vision_parts_serialize_with_tagged_type() {
        let part = ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: "data:image/jpeg;base64,QUJD".to_string(),
            },
        };
        let v = serde_json::to_value(&part).expect("serialize");
        assert_eq!(v["type"], "image_url");
        assert_eq!(v["image_url"]["url"], "data:image/jpeg;base64,QUJD");
    }

    #[test]
    fn reply_content_is_extracted_from_first_choice() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#;
        let data: ChatResponse = serde_json::from_str(raw).expect("parse");
        let content = data
            .choices
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default();
        assert_eq!(content, "hello");
    }
}
