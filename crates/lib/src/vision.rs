//! Photo-based extraction: resolve the photo to bytes, ask the vision model,
//! parse the reply into a create action.
//!
//! Unlike the text path, vision-extracted data dispatches without an
//! independent missing-field recomputation; the backend's own validation is
//! the safety net and its errors are surfaced with photo-specific guidance.

use crate::classify::extract_json_object;
use crate::crm::{CategoryId, RecordMap};
use crate::llm::OpenAiClient;
use crate::prompts;
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;

const VISION_MAX_TOKENS: u32 = 1500;
const VISION_TEMPERATURE: f32 = 0.1;
const PHOTO_MIME_TYPE: &str = "image/jpeg";

/// Resolves a channel photo reference to raw image bytes.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    async fn fetch(&self, file_id: &str) -> Result<Vec<u8>, String>;
}

/// Parsed outcome of the vision call.
#[derive(Debug)]
pub enum VisionOutcome {
    /// The model identified a category and extracted a creation payload.
    Create {
        category: CategoryId,
        data: RecordMap,
        summary: Option<String>,
    },
    /// The image was not interpretable (or named no supported category).
    Unrecognized,
    /// The model reported a concrete problem with the image.
    Failed { error: String },
}

#[derive(Debug, Deserialize)]
struct VisionReply {
    #[serde(default)]
    module: Option<String>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    data: Option<RecordMap>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Parse a raw vision reply. Mirrors the text-path parsing rules; anything
/// that is not a well-formed create over a photo-creatable category collapses
/// into the unrecognized/failed branches.
pub fn parse_vision_reply(reply: &str) -> VisionOutcome {
    let Some(json) = extract_json_object(reply) else {
        return VisionOutcome::Unrecognized;
    };
    let parsed: VisionReply = match serde_json::from_str(json) {
        Ok(p) => p,
        Err(e) => {
            log::debug!("vision reply failed to parse: {}", e);
            return VisionOutcome::Unrecognized;
        }
    };
    let is_create = parsed
        .action
        .as_deref()
        .map(|a| a.eq_ignore_ascii_case("CREATE"))
        .unwrap_or(false);
    let category = parsed
        .module
        .as_deref()
        .and_then(CategoryId::from_api_name);
    match (is_create, category) {
        (true, Some(category)) => VisionOutcome::Create {
            category,
            data: parsed.data.unwrap_or_default(),
            summary: parsed.summary,
        },
        _ => match parsed.error {
            Some(error) if !error.trim().is_empty() && parsed.module.as_deref() != Some("UNKNOWN") => {
                VisionOutcome::Failed { error }
            }
            _ => VisionOutcome::Unrecognized,
        },
    }
}

/// Run the photo path: download the image, send it to the vision model with
/// the caption as auxiliary context, parse the reply.
pub async fn extract_from_photo(
    llm: &OpenAiClient,
    model: &str,
    source: &dyn PhotoSource,
    file_id: &str,
    caption: &str,
) -> VisionOutcome {
    let bytes = match source.fetch(file_id).await {
        Ok(b) => b,
        Err(e) => {
            log::warn!("photo download failed: {}", e);
            return VisionOutcome::Failed {
                error: "could not download the photo".to_string(),
            };
        }
    };
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    let system = prompts::vision_system_prompt();
    let user_text = prompts::vision_user_text(caption);
    match llm
        .chat_vision(
            model,
            &system,
            &user_text,
            PHOTO_MIME_TYPE,
            &encoded,
            VISION_MAX_TOKENS,
            VISION_TEMPERATURE,
        )
        .await
    {
        Ok(reply) => parse_vision_reply(&reply),
        Err(e) => {
            log::warn!("vision call failed: {}", e);
            VisionOutcome::Unrecognized
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_reply_over_photo_creatable_category_is_accepted() {
        let out = parse_vision_reply(
            r#"{"module": "Guests_Database", "action": "CREATE", "data": {"First_Name": "Amina", "Last_Name": "Hassan"}, "summary": "Guest passport details"}"#,
        );
        match out {
            VisionOutcome::Create {
                category,
                data,
                summary,
            } => {
                assert_eq!(category, CategoryId::GuestsDatabase);
                assert_eq!(data.len(), 2);
                assert_eq!(summary.as_deref(), Some("Guest passport details"));
            }
            other => panic!("expected create, got {:?}", other),
        }
    }

    #[test]
    fn unknown_module_error_reply_is_unrecognized() {
        let out = parse_vision_reply(
            r#"{"module": "UNKNOWN", "action": "ERROR", "error": "The image is too blurry"}"#,
        );
        assert!(matches!(out, VisionOutcome::Unrecognized));
    }

    #[test]
    fn concrete_error_on_a_known_module_is_surfaced() {
        let out = parse_vision_reply(
            r#"{"module": "Bookings", "action": "ERROR", "error": "Dates are cut off"}"#,
        );
        match out {
            VisionOutcome::Failed { error } => assert_eq!(error, "Dates are cut off"),
            other => panic!("expected failed, got {:?}", other),
        }
    }

    #[test]
    fn unparseable_reply_is_unrecognized() {
        assert!(matches!(
            parse_vision_reply("cannot help with that"),
            VisionOutcome::Unrecognized
        ));
    }
}
