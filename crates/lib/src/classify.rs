//! LLM-backed classification and text-path field extraction.
//!
//! The model reply is untrusted input: the first balanced JSON object is
//! located in the raw text and parsed into a strict result type. Any failure
//! (transport, no JSON, wrong shape, unlisted module) degrades to an
//! unresolved classification; this stage never errors.

use crate::crm::{Category, CategoryId, RecordMap};
use crate::intent::{ActionHint, Intent};
use crate::llm::OpenAiClient;
use crate::prompts;
use serde::Deserialize;

const CLASSIFY_MAX_TOKENS: u32 = 500;
const CLASSIFY_TEMPERATURE: f32 = 0.0;

/// Result of classifying one message. Invariants: `Read` ignores
/// `data`/`missing`; `Create` with a resolved category carries the extracted
/// field map; an unresolved category leaves `category` empty.
#[derive(Debug, Clone)]
pub struct Classification {
    pub intent: Intent,
    pub category: Option<CategoryId>,
    pub data: RecordMap,
    pub missing: Vec<String>,
    pub raw_text: String,
}

impl Classification {
    fn unresolved(raw_text: &str) -> Self {
        Self {
            intent: Intent::Unknown,
            category: None,
            data: RecordMap::new(),
            missing: Vec::new(),
            raw_text: raw_text.to_string(),
        }
    }
}

/// Wire shape of the classifier reply. Every field defaults so shape drift
/// degrades instead of erroring.
#[derive(Debug, Deserialize)]
struct ModelReply {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    module: Option<String>,
    #[serde(default)]
    data: Option<RecordMap>,
    #[serde(default)]
    missing: Option<Vec<String>>,
}

/// Locate the first balanced JSON object in free text. Brace counting is
/// string- and escape-aware so braces inside extracted values don't truncate
/// the object.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse a raw classifier reply into a classification for `raw_text`.
pub fn parse_reply(reply: &str, raw_text: &str) -> Classification {
    let Some(json) = extract_json_object(reply) else {
        log::debug!("classifier reply had no JSON object");
        return Classification::unresolved(raw_text);
    };
    let parsed: ModelReply = match serde_json::from_str(json) {
        Ok(p) => p,
        Err(e) => {
            log::debug!("classifier reply failed to parse: {}", e);
            return Classification::unresolved(raw_text);
        }
    };
    let category = parsed
        .module
        .as_deref()
        .and_then(CategoryId::from_api_name);
    let is_create = parsed
        .action
        .as_deref()
        .map(|a| a.eq_ignore_ascii_case("CREATE"))
        .unwrap_or(false);
    if is_create {
        Classification {
            intent: Intent::Create,
            category,
            data: parsed.data.unwrap_or_default(),
            missing: parsed.missing.unwrap_or_default(),
            raw_text: raw_text.to_string(),
        }
    } else {
        match category {
            Some(_) => Classification {
                intent: Intent::Read,
                category,
                data: RecordMap::new(),
                missing: Vec::new(),
                raw_text: raw_text.to_string(),
            },
            None => Classification::unresolved(raw_text),
        }
    }
}

/// Ask the model to classify a deferred message (and extract fields for
/// creates). Collaborator failures degrade to the unresolved path.
pub async fn classify_with_model(
    llm: &OpenAiClient,
    model: &str,
    catalog: &[Category],
    hint: Option<ActionHint>,
    text: &str,
) -> Classification {
    let system = prompts::classifier_system_prompt(catalog, hint);
    match llm
        .chat(model, &system, text, CLASSIFY_MAX_TOKENS, CLASSIFY_TEMPERATURE)
        .await
    {
        Ok(reply) => parse_reply(&reply, text),
        Err(e) => {
            log::warn!("classification call failed: {}", e);
            Classification::unresolved(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_first_balanced_object_in_prose() {
        let text = "Sure! Here is the result:\n{\"action\": \"READ\", \"module\": \"Bookings\"}\nHope that helps.";
        assert_eq!(
            extract_json_object(text),
            Some(r#"{"action": "READ", "module": "Bookings"}"#)
        );
    }

    #[test]
    fn balanced_scan_handles_nested_objects_and_braces_in_strings() {
        let text = r#"{"a": {"b": "}"}, "c": 1} {"second": true}"#;
        assert_eq!(extract_json_object(text), Some(r#"{"a": {"b": "}"}, "c": 1}"#));
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("{unterminated"), None);
    }

    #[test]
    fn read_reply_resolves_to_read_intent() {
        let c = parse_reply(
            r#"{"action": "READ", "module": "Bookings"}"#,
            "show bookings",
        );
        assert_eq!(c.intent, Intent::Read);
        assert_eq!(c.category, Some(CategoryId::Bookings));
        assert!(c.data.is_empty());
    }

    #[test]
    fn create_reply_carries_extracted_data_and_reported_gaps() {
        let c = parse_reply(
            r#"{"action": "CREATE", "module": "Bookings", "data": {"First_Name": "Ahmed", "Unit": "701", "Amount": "50000"}, "missing": ["Checked_in", "Checked_out"]}"#,
            "create booking for Ahmed in unit 701 for 50000",
        );
        assert_eq!(c.intent, Intent::Create);
        assert_eq!(c.category, Some(CategoryId::Bookings));
        assert_eq!(c.data.len(), 3);
        assert_eq!(c.missing, vec!["Checked_in", "Checked_out"]);
    }

    #[test]
    fn unknown_module_sentinel_degrades_to_unresolved() {
        let c = parse_reply(r#"{"action": "READ", "module": "UNKNOWN"}"#, "hmm");
        assert_eq!(c.intent, Intent::Unknown);
        assert!(c.category.is_none());
    }

    #[test]
    fn create_with_unlisted_module_keeps_create_intent_but_no_category() {
        let c = parse_reply(r#"{"action": "CREATE", "module": "Invoices"}"#, "add invoice");
        assert_eq!(c.intent, Intent::Create);
        assert!(c.category.is_none());
    }

    #[test]
    fn garbage_reply_degrades_to_unresolved() {
        let c = parse_reply("I am not sure what you mean.", "gibberish");
        assert_eq!(c.intent, Intent::Unknown);
        assert!(c.category.is_none());
        assert_eq!(c.raw_text, "gibberish");
    }
}
