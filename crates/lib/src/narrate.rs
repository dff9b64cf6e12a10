//! Read explanation: turn queried rows into a natural-language answer.

use crate::crm::{CategoryId, RecordMap};
use crate::llm::{LlmError, OpenAiClient};
use crate::prompts;

const NARRATE_MAX_TOKENS: u32 = 2000;
const NARRATE_TEMPERATURE: f32 = 0.1;

/// Ask the model to answer `question` over the forwarded rows. `total` is the
/// backend match count; when it exceeds the forwarded rows the prompt marks
/// the data as a sample so the answer cannot claim completeness.
pub async fn explain(
    llm: &OpenAiClient,
    model: &str,
    question: &str,
    category: CategoryId,
    total: usize,
    rows: &[RecordMap],
) -> Result<String, LlmError> {
    let sampled = total > rows.len();
    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    let system = prompts::narrative_system_prompt(&today, sampled);
    let rows_json = serde_json::to_string(rows).unwrap_or_else(|_| "[]".to_string());
    let user = prompts::narrative_user_message(question, category, total, rows.len(), &rows_json);
    llm.chat(model, &system, &user, NARRATE_MAX_TOKENS, NARRATE_TEMPERATURE)
        .await
}
