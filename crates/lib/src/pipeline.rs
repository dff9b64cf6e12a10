//! One inbound message drives one linear pipeline run: deterministic rules,
//! model classification, dispatch, narration, formatting.
//!
//! Every external call is a sequential dependency; there is no state shared
//! across invocations, and a collaborator failure resolves to exactly one
//! user-facing message.

use crate::channels::InboundMessage;
use crate::classify;
use crate::config::{self, Config};
use crate::crm::{self, Category, CategoryId, CrmClient, CrmError, RecordMap};
use crate::dispatch::{self, ReadPlan, READ_PAGE_SIZE};
use crate::format;
use crate::intent::{self, ActionHint, Intent, RuleOutcome};
use crate::llm::OpenAiClient;
use crate::narrate;
use crate::vision::{self, PhotoSource, VisionOutcome};

const RETRY_MESSAGE: &str = "Error processing your request. Please try again.";

/// The intent-resolution pipeline and its collaborators.
pub struct Pipeline {
    llm: OpenAiClient,
    crm: CrmClient,
    chat_model: String,
    vision_model: String,
}

impl Pipeline {
    pub fn from_config(config: &Config) -> Self {
        let llm = OpenAiClient::new(
            config.llm.base_url.clone(),
            config::resolve_llm_api_key(config),
        );
        let crm = CrmClient::new(
            config.crm.base_url.clone(),
            config::resolve_crm_token(config),
        );
        Self {
            llm,
            crm,
            chat_model: config.llm.chat_model.clone(),
            vision_model: config.llm.vision_model.clone(),
        }
    }

    /// Handle one inbound message and return the sanitized reply text. The
    /// caller routes it back to the originating channel.
    pub async fn handle(
        &self,
        msg: &InboundMessage,
        photos: Option<&dyn PhotoSource>,
    ) -> String {
        let reply = self.reply_for(msg, photos).await;
        format::sanitize(&reply)
    }

    async fn reply_for(&self, msg: &InboundMessage, photos: Option<&dyn PhotoSource>) -> String {
        let text = msg.text.as_deref().unwrap_or("");
        if let Some(photo) = &msg.photo {
            return match photos {
                Some(source) => self.handle_photo(&photo.file_id, text, source).await,
                None => {
                    log::warn!(
                        "photo received on channel {} with no photo source",
                        msg.channel_id
                    );
                    dispatch::photo_error_message("photos are not supported on this channel")
                }
            };
        }
        match intent::classify(text) {
            RuleOutcome::Greeting => dispatch::greeting_reply(text),
            RuleOutcome::ListCategories => dispatch::category_listing(),
            RuleOutcome::Deferred(hint) => self.handle_deferred(text, hint).await,
        }
    }

    async fn handle_deferred(&self, text: &str, hint: Option<ActionHint>) -> String {
        let catalog = self.load_catalog().await;
        let cls =
            classify::classify_with_model(&self.llm, &self.chat_model, &catalog, hint, text).await;
        match (cls.intent, cls.category) {
            (Intent::Read, Some(category)) => self.handle_read(category, text).await,
            (Intent::Create, Some(category)) => self.handle_create(category, cls.data).await,
            (Intent::Create, None) => dispatch::create_details_prompt(),
            _ => dispatch::capability_summary(),
        }
    }

    /// The catalog is rebuilt every invocation so classification reflects the
    /// current backend schema. A failed fetch falls back to the static
    /// allow-list labels; reads and writes surface backend errors themselves.
    async fn load_catalog(&self) -> Vec<Category> {
        match self.crm.list_modules().await {
            Ok(raw) => crm::filter_catalog(&raw),
            Err(e) => {
                log::warn!("catalog fetch failed: {}", e);
                crm::filter_catalog(&[])
            }
        }
    }

    async fn handle_read(&self, category: CategoryId, question: &str) -> String {
        let records = match self
            .crm
            .fetch_records(category.api_name(), READ_PAGE_SIZE)
            .await
        {
            Ok(r) => r,
            Err(CrmError::Backend { message, .. }) => {
                return format!("Error fetching data: {}", message);
            }
            Err(e) => {
                log::warn!("read fetch failed: {}", e);
                return RETRY_MESSAGE.to_string();
            }
        };
        match dispatch::plan_read(category, records) {
            ReadPlan::NoRecords(msg) => msg,
            ReadPlan::Narrate { total, rows } => {
                match narrate::explain(&self.llm, &self.chat_model, question, category, total, &rows)
                    .await
                {
                    Ok(answer) if !answer.trim().is_empty() => answer,
                    Ok(_) => RETRY_MESSAGE.to_string(),
                    Err(e) => {
                        log::warn!("narration failed: {}", e);
                        RETRY_MESSAGE.to_string()
                    }
                }
            }
        }
    }

    async fn handle_create(&self, category: CategoryId, data: RecordMap) -> String {
        let missing = crm::missing_fields(category, &data);
        if !missing.is_empty() {
            return dispatch::missing_fields_clarification(category, &missing);
        }
        match self.crm.insert_record(category.api_name(), &data).await {
            Ok(res) => dispatch::interpret_write(category, &res),
            Err(e) => {
                log::warn!("create failed: {}", e);
                RETRY_MESSAGE.to_string()
            }
        }
    }

    async fn handle_photo(&self, file_id: &str, caption: &str, source: &dyn PhotoSource) -> String {
        match vision::extract_from_photo(&self.llm, &self.vision_model, source, file_id, caption)
            .await
        {
            VisionOutcome::Create {
                category,
                data,
                summary,
            } => match self.crm.insert_record(category.api_name(), &data).await {
                Ok(res) => dispatch::interpret_photo_write(category, summary.as_deref(), &res),
                Err(e) => {
                    log::warn!("photo create failed: {}", e);
                    RETRY_MESSAGE.to_string()
                }
            },
            VisionOutcome::Unrecognized => dispatch::photo_unrecognized_message(),
            VisionOutcome::Failed { error } => dispatch::photo_error_message(&error),
        }
    }
}
