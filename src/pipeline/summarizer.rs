//! Summarizer: extracts the business fields of a classified message.
//!
//! The prompt differs by category (remote wording, which end of a reward
//! range to keep, what "age" means). Subject, sender and recipient domain
//! are taken from the parsed message rather than the model reply.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::SummarizationError;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};
use crate::mail::ParsedMessage;
use crate::pipeline::prompts::{summary_system_prompt, summary_user_prompt};
use crate::pipeline::response::{extract_json_object, parse_reward, value_to_text};
use crate::pipeline::types::{Category, RemotePolicy, SummaryRecord};

const SUMMARY_MAX_TOKENS: u32 = 512;

const SUMMARY_TEMPERATURE: f32 = 0.2;

/// Model reply. Every field is optional and may be a string or a number.
#[derive(Debug, Default, Deserialize)]
struct RawSummary {
    #[serde(default)]
    subject: Value,
    #[serde(default)]
    email: Value,
    #[serde(default)]
    remote: Value,
    #[serde(default)]
    date_and_time: Value,
    #[serde(default)]
    location: Value,
    #[serde(default)]
    start_time: Value,
    #[serde(default)]
    reward: Value,
    #[serde(default)]
    age: Value,
}

pub struct Summarizer {
    llm: Arc<dyn LlmProvider>,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Summarize a message already classified as `category`.
    pub async fn summarize(
        &self,
        category: Category,
        message: &ParsedMessage,
    ) -> Result<SummaryRecord, SummarizationError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(summary_system_prompt(category)),
            ChatMessage::user(summary_user_prompt(message)),
        ])
        .with_temperature(SUMMARY_TEMPERATURE)
        .with_max_tokens(SUMMARY_MAX_TOKENS);

        let response = self
            .llm
            .complete(request)
            .await
            .map_err(|source| SummarizationError::Llm {
                variant: category.name(),
                subject: message.subject.clone(),
                source,
            })?;
        debug!(raw_response = %response.content, "Summarizer replied");

        let record = parse_summary(&response.content, category, message).map_err(|reason| {
            SummarizationError::Parse {
                variant: category.name(),
                subject: message.subject.clone(),
                reason,
            }
        })?;

        info!(
            subject = %record.subject,
            category = category.name(),
            reward = ?record.reward,
            remote = record.remote_label(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Summarized message"
        );
        Ok(record)
    }
}

/// Build a `SummaryRecord` from a model reply.
///
/// Fails only when the reply has no JSON object; individual fields that are
/// missing or malformed become empty.
pub fn parse_summary(
    raw: &str,
    category: Category,
    message: &ParsedMessage,
) -> Result<SummaryRecord, String> {
    let json = extract_json_object(raw);
    let parsed: RawSummary = serde_json::from_str(&json).map_err(|e| e.to_string())?;

    let remote_text = value_to_text(&parsed.remote);
    let remote = RemotePolicy::parse(&remote_text);
    if remote.is_none() && !remote_text.is_empty() {
        warn!(
            subject = %message.subject,
            remote = %remote_text,
            "Unrecognized remote policy, leaving blank"
        );
    }

    let or_model = |local: &str, model: &Value| {
        if local.is_empty() {
            value_to_text(model)
        } else {
            local.to_string()
        }
    };

    Ok(SummaryRecord {
        category,
        subject: or_model(&message.subject, &parsed.subject),
        email: or_model(&message.sender, &parsed.email),
        domain: message.recipient_domain().map(str::to_string),
        remote,
        date_and_time: value_to_text(&parsed.date_and_time),
        location: value_to_text(&parsed.location),
        start_time: value_to_text(&parsed.start_time),
        reward: parse_reward(&parsed.reward, category),
        age: value_to_text(&parsed.age),
    })
}
