//! Subject classifier: one LLM call per message.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ClassificationError;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};
use crate::pipeline::prompts::{classification_system_prompt, classification_user_prompt};
use crate::pipeline::response::extract_json_object;
use crate::pipeline::types::Classification;

/// The reply is a single short JSON object.
const CLASSIFY_MAX_TOKENS: u32 = 64;

const CLASSIFY_TEMPERATURE: f32 = 0.0;

#[derive(Deserialize)]
struct RawClassification {
    classification: String,
}

/// Decides whether a message is a job posting, a candidate profile, or neither.
pub struct Classifier {
    llm: Arc<dyn LlmProvider>,
}

impl Classifier {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Classify a message by its subject.
    pub async fn classify(&self, subject: &str) -> Result<Classification, ClassificationError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(classification_system_prompt()),
            ChatMessage::user(classification_user_prompt(subject)),
        ])
        .with_temperature(CLASSIFY_TEMPERATURE)
        .with_max_tokens(CLASSIFY_MAX_TOKENS);

        let response = self
            .llm
            .complete(request)
            .await
            .map_err(|source| ClassificationError::Llm {
                subject: subject.to_string(),
                source,
            })?;
        debug!(raw_response = %response.content, "Classifier replied");

        let classification =
            parse_classification(&response.content).map_err(|reason| ClassificationError::Parse {
                subject: subject.to_string(),
                reason,
            })?;

        info!(
            subject = %subject,
            classification = classification.label(),
            model = self.llm.model_name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Classified message"
        );
        Ok(classification)
    }
}

/// Parse `{"classification": "..."}` from a model reply.
pub fn parse_classification(raw: &str) -> Result<Classification, String> {
    let json = extract_json_object(raw);
    let parsed: RawClassification = serde_json::from_str(&json).map_err(|e| e.to_string())?;
    Ok(Classification::from_label(&parsed.classification))
}
