//! Orchestrator: drives one stored email through the whole pipeline.
//!
//! Flow per object:
//! 1. Fetch and parse the raw email
//! 2. Relocate supported attachments
//! 3. Classify by subject; `Unknown` stops here
//! 4. Summarize with the category's prompt
//! 5. Publish to the record API and the spreadsheet
//!
//! Fetch, classification and summarization failures are fatal and returned.
//! Attachment and publish failures are logged and never abort the message.

use std::sync::Arc;

use tracing::{error, info};

use crate::config::TriageConfig;
use crate::error::PipelineError;
use crate::llm::provider::LlmProvider;
use crate::mail::attachments::AttachmentRelocator;
use crate::mail::fetch::fetch_message;
use crate::pipeline::classifier::Classifier;
use crate::pipeline::summarizer::Summarizer;
use crate::pipeline::types::Category;
use crate::publish::{Publication, PublishReport, Publisher};
use crate::storage::ObjectStore;
use crate::trigger::ObjectRef;

/// Processing stage of one message, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Fetched,
    AttachmentsProcessed,
    Classified,
    Unclassified,
    Summarized,
    Published,
    Failed,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Fetched => "fetched",
            Self::AttachmentsProcessed => "attachments_processed",
            Self::Classified => "classified",
            Self::Unclassified => "unclassified",
            Self::Summarized => "summarized",
            Self::Published => "published",
            Self::Failed => "failed",
        }
    }
}

/// Terminal result of a message that did not fail.
#[derive(Debug)]
pub enum Outcome {
    /// Classified as neither category; dropped.
    Unclassified { subject: String },
    Published {
        category: Category,
        report: PublishReport,
    },
}

pub struct Orchestrator {
    store: Arc<dyn ObjectStore>,
    relocator: AttachmentRelocator,
    classifier: Classifier,
    summarizer: Summarizer,
    publisher: Publisher,
    /// Destination for attachments; `None` keeps them in the email's bucket.
    attachment_bucket: Option<String>,
    region: String,
}

impl Orchestrator {
    pub fn new(
        config: &TriageConfig,
        store: Arc<dyn ObjectStore>,
        llm: Arc<dyn LlmProvider>,
        publisher: Publisher,
    ) -> Self {
        Self {
            relocator: AttachmentRelocator::new(
                Arc::clone(&store),
                config.attachment_prefix.clone(),
                config.preview_base_url.clone(),
            ),
            store,
            classifier: Classifier::new(Arc::clone(&llm)),
            summarizer: Summarizer::new(llm),
            publisher,
            attachment_bucket: config.attachment_bucket.clone(),
            region: config.region.clone(),
        }
    }

    /// Process objects in order, stopping at the first fatal error.
    ///
    /// Records before the failing one are already published when the error
    /// is returned. A retried event processes them again, so delivery to the
    /// record API and the sheet is at-least-once.
    pub async fn process_all(&self, objects: &[ObjectRef]) -> Result<Vec<Outcome>, PipelineError> {
        let mut outcomes = Vec::with_capacity(objects.len());
        for object in objects {
            outcomes.push(self.process(object).await?);
        }
        Ok(outcomes)
    }

    /// Process one stored email.
    pub async fn process(&self, object: &ObjectRef) -> Result<Outcome, PipelineError> {
        let ObjectRef { bucket, key } = object;
        log_stage(object, Stage::Received);

        let mut message = fetch_message(self.store.as_ref(), bucket, key)
            .await
            .map_err(|source| {
                error!(
                    bucket = %bucket,
                    key = %key,
                    error = %source,
                    stage = Stage::Failed.as_str(),
                    "Failed to fetch email"
                );
                PipelineError::Fetch {
                    bucket: bucket.clone(),
                    key: key.clone(),
                    source,
                }
            })?;
        log_stage(object, Stage::Fetched);

        // The relocator takes ownership of the attachment bytes.
        let attachments = std::mem::take(&mut message.attachments);
        let target_bucket = self.attachment_bucket.as_deref().unwrap_or(bucket);
        let relocated = self.relocator.relocate_all(target_bucket, attachments).await;
        info!(
            bucket = %bucket,
            key = %key,
            relocated = relocated.len(),
            stage = Stage::AttachmentsProcessed.as_str(),
            "Attachments processed"
        );

        let classification = self
            .classifier
            .classify(&message.subject)
            .await
            .map_err(|source| {
                error!(
                    subject = %message.subject,
                    bucket = %bucket,
                    key = %key,
                    error = %source,
                    stage = Stage::Failed.as_str(),
                    "Failed to classify email"
                );
                PipelineError::Classification {
                    bucket: bucket.clone(),
                    key: key.clone(),
                    source,
                }
            })?;
        log_stage(object, Stage::Classified);

        let Some(category) = classification.category() else {
            info!(
                subject = %message.subject,
                bucket = %bucket,
                key = %key,
                classification = classification.label(),
                stage = Stage::Unclassified.as_str(),
                "Email is neither a job posting nor a candidate profile, dropping"
            );
            return Ok(Outcome::Unclassified {
                subject: message.subject,
            });
        };

        let record = self
            .summarizer
            .summarize(category, &message)
            .await
            .map_err(|source| {
                error!(
                    subject = %message.subject,
                    bucket = %bucket,
                    key = %key,
                    error = %source,
                    stage = Stage::Failed.as_str(),
                    "Failed to summarize email"
                );
                PipelineError::Summarization {
                    bucket: bucket.clone(),
                    key: key.clone(),
                    source,
                }
            })?;
        log_stage(object, Stage::Summarized);

        let source_url = TriageConfig::object_url_in(&self.region, bucket, key);
        let report = self
            .publisher
            .publish(Publication {
                record: &record,
                message: &message,
                source_url: &source_url,
                attachments: &relocated,
            })
            .await;

        info!(
            subject = %record.subject,
            bucket = %bucket,
            key = %key,
            category = category.name(),
            complete = report.is_complete(),
            stage = Stage::Published.as_str(),
            "Email processed"
        );
        Ok(Outcome::Published { category, report })
    }
}

fn log_stage(object: &ObjectRef, stage: Stage) {
    tracing::debug!(bucket = %object.bucket, key = %object.key, stage = stage.as_str(), "Stage reached");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_are_snake_case() {
        assert_eq!(Stage::AttachmentsProcessed.as_str(), "attachments_processed");
        assert_eq!(Stage::Failed.as_str(), "failed");
    }
}
