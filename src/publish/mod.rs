//! Downstream publishing: record API and spreadsheet log.
//!
//! The two sinks are independent. Both are always attempted and a failure of
//! one is reported without affecting the other.

pub mod api;
pub mod sheets;

pub use api::HttpRecordApi;
pub use sheets::SheetsClient;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::config::TriageConfig;
use crate::error::PublishError;
use crate::mail::ParsedMessage;
use crate::mail::attachments::RelocatedAttachment;
use crate::pipeline::types::{Category, SummaryRecord};

/// Sheet cell format for the received timestamp.
const SHEET_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// JSON record API.
#[async_trait]
pub trait RecordApi: Send + Sync {
    async fn post(&self, endpoint: &str, payload: &Value) -> Result<(), PublishError>;
}

/// Append-only spreadsheet log.
#[async_trait]
pub trait SheetLog: Send + Sync {
    async fn append_row(&self, range: &str, row: Vec<Value>) -> Result<(), PublishError>;
}

/// Everything published for one message.
#[derive(Debug, Clone, Copy)]
pub struct Publication<'a> {
    pub record: &'a SummaryRecord,
    pub message: &'a ParsedMessage,
    /// URL of the raw email object.
    pub source_url: &'a str,
    pub attachments: &'a [RelocatedAttachment],
}

/// Result of each sink.
#[derive(Debug)]
pub struct PublishReport {
    pub api: Result<(), PublishError>,
    pub sheet: Result<(), PublishError>,
}

impl PublishReport {
    pub fn is_complete(&self) -> bool {
        self.api.is_ok() && self.sheet.is_ok()
    }
}

/// Where one category is published.
#[derive(Debug, Clone)]
struct Target {
    endpoint: String,
    range: String,
}

pub struct Publisher {
    api: Arc<dyn RecordApi>,
    sheets: Arc<dyn SheetLog>,
    job_posting: Target,
    candidate_profile: Target,
}

impl Publisher {
    pub fn new(api: Arc<dyn RecordApi>, sheets: Arc<dyn SheetLog>, config: &TriageConfig) -> Self {
        Self {
            api,
            sheets,
            job_posting: Target {
                endpoint: config.job_posting_endpoint.clone(),
                range: config.job_posting_range.clone(),
            },
            candidate_profile: Target {
                endpoint: config.candidate_profile_endpoint.clone(),
                range: config.candidate_profile_range.clone(),
            },
        }
    }

    fn target(&self, category: Category) -> &Target {
        match category {
            Category::JobPosting => &self.job_posting,
            Category::CandidateProfile => &self.candidate_profile,
        }
    }

    /// Post the record and append the sheet row. Failures are logged and
    /// returned in the report, never raised.
    pub async fn publish(&self, publication: Publication<'_>) -> PublishReport {
        let category = publication.record.category;
        let target = self.target(category);
        let payload = build_api_payload(&publication);
        let row = build_sheet_row(&publication);

        let (api, sheet) = futures::join!(
            self.api.post(&target.endpoint, &payload),
            self.sheets.append_row(&target.range, row),
        );

        let subject = &publication.record.subject;
        match &api {
            Ok(()) => info!(endpoint = %target.endpoint, subject = %subject, "Posted record"),
            Err(e) => warn!(error = %e, subject = %subject, "Record API publish failed"),
        }
        match &sheet {
            Ok(()) => info!(range = %target.range, subject = %subject, "Appended sheet row"),
            Err(e) => warn!(error = %e, subject = %subject, "Spreadsheet publish failed"),
        }

        PublishReport { api, sheet }
    }
}

/// Flat JSON body for the record API.
pub fn build_api_payload(publication: &Publication<'_>) -> Value {
    let Publication {
        record,
        message,
        source_url,
        attachments,
    } = *publication;

    let attachment_info = if attachments.is_empty() {
        Value::Null
    } else {
        let entries: Vec<Value> = attachments
            .iter()
            .map(|a| json!({ "filename": a.filename, "previewUrl": a.preview_url }))
            .collect();
        Value::String(Value::Array(entries).to_string())
    };

    json!({
        "報酬": record.reward,
        "場所": record.location,
        "本文": message.body,
        "開始時期": record.start_time,
        "リモート可否": record.remote_label(),
        "メール受信日時": message.received_at.map(|d| d.to_rfc3339()),
        "送信先ドメイン名": record.domain_or_empty(),
        "メールアドレス": record.email,
        "年齢制限": record.age,
        "件名": record.subject,
        "メールurl": source_url,
        "添付ファイル数": attachments.len(),
        "添付ファイル情報": attachment_info,
    })
}

/// Spreadsheet row in the column order of the category's tab.
pub fn build_sheet_row(publication: &Publication<'_>) -> Vec<Value> {
    let record = publication.record;
    let received = publication
        .message
        .received_at
        .map(|d| d.format(SHEET_DATE_FORMAT).to_string())
        .unwrap_or_default();
    let reward = record
        .reward
        .map(Value::from)
        .unwrap_or_else(|| Value::from(""));
    let flag = if publication.attachments.is_empty() {
        "なし"
    } else {
        "あり"
    };

    let text = |s: &str| Value::from(s);
    match record.category {
        Category::JobPosting => vec![
            text(&received),
            reward,
            text(&record.location),
            text(&record.start_time),
            text(record.remote_label()),
            text(record.domain_or_empty()),
            text(&record.email),
            text(&record.age),
            text(&record.subject),
            text(flag),
        ],
        Category::CandidateProfile => vec![
            text(&received),
            reward,
            text(&record.location),
            text(&record.start_time),
            text(record.domain_or_empty()),
            text(&record.email),
            text(record.remote_label()),
            text(&record.age),
            text(&record.subject),
            text(flag),
        ],
    }
}
