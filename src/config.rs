//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;
use crate::llm::LlmBackend;

/// Region used for the SDK clients and the source-object URL.
pub const DEFAULT_REGION: &str = "ap-northeast-1";

/// Default model for classification and summarization.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default spreadsheet range for job postings.
pub const DEFAULT_JOB_POSTING_RANGE: &str = "案件!A2:A";

/// Default spreadsheet range for candidate profiles.
pub const DEFAULT_CANDIDATE_PROFILE_RANGE: &str = "要員!A2:A";

/// Key prefix for relocated attachments.
pub const DEFAULT_ATTACHMENT_PREFIX: &str = "attachments/";

/// Document viewer that renders a signed URL passed as `src`.
pub const DEFAULT_PREVIEW_BASE_URL: &str = "https://view.officeapps.live.com/op/view.aspx?src=";

/// Default HTTP request timeout in seconds.
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Names of the secure parameters holding credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterNames {
    pub openai_key: String,
    pub publisher_key: String,
    pub sheets_credentials: String,
}

impl Default for ParameterNames {
    fn default() -> Self {
        Self {
            openai_key: "openai-key".to_string(),
            publisher_key: "make-key".to_string(),
            sheets_credentials: "spreadsheets-credentials".to_string(),
        }
    }
}

/// Pipeline configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    pub region: String,
    pub spreadsheet_id: String,
    /// Record API endpoint for job postings.
    pub job_posting_endpoint: String,
    /// Record API endpoint for candidate profiles.
    pub candidate_profile_endpoint: String,
    pub job_posting_range: String,
    pub candidate_profile_range: String,
    /// Bucket for relocated attachments. `None` → the email's own bucket.
    pub attachment_bucket: Option<String>,
    pub attachment_prefix: String,
    pub preview_base_url: String,
    pub llm_backend: LlmBackend,
    pub llm_model: String,
    pub http_timeout: Duration,
    pub parameters: ParameterNames,
}

impl TriageConfig {
    /// Build config from environment variables.
    ///
    /// `SPREADSHEET_ID`, `JOB_POSTING_ENDPOINT` and
    /// `CANDIDATE_PROFILE_ENDPOINT` are required.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };
        let or_default = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let http_timeout_secs = match lookup("HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                key: "HTTP_TIMEOUT_SECS".into(),
                message: e.to_string(),
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        let llm_backend: LlmBackend = or_default("LLM_BACKEND", "openai").parse()?;

        let defaults = ParameterNames::default();

        Ok(Self {
            region: or_default("AWS_REGION", DEFAULT_REGION),
            spreadsheet_id: required("SPREADSHEET_ID")?,
            job_posting_endpoint: required("JOB_POSTING_ENDPOINT")?,
            candidate_profile_endpoint: required("CANDIDATE_PROFILE_ENDPOINT")?,
            job_posting_range: or_default("JOB_POSTING_RANGE", DEFAULT_JOB_POSTING_RANGE),
            candidate_profile_range: or_default(
                "CANDIDATE_PROFILE_RANGE",
                DEFAULT_CANDIDATE_PROFILE_RANGE,
            ),
            attachment_bucket: lookup("ATTACHMENT_BUCKET").filter(|v| !v.trim().is_empty()),
            attachment_prefix: or_default("ATTACHMENT_PREFIX", DEFAULT_ATTACHMENT_PREFIX),
            preview_base_url: or_default("PREVIEW_BASE_URL", DEFAULT_PREVIEW_BASE_URL),
            llm_backend,
            llm_model: or_default("LLM_MODEL", DEFAULT_MODEL),
            http_timeout: Duration::from_secs(http_timeout_secs),
            parameters: ParameterNames {
                openai_key: or_default("OPENAI_KEY_PARAM", &defaults.openai_key),
                publisher_key: or_default("PUBLISHER_KEY_PARAM", &defaults.publisher_key),
                sheets_credentials: or_default(
                    "SHEETS_CREDENTIALS_PARAM",
                    &defaults.sheets_credentials,
                ),
            },
        })
    }

    /// Public HTTPS URL of an object in `region`.
    pub fn object_url_in(region: &str, bucket: &str, key: &str) -> String {
        format!("https://{bucket}.s3.{region}.amazonaws.com/{key}")
    }
}
