//! Error types for the triage pipeline.

/// Top-level error type for one invocation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Secrets error: {0}")]
    Secrets(#[from] SecretsError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Trigger error: {0}")]
    Trigger(#[from] TriggerError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors loading credentials at startup.
#[derive(Debug, thiserror::Error)]
pub enum SecretsError {
    #[error("Failed to get parameters: {0}")]
    Fetch(String),

    #[error("Parameter {name} is missing or has no value")]
    Missing { name: String },

    #[error("Parameter {name} is not valid service-account JSON: {reason}")]
    InvalidCredentials { name: String, reason: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Object storage errors, independent of the backing service.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Object {key} not found in bucket {bucket}")]
    NotFound { bucket: String, key: String },

    #[error("Get {bucket}/{key} failed: {reason}")]
    Get {
        bucket: String,
        key: String,
        reason: String,
    },

    #[error("Put {bucket}/{key} failed: {reason}")]
    Put {
        bucket: String,
        key: String,
        reason: String,
    },

    #[error("Presign {bucket}/{key} failed: {reason}")]
    Presign {
        bucket: String,
        key: String,
        reason: String,
    },
}

/// Malformed storage-event payloads.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error("Event contains no records")]
    NoRecords,

    #[error("Record {index} is missing {field}")]
    MissingField { index: usize, field: &'static str },

    #[error("Object key {key} is not valid percent-encoded UTF-8")]
    InvalidKey { key: String },
}

/// Failure to retrieve or parse the raw email.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to get object = {key}, bucket = {bucket}: {source}")]
    Storage {
        bucket: String,
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("failed to parse object = {key}, bucket = {bucket}: not a valid RFC 822 message")]
    Parse { bucket: String, key: String },
}

/// Per-attachment relocation failure. Never fatal to the message.
#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("upload of {filename} failed: {source}")]
    Upload {
        filename: String,
        #[source]
        source: StorageError,
    },

    #[error("signing URL for {filename} failed: {source}")]
    Sign {
        filename: String,
        #[source]
        source: StorageError,
    },
}

/// Classifier failures. There is no fallback classification.
#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    #[error("failed to predict classification, subject = {subject}: {source}")]
    Llm {
        subject: String,
        #[source]
        source: LlmError,
    },

    #[error("failed to parse classification, subject = {subject}: {reason}")]
    Parse { subject: String, reason: String },
}

/// Summarizer failures.
#[derive(Debug, thiserror::Error)]
pub enum SummarizationError {
    #[error("failed to summarize {variant}, subject = {subject}: {source}")]
    Llm {
        variant: &'static str,
        subject: String,
        #[source]
        source: LlmError,
    },

    #[error("failed to parse {variant} summary, subject = {subject}: {reason}")]
    Parse {
        variant: &'static str,
        subject: String,
        reason: String,
    },
}

/// Downstream publish failures (HTTP API or spreadsheet append).
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("POST {endpoint} failed: {reason}")]
    Request { endpoint: String, reason: String },

    #[error("POST {endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Spreadsheet append to {range} failed: {reason}")]
    Append { range: String, reason: String },

    #[error("Spreadsheet auth failed: {0}")]
    Auth(String),
}

/// Fatal failures of one message, tagged by the stage that failed.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("object = {key}, bucket = {bucket}: {source}")]
    Fetch {
        bucket: String,
        key: String,
        #[source]
        source: FetchError,
    },

    #[error("object = {key}, bucket = {bucket}: {source}")]
    Classification {
        bucket: String,
        key: String,
        #[source]
        source: ClassificationError,
    },

    #[error("object = {key}, bucket = {bucket}: {source}")]
    Summarization {
        bucket: String,
        key: String,
        #[source]
        source: SummarizationError,
    },
}

/// Result type alias for the pipeline.
pub type Result<T> = std::result::Result<T, Error>;
