//! Bearer-authenticated JSON record API.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::error::PublishError;
use crate::publish::RecordApi;

/// Error bodies longer than this are cut before logging.
const MAX_ERROR_BODY_CHARS: usize = 500;

pub struct HttpRecordApi {
    client: reqwest::Client,
    api_key: SecretString,
}

impl HttpRecordApi {
    pub fn new(client: reqwest::Client, api_key: SecretString) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl RecordApi for HttpRecordApi {
    async fn post(&self, endpoint: &str, payload: &Value) -> Result<(), PublishError> {
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(payload)
            .send()
            .await
            .map_err(|e| PublishError::Request {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY_CHARS),
            });
        }

        tracing::debug!(endpoint, status = status.as_u16(), "Record API accepted payload");
        Ok(())
    }
}

/// Keep at most `max` characters.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
