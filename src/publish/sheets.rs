//! Google Sheets append via a service-account token.
//!
//! The service-account key signs a short-lived JWT which is exchanged for an
//! OAuth access token. The token is cached and renewed shortly before it
//! expires, since a warm process can outlive it.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::PublishError;
use crate::publish::SheetLog;
use crate::publish::api::truncate;
use crate::secrets::ServiceAccountKey;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for the signed assertion.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Renew the access token this long before it expires.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

struct CachedToken {
    token: SecretString,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now + REFRESH_MARGIN < self.expires_at
    }
}

pub struct SheetsClient {
    client: reqwest::Client,
    spreadsheet_id: String,
    key: ServiceAccountKey,
    token: Mutex<Option<CachedToken>>,
}

impl SheetsClient {
    pub fn new(client: reqwest::Client, spreadsheet_id: impl Into<String>, key: ServiceAccountKey) -> Self {
        Self {
            client,
            spreadsheet_id: spreadsheet_id.into(),
            key,
            token: Mutex::new(None),
        }
    }

    /// Current access token, fetching a new one when missing or near expiry.
    async fn access_token(&self) -> Result<SecretString, PublishError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref()
            && token.is_fresh(Instant::now())
        {
            return Ok(token.token.clone());
        }

        let assertion = sign_assertion(&self.key, Utc::now().timestamp())?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| PublishError::Auth(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Auth(format!(
                "token endpoint returned {}: {}",
                status.as_u16(),
                truncate(&body, 500)
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PublishError::Auth(format!("invalid token response: {e}")))?;

        info!(expires_in = token.expires_in, "Obtained spreadsheet access token");
        let secret = SecretString::from(token.access_token);
        *cached = Some(CachedToken {
            token: secret.clone(),
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(secret)
    }
}

#[async_trait]
impl SheetLog for SheetsClient {
    async fn append_row(&self, range: &str, row: Vec<Value>) -> Result<(), PublishError> {
        let token = self.access_token().await?;
        let url = append_url(&self.spreadsheet_id, range);

        let response = self
            .client
            .post(&url)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .bearer_auth(token.expose_secret())
            .json(&json!({ "values": [row] }))
            .send()
            .await
            .map_err(|e| PublishError::Append {
                range: range.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Append {
                range: range.to_string(),
                reason: format!("status {}: {}", status.as_u16(), truncate(&body, 500)),
            });
        }

        debug!(range, "Sheets append accepted");
        Ok(())
    }
}

/// `values:append` endpoint for a range, with the range percent-encoded.
pub fn append_url(spreadsheet_id: &str, range: &str) -> String {
    format!(
        "{SHEETS_API_BASE}/{}/values/{}:append",
        urlencoding::encode(spreadsheet_id),
        urlencoding::encode(range)
    )
}

/// Sign the RS256 assertion exchanged for an access token.
fn sign_assertion(key: &ServiceAccountKey, now: i64) -> Result<String, PublishError> {
    let claims = Claims {
        iss: &key.client_email,
        scope: SHEETS_SCOPE,
        aud: &key.token_uri,
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    };
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.expose_secret().as_bytes())
        .map_err(|e| PublishError::Auth(format!("invalid private key: {e}")))?;
    jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
        .map_err(|e| PublishError::Auth(format!("failed to sign assertion: {e}")))
}
