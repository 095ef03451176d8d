//! Credentials loaded once per process from SSM Parameter Store.
//!
//! Local runs can bypass SSM by exporting `OPENAI_API_KEY`,
//! `PUBLISHER_API_KEY` and `SHEETS_CREDENTIALS_JSON`.

use std::collections::HashMap;

use secrecy::SecretString;
use serde::Deserialize;
use tracing::info;

use crate::config::ParameterNames;
use crate::error::SecretsError;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Google service-account key, as downloaded from the cloud console.
#[derive(Debug, Clone)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: SecretString,
    pub token_uri: String,
}

#[derive(Deserialize)]
struct RawServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default)]
    token_uri: Option<String>,
}

impl ServiceAccountKey {
    /// Parse the JSON key file contents.
    pub fn from_json(name: &str, json: &str) -> Result<Self, SecretsError> {
        let raw: RawServiceAccountKey =
            serde_json::from_str(json).map_err(|e| SecretsError::InvalidCredentials {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            client_email: raw.client_email,
            private_key: SecretString::from(raw.private_key),
            token_uri: raw
                .token_uri
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
        })
    }
}

/// All credentials the pipeline needs.
#[derive(Debug, Clone)]
pub struct Secrets {
    pub openai_key: SecretString,
    /// Bearer token for the record API.
    pub publisher_key: SecretString,
    pub sheets_credentials: ServiceAccountKey,
}

impl Secrets {
    /// Assemble secrets from a name → value map.
    pub fn from_values(
        names: &ParameterNames,
        mut values: HashMap<String, String>,
    ) -> Result<Self, SecretsError> {
        let mut take = |name: &str| {
            values
                .remove(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| SecretsError::Missing {
                    name: name.to_string(),
                })
        };

        let openai_key = take(&names.openai_key)?;
        let publisher_key = take(&names.publisher_key)?;
        let sheets_json = take(&names.sheets_credentials)?;

        Ok(Self {
            openai_key: SecretString::from(openai_key),
            publisher_key: SecretString::from(publisher_key),
            sheets_credentials: ServiceAccountKey::from_json(&names.sheets_credentials, &sheets_json)?,
        })
    }

    /// Read secrets from environment variables.
    ///
    /// `None` when any of the three variables is unset; an error when they are
    /// set but invalid.
    pub fn from_env(names: &ParameterNames) -> Option<Result<Self, SecretsError>> {
        Self::from_lookup(names, |key| std::env::var(key).ok())
    }

    /// Read the local override variables from an arbitrary lookup.
    pub fn from_lookup(
        names: &ParameterNames,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Option<Result<Self, SecretsError>> {
        let openai = lookup("OPENAI_API_KEY")?;
        let publisher = lookup("PUBLISHER_API_KEY")?;
        let sheets = lookup("SHEETS_CREDENTIALS_JSON")?;

        let values = HashMap::from([
            (names.openai_key.clone(), openai),
            (names.publisher_key.clone(), publisher),
            (names.sheets_credentials.clone(), sheets),
        ]);
        Some(Self::from_values(names, values))
    }

    /// Fetch all parameters in one decrypted `GetParameters` call.
    pub async fn load_from_ssm(
        client: &aws_sdk_ssm::Client,
        names: &ParameterNames,
    ) -> Result<Self, SecretsError> {
        let response = client
            .get_parameters()
            .names(&names.openai_key)
            .names(&names.publisher_key)
            .names(&names.sheets_credentials)
            .with_decryption(true)
            .send()
            .await
            .map_err(|e| SecretsError::Fetch(aws_sdk_ssm::error::DisplayErrorContext(&e).to_string()))?;

        if let Some(name) = response.invalid_parameters().first() {
            return Err(SecretsError::Missing { name: name.clone() });
        }

        let values: HashMap<String, String> = response
            .parameters()
            .iter()
            .filter_map(|p| Some((p.name()?.to_string(), p.value()?.to_string())))
            .collect();

        info!(count = values.len(), "Loaded parameters from SSM");
        Self::from_values(names, values)
    }
}
