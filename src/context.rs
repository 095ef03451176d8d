//! Application context: clients and credentials built once per process.

use std::sync::Arc;

use aws_config::{BehaviorVersion, Region};
use aws_lambda_events::event::s3::S3Event;
use tracing::info;

use crate::config::TriageConfig;
use crate::error::{Error, Result};
use crate::llm::{LlmConfig, create_provider};
use crate::pipeline::{Orchestrator, Outcome};
use crate::publish::{HttpRecordApi, Publisher, SheetsClient};
use crate::secrets::Secrets;
use crate::storage::S3ObjectStore;
use crate::trigger::parse_event;

/// Everything an invocation needs, shared across warm invocations.
pub struct AppContext {
    orchestrator: Orchestrator,
}

impl AppContext {
    /// Load secrets and build every client.
    pub async fn init(config: TriageConfig) -> Result<Self> {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let secrets = match Secrets::from_env(&config.parameters) {
            Some(secrets) => {
                info!("Using credentials from environment");
                secrets?
            }
            None => {
                let ssm = aws_sdk_ssm::Client::new(&sdk_config);
                Secrets::load_from_ssm(&ssm, &config.parameters).await?
            }
        };

        let llm = create_provider(&LlmConfig {
            backend: config.llm_backend,
            api_key: secrets.openai_key.clone(),
            model: config.llm_model.clone(),
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        let publisher = Publisher::new(
            Arc::new(HttpRecordApi::new(http.clone(), secrets.publisher_key.clone())),
            Arc::new(SheetsClient::new(
                http,
                config.spreadsheet_id.clone(),
                secrets.sheets_credentials.clone(),
            )),
            &config,
        );

        let store = Arc::new(S3ObjectStore::new(aws_sdk_s3::Client::new(&sdk_config)));
        let orchestrator = Orchestrator::new(&config, store, llm, publisher);

        info!(
            region = %config.region,
            model = %config.llm_model,
            "Application context ready"
        );
        Ok(Self::from_orchestrator(orchestrator))
    }

    /// Wrap an already-built orchestrator.
    pub fn from_orchestrator(orchestrator: Orchestrator) -> Self {
        Self { orchestrator }
    }

    /// Handle one storage-event notification.
    pub async fn handle_event(&self, event: &S3Event) -> Result<Vec<Outcome>> {
        let objects = parse_event(event)?;
        info!(records = objects.len(), "Received storage event");
        self.orchestrator
            .process_all(&objects)
            .await
            .map_err(Error::from)
    }
}
