use aws_lambda_events::event::s3::S3Event;
use lambda_runtime::{LambdaEvent, service_fn};

use mail_triage::config::TriageConfig;
use mail_triage::context::AppContext;
use mail_triage::pipeline::Outcome;

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    // The log sink timestamps lines itself.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_ansi(false)
        .without_time()
        .init();

    let config = TriageConfig::from_env()?;
    let context = AppContext::init(config).await?;

    lambda_runtime::run(service_fn(|event: LambdaEvent<S3Event>| {
        handle(&context, event)
    }))
    .await
}

async fn handle(context: &AppContext, event: LambdaEvent<S3Event>) -> Result<(), lambda_runtime::Error> {
    let outcomes = context.handle_event(&event.payload).await?;

    let published = outcomes
        .iter()
        .filter(|o| matches!(o, Outcome::Published { .. }))
        .count();
    tracing::info!(
        request_id = %event.context.request_id,
        processed = outcomes.len(),
        published,
        "Invocation complete"
    );
    Ok(())
}
