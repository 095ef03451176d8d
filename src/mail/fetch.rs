//! Object fetcher: storage object → `ParsedMessage`.

use tracing::info;

use crate::error::FetchError;
use crate::mail::{ParsedMessage, parse_message};
use crate::storage::ObjectStore;

/// Retrieve the raw email at `bucket/key` and parse it.
///
/// Fails on storage errors or unparseable content; nothing downstream runs
/// for a message that fails here.
pub async fn fetch_message(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
) -> Result<ParsedMessage, FetchError> {
    let raw = store
        .get(bucket, key)
        .await
        .map_err(|source| FetchError::Storage {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source,
        })?;

    let message = parse_message(&raw).ok_or_else(|| FetchError::Parse {
        bucket: bucket.to_string(),
        key: key.to_string(),
    })?;

    info!(
        bucket,
        key,
        subject = %message.subject,
        attachments = message.attachments.len(),
        "Fetched email"
    );
    Ok(message)
}
