//! Storage-event trigger parsing.

use aws_lambda_events::event::s3::S3Event;

use crate::error::TriggerError;

/// One stored object named by the trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    /// Decoded object key.
    pub key: String,
}

/// Extract every object reference from an S3 event notification.
pub fn parse_event(event: &S3Event) -> Result<Vec<ObjectRef>, TriggerError> {
    if event.records.is_empty() {
        return Err(TriggerError::NoRecords);
    }

    event
        .records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let bucket = record
                .s3
                .bucket
                .name
                .clone()
                .filter(|b| !b.is_empty())
                .ok_or(TriggerError::MissingField {
                    index,
                    field: "s3.bucket.name",
                })?;
            let raw_key = record
                .s3
                .object
                .key
                .as_deref()
                .filter(|k| !k.is_empty())
                .ok_or(TriggerError::MissingField {
                    index,
                    field: "s3.object.key",
                })?;
            Ok(ObjectRef {
                bucket,
                key: decode_key(raw_key)?,
            })
        })
        .collect()
}

/// Decode an event key: `+` is a space, the rest is percent-encoded.
pub fn decode_key(raw: &str) -> Result<String, TriggerError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| TriggerError::InvalidKey {
            key: raw.to_string(),
        })
}
