//! Attachment relocator.
//!
//! Supported office/PDF attachments are copied to long-term storage under a
//! unique key, signed for one week, and wrapped in a document-viewer link.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::AttachmentError;
use crate::mail::{Attachment, DEFAULT_CONTENT_TYPE};
use crate::storage::ObjectStore;

/// Extensions (lowercase, without dot) that are relocated.
pub const SUPPORTED_EXTENSIONS: [&str; 7] = ["xlsx", "xls", "docx", "doc", "pptx", "ppt", "pdf"];

/// Signed URL lifetime: 7 days.
pub const SIGNED_URL_TTL: Duration = Duration::from_secs(604_800);

/// An attachment stored under its own key with shareable links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelocatedAttachment {
    pub filename: String,
    pub content_type: Option<String>,
    pub size: usize,
    pub storage_key: String,
    pub signed_url: String,
    pub preview_url: String,
}

/// Whether a filename has a supported extension (case-insensitive).
pub fn is_supported(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
}

/// `<prefix><millis>_<suffix>_<filename>`, with path separators in the
/// filename replaced so the key stays under `prefix`.
pub fn storage_key(prefix: &str, filename: &str, timestamp_millis: i64, suffix: &str) -> String {
    let safe_name = filename.replace(['/', '\\'], "_");
    format!("{prefix}{timestamp_millis}_{suffix}_{safe_name}")
}

/// Viewer link: base URL followed by the URL-encoded signed URL.
pub fn preview_url(base_url: &str, signed_url: &str) -> String {
    format!("{base_url}{}", urlencoding::encode(signed_url))
}

fn random_suffix() -> String {
    hex::encode(rand::random::<[u8; 8]>())
}

/// Copies supported attachments into object storage.
pub struct AttachmentRelocator {
    store: Arc<dyn ObjectStore>,
    prefix: String,
    preview_base_url: String,
}

impl AttachmentRelocator {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        prefix: impl Into<String>,
        preview_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            preview_base_url: preview_base_url.into(),
        }
    }

    /// Relocate every supported attachment into `bucket`.
    ///
    /// Attachments are processed concurrently. Unsupported ones are skipped
    /// and failed ones are logged; neither affects the others. Output order
    /// follows input order.
    pub async fn relocate_all(
        &self,
        bucket: &str,
        attachments: Vec<Attachment>,
    ) -> Vec<RelocatedAttachment> {
        if attachments.is_empty() {
            return Vec::new();
        }
        info!(count = attachments.len(), "Found attachments in email");

        let tasks = attachments.into_iter().filter_map(|attachment| {
            if is_supported(&attachment.filename) {
                Some(self.relocate(bucket, attachment))
            } else {
                info!(filename = %attachment.filename, "Skipping unsupported attachment");
                None
            }
        });

        join_all(tasks)
            .await
            .into_iter()
            .filter_map(|result| match result {
                Ok(relocated) => Some(relocated),
                Err(e) => {
                    warn!(error = %e, "Error processing attachment");
                    None
                }
            })
            .collect()
    }

    /// Upload one attachment and build its links. Consumes the bytes.
    pub async fn relocate(
        &self,
        bucket: &str,
        attachment: Attachment,
    ) -> Result<RelocatedAttachment, AttachmentError> {
        let Attachment {
            filename,
            content_type,
            size,
            content,
        } = attachment;

        let key = storage_key(
            &self.prefix,
            &filename,
            Utc::now().timestamp_millis(),
            &random_suffix(),
        );
        let upload_type = content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE);

        self.store
            .put(bucket, &key, content, upload_type)
            .await
            .map_err(|source| AttachmentError::Upload {
                filename: filename.clone(),
                source,
            })?;

        let signed_url = self
            .store
            .presign_get(bucket, &key, SIGNED_URL_TTL)
            .await
            .map_err(|source| AttachmentError::Sign {
                filename: filename.clone(),
                source,
            })?;

        let preview_url = preview_url(&self.preview_base_url, &signed_url);
        info!(filename = %filename, key = %key, "Generated preview URL");

        Ok(RelocatedAttachment {
            filename,
            content_type,
            size,
            storage_key: key,
            signed_url,
            preview_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::config::DEFAULT_PREVIEW_BASE_URL;
    use crate::error::StorageError;

    /// In-memory store; `put` fails for keys containing `fail_marker`.
    #[derive(Default)]
    struct MemoryStore {
        objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
        fail_marker: Option<&'static str>,
    }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
            self.objects
                .lock()
                .unwrap()
                .get(&format!("{bucket}/{key}"))
                .map(|(body, _)| body.clone())
                .ok_or_else(|| StorageError::NotFound {
                    bucket: bucket.into(),
                    key: key.into(),
                })
        }

        async fn put(
            &self,
            bucket: &str,
            key: &str,
            body: Vec<u8>,
            content_type: &str,
        ) -> Result<(), StorageError> {
            if self.fail_marker.is_some_and(|m| key.contains(m)) {
                return Err(StorageError::Put {
                    bucket: bucket.into(),
                    key: key.into(),
                    reason: "access denied".into(),
                });
            }
            self.objects
                .lock()
                .unwrap()
                .insert(format!("{bucket}/{key}"), (body, content_type.to_string()));
            Ok(())
        }

        async fn presign_get(
            &self,
            bucket: &str,
            key: &str,
            expires_in: Duration,
        ) -> Result<String, StorageError> {
            Ok(format!(
                "https://{bucket}.s3.test/{key}?X-Amz-Expires={}&X-Amz-Signature=abc",
                expires_in.as_secs()
            ))
        }
    }

    fn attachment(filename: &str, content_type: Option<&str>) -> Attachment {
        Attachment {
            filename: filename.to_string(),
            content_type: content_type.map(str::to_string),
            size: 3,
            content: b"abc".to_vec(),
        }
    }

    fn relocator(store: Arc<MemoryStore>) -> AttachmentRelocator {
        AttachmentRelocator::new(store, "attachments/", DEFAULT_PREVIEW_BASE_URL)
    }

    #[test]
    fn every_supported_extension_accepted() {
        for ext in SUPPORTED_EXTENSIONS {
            assert!(is_supported(&format!("file.{ext}")), "{ext} should be supported");
            assert!(
                is_supported(&format!("FILE.{}", ext.to_uppercase())),
                "{ext} uppercase should be supported"
            );
        }
    }

    #[test]
    fn unsupported_extensions_rejected() {
        for name in ["archive.zip", "photo.png", "notes.txt", "pdf", "", "report.pdf.exe"] {
            assert!(!is_supported(name), "{name} should be rejected");
        }
    }

    #[test]
    fn storage_key_layout() {
        let key = storage_key("attachments/", "経歴書.xlsx", 1_722_470_400_000, "00ff00ff00ff00ff");
        assert_eq!(key, "attachments/1722470400000_00ff00ff00ff00ff_経歴書.xlsx");
    }

    #[test]
    fn storage_key_strips_path_separators() {
        let key = storage_key("attachments/", "../etc/a.pdf", 1, "x");
        assert_eq!(key, "attachments/1_x_.._etc_a.pdf");
    }

    #[test]
    fn random_suffix_is_sixteen_hex_chars() {
        let suffix = random_suffix();
        assert_eq!(suffix.len(), 16);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn preview_url_encodes_signed_url() {
        let url = preview_url(DEFAULT_PREVIEW_BASE_URL, "https://b.s3/k.pdf?a=1&b=2");
        assert_eq!(
            url,
            "https://view.officeapps.live.com/op/view.aspx?src=https%3A%2F%2Fb.s3%2Fk.pdf%3Fa%3D1%26b%3D2"
        );
    }

    #[tokio::test]
    async fn relocate_uploads_and_signs() {
        let store = Arc::new(MemoryStore::default());
        let relocated = relocator(store.clone())
            .relocate("inbox", attachment("skills.pdf", Some("application/pdf")))
            .await
            .unwrap();

        assert!(relocated.storage_key.starts_with("attachments/"));
        assert!(relocated.storage_key.ends_with("_skills.pdf"));
        assert!(relocated.signed_url.contains("X-Amz-Expires=604800"));
        assert!(relocated.preview_url.starts_with(DEFAULT_PREVIEW_BASE_URL));
        assert_eq!(relocated.size, 3);

        let objects = store.objects.lock().unwrap();
        let (body, content_type) = &objects[&format!("inbox/{}", relocated.storage_key)];
        assert_eq!(body, b"abc");
        assert_eq!(content_type, "application/pdf");
    }

    #[tokio::test]
    async fn missing_content_type_uploaded_as_octet_stream() {
        let store = Arc::new(MemoryStore::default());
        let relocated = relocator(store.clone())
            .relocate("inbox", attachment("plan.docx", None))
            .await
            .unwrap();

        assert!(relocated.content_type.is_none());
        let objects = store.objects.lock().unwrap();
        let (_, content_type) = &objects[&format!("inbox/{}", relocated.storage_key)];
        assert_eq!(content_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn relocate_all_skips_unsupported() {
        let store = Arc::new(MemoryStore::default());
        let relocated = relocator(store)
            .relocate_all(
                "inbox",
                vec![
                    attachment("skills.pdf", Some("application/pdf")),
                    attachment("archive.zip", Some("application/zip")),
                ],
            )
            .await;

        assert_eq!(relocated.len(), 1);
        assert_eq!(relocated[0].filename, "skills.pdf");
    }

    #[tokio::test]
    async fn relocate_all_continues_after_failure() {
        let store = Arc::new(MemoryStore {
            fail_marker: Some("broken"),
            ..Default::default()
        });
        let relocated = relocator(store)
            .relocate_all(
                "inbox",
                vec![
                    attachment("broken.xlsx", None),
                    attachment("a.pptx", None),
                    attachment("b.doc", None),
                ],
            )
            .await;

        let names: Vec<&str> = relocated.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["a.pptx", "b.doc"]);
    }

    #[tokio::test]
    async fn relocate_all_empty_input() {
        let store = Arc::new(MemoryStore::default());
        assert!(relocator(store).relocate_all("inbox", vec![]).await.is_empty());
    }

    #[test]
    fn serializes_camel_case() {
        let relocated = RelocatedAttachment {
            filename: "a.pdf".into(),
            content_type: Some("application/pdf".into()),
            size: 1,
            storage_key: "k".into(),
            signed_url: "s".into(),
            preview_url: "p".into(),
        };
        let json = serde_json::to_value(&relocated).unwrap();
        assert_eq!(json["previewUrl"], "p");
        assert_eq!(json["storageKey"], "k");
    }
}
