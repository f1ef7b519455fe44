//! Preview and transfer service
//!
//! Read/write passthrough with content-type branching. Text-like objects
//! are fetched and decoded in full; everything else gets a time-limited
//! signed URL so large binary payloads never proxy through the engine.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::path::{content_type_hint, normalize_folder_path};
use crate::store::StorageClient;

/// Extensions previewed inline as text
const TEXT_PREVIEW_EXTENSIONS: &[&str] = &[
    "txt", "json", "js", "css", "xml", "md", "markdown", "yaml", "yml", "ini", "csv", "log",
];

/// How long a media preview URL stays valid
const PREVIEW_URL_TTL: Duration = Duration::from_secs(3600);

/// A preview payload ready for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Preview {
    /// Full decoded body of a text-like object
    Text { content: String },
    /// Signed URL for out-of-band access to a binary object
    SignedMedia { content_type: String, url: String },
}

/// Whether a key's extension is on the inline-text allow-list
pub fn is_text_key(key: &str) -> bool {
    TEXT_PREVIEW_EXTENSIONS.contains(&content_type_hint(key).as_str())
}

/// Preview an object.
///
/// Text-like keys are fetched and decoded (invalid UTF-8 replaced rather
/// than rejected); all other keys yield a signed URL valid for one hour.
pub async fn preview(store: &dyn StorageClient, bucket: &str, key: &str) -> Result<Preview> {
    if is_text_key(key) {
        let fetched = store.get_object(bucket, key).await?;
        tracing::debug!(bucket, key, bytes = fetched.data.len(), "previewing as text");
        return Ok(Preview::Text {
            content: String::from_utf8_lossy(&fetched.data).into_owned(),
        });
    }

    let url = store.signed_url(bucket, key, PREVIEW_URL_TTL).await?;
    tracing::debug!(bucket, key, "issued preview URL");
    Ok(Preview::SignedMedia {
        content_type: content_type_hint(key),
        url,
    })
}

/// Upload a local file to a key, streaming through the transport
pub async fn upload(
    store: &dyn StorageClient,
    bucket: &str,
    key: &str,
    local: &Path,
    content_type: Option<&str>,
) -> Result<()> {
    store.upload_file(bucket, key, local, content_type).await?;
    tracing::info!(bucket, key, path = %local.display(), "uploaded file");
    Ok(())
}

/// Download an object to a local file, streaming through the transport
pub async fn download(
    store: &dyn StorageClient,
    bucket: &str,
    key: &str,
    dest: &Path,
) -> Result<()> {
    store.download_file(bucket, key, dest).await?;
    tracing::info!(bucket, key, path = %dest.display(), "downloaded object");
    Ok(())
}

/// Create a folder: an empty marker object at the normalized folder key
pub async fn create_folder(store: &dyn StorageClient, bucket: &str, path: &str) -> Result<()> {
    let key = normalize_folder_path(path);
    store.put_object(bucket, &key, Vec::new(), None).await?;
    tracing::info!(bucket, key, "created folder marker");
    Ok(())
}
