//! Listing service
//!
//! Turns one backend listing page into the view the browser renders: common
//! prefixes become synthetic folder entries, objects are annotated with a
//! content-type hint and display size, and the "current directory" marker
//! is filtered out of its own listing.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::path;
use crate::store::{BucketInfo, ListOptions, RemoteObject, StorageClient};

/// Storage class reported when the backend omits one
const DEFAULT_STORAGE_CLASS: &str = "STANDARD";

/// A display-ready entry in an object listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// Full object key; folder keys end in `/`
    pub key: String,

    /// Whether this is a synthetic folder entry
    pub is_folder: bool,

    /// Size in bytes; 0 for folders
    pub size: u64,

    /// Human-readable size
    pub size_human: String,

    /// Last modified timestamp; None for folders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<jiff::Timestamp>,

    /// Content-type label derived from the key extension
    pub content_type: String,

    /// Storage class
    pub storage_class: String,

    /// ETag with quotes stripped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Owner display name, when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl ObjectEntry {
    /// Synthetic folder entry for a common prefix
    pub fn folder(key: impl Into<String>) -> Self {
        let key = key.into();
        debug_assert!(key.ends_with('/'), "folder keys must end in '/'");
        Self {
            key,
            is_folder: true,
            size: 0,
            size_human: humansize::format_size(0u64, humansize::BINARY),
            last_modified: None,
            content_type: "folder".to_string(),
            storage_class: String::new(),
            etag: None,
            owner: None,
        }
    }

    /// Concrete file entry annotated from a raw listing record
    pub fn file(obj: RemoteObject) -> Self {
        Self {
            size_human: humansize::format_size(obj.size, humansize::BINARY),
            content_type: path::content_type_hint(&obj.key),
            storage_class: obj
                .storage_class
                .unwrap_or_else(|| DEFAULT_STORAGE_CLASS.to_string()),
            key: obj.key,
            is_folder: false,
            size: obj.size,
            last_modified: obj.last_modified,
            etag: obj.etag,
            owner: obj.owner,
        }
    }

    /// Display name for this entry
    pub fn display_name(&self) -> String {
        path::leaf_name(&self.key, self.is_folder)
    }
}

/// One level of the browsable tree: either the account's buckets or the
/// entries under a `(bucket, prefix)` pair.
///
/// Serializes as a tagged `{type, data}` payload, the shape the
/// presentation layer consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Listing {
    /// Top level, before a bucket is selected
    Buckets(Vec<BucketInfo>),
    /// Entries under one bucket and prefix
    Objects(Vec<ObjectEntry>),
}

impl Listing {
    /// Number of entries in this listing
    pub fn len(&self) -> usize {
        match self {
            Listing::Buckets(buckets) => buckets.len(),
            Listing::Objects(entries) => entries.len(),
        }
    }

    /// Whether this listing is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// List one navigable level.
///
/// No bucket selected means the account's buckets are the top level.
/// Otherwise a single delimiter-grouped page is fetched: the UI paginates
/// by navigating further, not by scrolling one giant listing. Folders come
/// before files as produced by the backend, and the entry whose key equals
/// the queried prefix (the folder's own marker object) is dropped.
pub async fn list(
    store: &dyn StorageClient,
    bucket: Option<&str>,
    prefix: &str,
) -> Result<Listing> {
    let Some(bucket) = bucket else {
        let buckets = store.list_buckets().await?;
        tracing::debug!(count = buckets.len(), "listed buckets");
        return Ok(Listing::Buckets(buckets));
    };

    let page = store
        .list_objects(bucket, prefix, &ListOptions::one_level())
        .await?;

    let mut entries: Vec<ObjectEntry> = Vec::with_capacity(page.prefixes.len() + page.objects.len());
    entries.extend(page.prefixes.into_iter().map(ObjectEntry::folder));
    entries.extend(page.objects.into_iter().map(ObjectEntry::file));
    entries.retain(|entry| entry.key != prefix);

    tracing::debug!(bucket, prefix, count = entries.len(), "listed objects");
    Ok(Listing::Objects(entries))
}
