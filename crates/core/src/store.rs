//! StorageClient trait definition
//!
//! The capability set every storage backend implements. The rest of the
//! engine depends only on this trait, never on a specific SDK's request or
//! response shapes; concrete backends are chosen at connection-resolution
//! time.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Maximum number of keys a single batch delete request may carry.
///
/// S3's DeleteObjects limit. Callers chunk to this size; backends reject
/// oversized batches with `InvalidArgument` before touching the network.
pub const MAX_DELETE_BATCH: usize = 1000;

/// A bucket as reported by the account-level listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketInfo {
    /// Bucket name
    pub name: String,

    /// Creation timestamp, when the backend reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<jiff::Timestamp>,
}

/// A raw object record as returned by a backend listing page.
///
/// Carries only what the wire listing reports; the listing service
/// annotates these into display-ready [`crate::listing::Listing`] entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteObject {
    /// Full object key
    pub key: String,

    /// Size in bytes
    pub size: u64,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<jiff::Timestamp>,

    /// Storage class, when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,

    /// ETag with quotes stripped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Owner display name, when the backend includes it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl RemoteObject {
    /// Create a record with just key and size, the fields every backend has
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
            last_modified: None,
            storage_class: None,
            etag: None,
            owner: None,
        }
    }
}

/// One page of a listing call
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Common prefixes grouped by the delimiter (one folder level each)
    pub prefixes: Vec<String>,

    /// Objects on this page
    pub objects: Vec<RemoteObject>,

    /// Continuation token for the next page, if the listing was truncated
    pub next_token: Option<String>,
}

/// Options for a single listing call
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Delimiter for grouping keys into common prefixes. `None` disables
    /// grouping entirely: the page walks every key under the prefix.
    pub delimiter: Option<String>,

    /// Continuation token from the previous page
    pub continuation_token: Option<String>,

    /// Maximum number of keys per page
    pub max_keys: Option<i32>,
}

impl ListOptions {
    /// Options for one browsable directory level
    pub fn one_level() -> Self {
        Self {
            delimiter: Some("/".to_string()),
            ..Default::default()
        }
    }

    /// Options for a full recursive walk, resuming from `token`
    pub fn recursive(token: Option<String>) -> Self {
        Self {
            delimiter: None,
            continuation_token: token,
            ..Default::default()
        }
    }
}

/// An object body fetched in full, for preview of small payloads
#[derive(Debug, Clone)]
pub struct FetchedObject {
    /// Raw bytes
    pub data: Vec<u8>,

    /// Content type as stored, when the backend reports one
    pub content_type: Option<String>,

    /// Content length in bytes
    pub content_length: u64,
}

/// A single key's failure within a batch delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteError {
    /// Key that could not be deleted
    pub key: String,

    /// Backend reason code, e.g. "AccessDenied"
    pub code: String,

    /// Human-readable detail, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DeleteError {
    /// Create an error entry from key and reason code
    pub fn new(key: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            code: code.into(),
            message: None,
        }
    }

    /// Attach a human-readable message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Outcome of one batch delete request: which keys the backend reported
/// deleted, and which it rejected
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Keys the backend confirmed deleted
    pub deleted: Vec<String>,

    /// Per-key failures
    pub errors: Vec<DeleteError>,
}

/// Capability set for S3-compatible storage backends
///
/// Implemented by the S3 adapter; mocked for service tests. Handles are not
/// required to be safe for concurrent use beyond what the backing SDK
/// guarantees; the engine uses one handle sequentially per session.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// List the account's buckets
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>>;

    /// List one page of objects under a prefix. Does not recurse; callers
    /// follow `next_token` for further pages.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        options: &ListOptions,
    ) -> Result<ListPage>;

    /// Fetch an object body in full
    async fn get_object(&self, bucket: &str, key: &str) -> Result<FetchedObject>;

    /// Write an object, overwriting any existing one at the same key
    async fn put_object<'a>(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: Option<&'a str>,
    ) -> Result<()>;

    /// Upload a local file, streaming it through the transport
    async fn upload_file<'a>(
        &self,
        bucket: &str,
        key: &str,
        local: &Path,
        content_type: Option<&'a str>,
    ) -> Result<()>;

    /// Download an object to a local file, streaming it through the
    /// transport
    async fn download_file(&self, bucket: &str, key: &str, dest: &Path) -> Result<()>;

    /// Delete a single object
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;

    /// Delete up to [`MAX_DELETE_BATCH`] objects in one request.
    ///
    /// Fails with `InvalidArgument` when given more; callers pre-chunk.
    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<BatchOutcome>;

    /// Issue a time-limited signed URL for out-of-band reads
    async fn signed_url(&self, bucket: &str, key: &str, ttl: Duration) -> Result<String>;
}

impl std::fmt::Debug for dyn StorageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn StorageClient")
    }
}
