//! Bulk delete orchestrator
//!
//! Deletes a single object, a folder (prefix) and everything beneath it, or
//! a mixed selection of both. Folder traversal is an explicit iterative
//! loop over continuation tokens: page N+1 is not fetched until page N's
//! batch delete has completed, so at most one page of keys is held in
//! memory and progress on partial failure is easy to reason about.
//!
//! Per-key failures never abort a traversal; they are accumulated and
//! returned in full. Transport and credential failures do abort the
//! traversal they occur in, but a multi-key selection isolates its items,
//! so one failed folder does not stop the rest of the selection.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::path::normalize_folder_path;
use crate::store::{BatchOutcome, DeleteError, ListOptions, StorageClient, MAX_DELETE_BATCH};

/// Reason code recorded for keys a backend neither deleted nor rejected.
///
/// A delete report that silently drops a key would otherwise be
/// undercounted without any signal to the caller.
pub const UNREPORTED_CODE: &str = "Unreported";

/// Cooperative cancellation flag for long-running traversals.
///
/// Checked between pages, never mid-batch. A cancelled deletion is not
/// rolled back; the report says how far it got.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a flag in the not-cancelled state
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One item of a user selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionItem {
    /// Selected key; folders end in `/` (normalized before use regardless)
    pub key: String,

    /// Whether the item is a folder
    pub is_folder: bool,
}

impl SelectionItem {
    /// A selected file
    pub fn file(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            is_folder: false,
        }
    }

    /// A selected folder
    pub fn folder(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            is_folder: true,
        }
    }
}

/// Accumulated outcome of a bulk deletion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteReport {
    /// Objects confirmed deleted
    pub deleted: u64,

    /// Every per-key failure, across all pages and selection items
    pub errors: Vec<DeleteError>,

    /// Whether the traversal stopped early on a cancellation request
    pub cancelled: bool,
}

impl DeleteReport {
    /// Fold one batch outcome into the report, cross-checking the backend's
    /// answer against the keys that were actually requested.
    fn absorb_batch(&mut self, requested: &[String], outcome: BatchOutcome) {
        let mut accounted: HashSet<String> = HashSet::with_capacity(requested.len());

        self.deleted += outcome.deleted.len() as u64;
        for key in &outcome.deleted {
            accounted.insert(key.clone());
        }
        for err in &outcome.errors {
            accounted.insert(err.key.clone());
        }
        self.errors.extend(outcome.errors);

        for key in requested {
            if !accounted.contains(key.as_str()) {
                self.errors.push(
                    DeleteError::new(key.clone(), UNREPORTED_CODE)
                        .with_message("backend reported neither deletion nor error for this key"),
                );
            }
        }
    }

    /// Merge another report into this one
    pub fn merge(&mut self, other: DeleteReport) {
        self.deleted += other.deleted;
        self.errors.extend(other.errors);
        self.cancelled |= other.cancelled;
    }

    /// Human-readable one-line summary
    pub fn summary(&self) -> String {
        match (self.errors.len(), self.cancelled) {
            (0, false) => format!("{} object(s) deleted.", self.deleted),
            (0, true) => format!("{} object(s) deleted before cancellation.", self.deleted),
            (n, false) => format!("{} object(s) deleted, {n} failed.", self.deleted),
            (n, true) => format!(
                "{} object(s) deleted, {n} failed, cancelled before completion.",
                self.deleted
            ),
        }
    }

    /// Convert into a `Result` for callers that want `?` semantics: a
    /// report with errors becomes [`Error::PartialBatchFailure`].
    pub fn into_result(self) -> Result<DeleteReport> {
        if self.errors.is_empty() {
            Ok(self)
        } else {
            Err(Error::PartialBatchFailure {
                errors: self.errors,
            })
        }
    }
}

/// Delete a single object. Success or failure is reported directly.
pub async fn delete_key(store: &dyn StorageClient, bucket: &str, key: &str) -> Result<()> {
    store.delete_object(bucket, key).await?;
    tracing::debug!(bucket, key, "deleted object");
    Ok(())
}

/// Delete a folder: every object under the prefix, then the folder marker.
///
/// The prefix is normalized to end in `/` first. Arbitrarily large folders
/// are handled by the pagination loop; the object count is never assumed
/// bounded. The marker delete at exactly the normalized prefix runs after
/// all pages are exhausted, and its `NotFound` is ignored since not every
/// backend materializes a marker.
pub async fn delete_prefix(
    store: &dyn StorageClient,
    bucket: &str,
    prefix: &str,
    cancel: &CancelFlag,
) -> Result<DeleteReport> {
    let folder_key = normalize_folder_path(prefix);
    if folder_key.is_empty() || folder_key == "/" {
        return Err(Error::InvalidPath(format!(
            "refusing to bulk-delete the bucket root (prefix {prefix:?})"
        )));
    }

    let mut report = DeleteReport::default();
    let mut token: Option<String> = None;

    loop {
        if cancel.is_cancelled() {
            tracing::info!(bucket, prefix = %folder_key, "folder delete cancelled between pages");
            report.cancelled = true;
            return Ok(report);
        }

        let page = store
            .list_objects(bucket, &folder_key, &ListOptions::recursive(token.take()))
            .await?;

        let keys: Vec<String> = page.objects.into_iter().map(|o| o.key).collect();
        tracing::debug!(bucket, prefix = %folder_key, count = keys.len(), "delete page listed");

        for chunk in keys.chunks(MAX_DELETE_BATCH) {
            let requested = chunk.to_vec();
            let outcome = store.delete_objects(bucket, requested.clone()).await?;
            if !outcome.errors.is_empty() {
                tracing::warn!(
                    bucket,
                    prefix = %folder_key,
                    failed = outcome.errors.len(),
                    "batch delete reported per-key failures"
                );
            }
            report.absorb_batch(&requested, outcome);
        }

        match page.next_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }

    // The marker itself, once the folder is empty.
    match store.delete_object(bucket, &folder_key).await {
        Ok(()) => {}
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e),
    }

    tracing::info!(bucket, prefix = %folder_key, deleted = report.deleted, "folder delete finished");
    Ok(report)
}

/// Delete a mixed selection of files and folders.
///
/// Items are processed independently and sequentially; a failure on one
/// item is recorded against its key and the rest still run. Callers are
/// expected to have gated folder deletions behind an explicit confirmation
/// before invoking this.
pub async fn delete_selection(
    store: &dyn StorageClient,
    bucket: &str,
    items: &[SelectionItem],
    cancel: &CancelFlag,
) -> DeleteReport {
    let mut report = DeleteReport::default();

    for item in items {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }

        if item.is_folder {
            match delete_prefix(store, bucket, &item.key, cancel).await {
                Ok(sub) => report.merge(sub),
                Err(e) => {
                    tracing::warn!(bucket, key = %item.key, error = %e, "folder delete failed");
                    report.errors.push(
                        DeleteError::new(item.key.clone(), reason_code(&e))
                            .with_message(e.to_string()),
                    );
                }
            }
        } else {
            match delete_key(store, bucket, &item.key).await {
                Ok(()) => report.deleted += 1,
                Err(e) => {
                    tracing::warn!(bucket, key = %item.key, error = %e, "object delete failed");
                    report.errors.push(
                        DeleteError::new(item.key.clone(), reason_code(&e))
                            .with_message(e.to_string()),
                    );
                }
            }
        }
    }

    report
}

/// Stable reason code for an error recorded against a selection item
fn reason_code(error: &Error) -> &'static str {
    match error {
        Error::Auth(_) => "AuthError",
        Error::Network(_) => "NetworkError",
        Error::NotFound(_) => "NotFound",
        Error::InvalidArgument(_) => "InvalidArgument",
        Error::InvalidPath(_) => "InvalidPath",
        _ => "Error",
    }
}
