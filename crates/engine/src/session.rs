//! Browsing session
//!
//! The caller-facing context value: one resolved connection, one client
//! handle, and the current navigation cursor (bucket + prefix). All state
//! is explicit on the session, so multiple sessions coexist without
//! cross-contamination and tests inject fake backends directly.

use std::path::Path;
use std::sync::Arc;

use cask_core::{
    delete, listing, path, transfer, CancelFlag, Connection, ConnectionStore, DeleteReport,
    Error, Listing, Preview, Result, SelectionItem, StorageClient,
};

use crate::resolver;

/// An open browsing session against one connection
pub struct Session {
    connection: Connection,
    client: Arc<dyn StorageClient>,
    bucket: Option<String>,
    prefix: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("connection", &self.connection)
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Open a session: resolve the connection once and seed the cursor
    /// from its default bucket and prefix.
    pub async fn open(store: &dyn ConnectionStore, connection_id: &str) -> Result<Self> {
        let (connection, client) = resolver::resolve(store, connection_id).await?;
        Ok(Self::with_client(connection, client))
    }

    /// Build a session over an already-resolved client.
    ///
    /// This is the seam tests and alternative resolvers use.
    pub fn with_client(connection: Connection, client: Arc<dyn StorageClient>) -> Self {
        let bucket = connection.default_bucket.clone();
        let prefix = connection.default_prefix.clone();
        Self {
            connection,
            client,
            bucket,
            prefix,
        }
    }

    /// The connection this session browses
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Currently selected bucket, if any
    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }

    /// Current prefix within the bucket
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Breadcrumb trail for the current prefix
    pub fn breadcrumbs(&self) -> Vec<path::Breadcrumb> {
        path::split_breadcrumb(&self.prefix)
    }

    /// Navigate to a bucket and prefix and list that level.
    ///
    /// `bucket: None` falls back to the connection's default bucket; with
    /// no default either, the account's buckets are the top level. The
    /// cursor moves only when the listing succeeds.
    pub async fn navigate(&mut self, bucket: Option<&str>, prefix: &str) -> Result<Listing> {
        let target = bucket
            .map(|b| b.to_string())
            .or_else(|| self.connection.default_bucket.clone());

        let result = listing::list(self.client.as_ref(), target.as_deref(), prefix).await?;

        self.bucket = target;
        self.prefix = prefix.to_string();
        Ok(result)
    }

    /// Delete a selection of files and folders under the current bucket.
    ///
    /// Folder deletion is unbounded and irreversible, so any selection
    /// containing a folder requires `confirmed` to be set; the UI obtains
    /// that through its typed confirmation dialog before calling in.
    pub async fn delete_selection(
        &self,
        items: &[SelectionItem],
        confirmed: bool,
        cancel: &CancelFlag,
    ) -> Result<DeleteReport> {
        let bucket = self.require_bucket()?;

        if !confirmed && items.iter().any(|item| item.is_folder) {
            return Err(Error::ConfirmationRequired(
                "selection contains folders; folder deletion must be explicitly confirmed".into(),
            ));
        }

        let report = delete::delete_selection(self.client.as_ref(), bucket, items, cancel).await;
        tracing::info!(bucket, summary = %report.summary(), "selection delete finished");
        Ok(report)
    }

    /// Upload a local file to a key under the current bucket
    pub async fn upload_file(&self, local: &Path, key: &str) -> Result<()> {
        let bucket = self.require_bucket()?;
        let content_type = mime_guess::from_path(local).first_raw();
        transfer::upload(self.client.as_ref(), bucket, key, local, content_type).await
    }

    /// Download an object from the current bucket to a local file
    pub async fn download_file(&self, key: &str, dest: &Path) -> Result<()> {
        let bucket = self.require_bucket()?;
        transfer::download(self.client.as_ref(), bucket, key, dest).await
    }

    /// Preview an object: inline text or a time-limited signed URL
    pub async fn preview_file(&self, key: &str) -> Result<Preview> {
        let bucket = self.require_bucket()?;
        transfer::preview(self.client.as_ref(), bucket, key).await
    }

    /// Create a folder marker under the current bucket
    pub async fn create_folder(&self, folder_path: &str) -> Result<()> {
        let bucket = self.require_bucket()?;
        transfer::create_folder(self.client.as_ref(), bucket, folder_path).await
    }

    fn require_bucket(&self) -> Result<&str> {
        self.bucket
            .as_deref()
            .ok_or_else(|| Error::InvalidArgument("no bucket selected".into()))
    }
}
