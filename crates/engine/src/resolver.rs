//! Connection resolution
//!
//! Turns a connection id into a live, configured StorageClient handle.
//! The backend family recorded on the connection decides which adapter is
//! constructed; callers only ever see the capability trait.

use std::sync::Arc;

use cask_core::{BackendKind, Connection, ConnectionStore, Result, StorageClient};
use cask_s3::S3Client;

/// Resolve a connection id into its record and a configured client.
///
/// Stateless: each call reconstructs the client, which is cheap. Sessions
/// resolve once and reuse the handle for their lifetime.
pub async fn resolve(
    store: &dyn ConnectionStore,
    connection_id: &str,
) -> Result<(Connection, Arc<dyn StorageClient>)> {
    let connection = store.get(connection_id)?;
    tracing::debug!(
        id = %connection.id,
        endpoint = %connection.endpoint,
        backend = ?connection.backend,
        "resolved connection"
    );

    let client: Arc<dyn StorageClient> = match connection.backend {
        BackendKind::S3 => Arc::new(S3Client::connect(&connection).await?),
    };

    Ok((connection, client))
}
