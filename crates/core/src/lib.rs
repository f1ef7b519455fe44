//! cask-core: backend-independent engine for browsing S3-compatible
//! object storage
//!
//! This crate provides:
//! - The `StorageClient` capability trait every backend implements
//! - Key/prefix translation between the flat namespace and the folder tree
//! - The listing service that builds one navigable level
//! - The bulk delete orchestrator (paginated, best-effort, cancellable)
//! - The preview/transfer service
//! - Connection records and the TOML-backed connection registry
//!
//! It is independent of any specific storage SDK; the adapters live in
//! their own crates and sessions are assembled in cask-engine.

pub mod config;
pub mod connection;
pub mod delete;
pub mod error;
pub mod listing;
pub mod path;
pub mod store;
pub mod transfer;

pub use config::{Config, ConfigManager};
pub use connection::{BackendKind, Connection, ConnectionRegistry, ConnectionStore};
pub use delete::{CancelFlag, DeleteReport, SelectionItem};
pub use error::{Error, Result};
pub use listing::{Listing, ObjectEntry};
pub use path::Breadcrumb;
pub use store::{
    BatchOutcome, BucketInfo, DeleteError, FetchedObject, ListOptions, ListPage, RemoteObject,
    StorageClient, MAX_DELETE_BATCH,
};
pub use transfer::Preview;
