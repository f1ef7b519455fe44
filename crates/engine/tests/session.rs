//! Session-level tests against an in-memory backend
//!
//! Exercises the full inbound surface (navigate, delete selection, upload,
//! download, preview, create folder) without a live store.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cask_core::{
    BatchOutcome, BucketInfo, CancelFlag, Connection, ConnectionStore, DeleteError, Error,
    FetchedObject, ListOptions, ListPage, Listing, Preview, RemoteObject, Result, SelectionItem,
    StorageClient, MAX_DELETE_BATCH,
};
use cask_engine::Session;

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(EnvFilter::from_default_env())
        .try_init();
}

/// In-memory S3-alike: buckets of key -> bytes, with delimiter grouping
/// and continuation-token paging.
#[derive(Default)]
struct InMemoryBackend {
    buckets: Mutex<BTreeMap<String, BTreeMap<String, Vec<u8>>>>,
    page_size: usize,
}

impl InMemoryBackend {
    fn new(page_size: usize) -> Self {
        Self {
            buckets: Mutex::new(BTreeMap::new()),
            page_size,
        }
    }

    fn seed(&self, bucket: &str, objects: &[(&str, &[u8])]) {
        let mut buckets = self.buckets.lock().unwrap();
        let entry = buckets.entry(bucket.to_string()).or_default();
        for (key, data) in objects {
            entry.insert(key.to_string(), data.to_vec());
        }
    }

    fn object_count(&self, bucket: &str) -> usize {
        self.buckets
            .lock()
            .unwrap()
            .get(bucket)
            .map(|b| b.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl StorageClient for InMemoryBackend {
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>> {
        Ok(self
            .buckets
            .lock()
            .unwrap()
            .keys()
            .map(|name| BucketInfo {
                name: name.clone(),
                created: None,
            })
            .collect())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        options: &ListOptions,
    ) -> Result<ListPage> {
        let buckets = self.buckets.lock().unwrap();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| Error::NotFound(format!("bucket {bucket}")))?;

        let after = options.continuation_token.as_deref().unwrap_or("");
        let mut prefixes: Vec<String> = Vec::new();
        let mut page: Vec<RemoteObject> = Vec::new();
        let mut next_token = None;

        for (key, data) in objects.iter() {
            if !key.starts_with(prefix) || key.as_str() <= after {
                continue;
            }

            if let Some(delimiter) = &options.delimiter {
                let remainder = &key[prefix.len()..];
                if let Some(pos) = remainder.find(delimiter.as_str()) {
                    let group = format!("{prefix}{}{delimiter}", &remainder[..pos]);
                    if !prefixes.contains(&group) {
                        prefixes.push(group);
                    }
                    continue;
                }
            }

            if page.len() == self.page_size {
                next_token = Some(page.last().unwrap().key.clone());
                break;
            }
            page.push(RemoteObject::new(key.clone(), data.len() as u64));
        }

        Ok(ListPage {
            prefixes,
            objects: page,
            next_token,
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<FetchedObject> {
        let buckets = self.buckets.lock().unwrap();
        let data = buckets
            .get(bucket)
            .and_then(|b| b.get(key))
            .ok_or_else(|| Error::NotFound(format!("{bucket}/{key}")))?
            .clone();

        Ok(FetchedObject {
            content_length: data.len() as u64,
            content_type: None,
            data,
        })
    }

    async fn put_object<'a>(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        _content_type: Option<&'a str>,
    ) -> Result<()> {
        self.buckets
            .lock()
            .unwrap()
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), data);
        Ok(())
    }

    async fn upload_file<'a>(
        &self,
        bucket: &str,
        key: &str,
        local: &Path,
        content_type: Option<&'a str>,
    ) -> Result<()> {
        let data = tokio::fs::read(local).await?;
        self.put_object(bucket, key, data, content_type).await
    }

    async fn download_file(&self, bucket: &str, key: &str, dest: &Path) -> Result<()> {
        let fetched = self.get_object(bucket, key).await?;
        tokio::fs::write(dest, fetched.data).await?;
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let mut buckets = self.buckets.lock().unwrap();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| Error::NotFound(format!("bucket {bucket}")))?;
        objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("{bucket}/{key}")))
    }

    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<BatchOutcome> {
        if keys.len() > MAX_DELETE_BATCH {
            return Err(Error::InvalidArgument("batch too large".into()));
        }

        let mut buckets = self.buckets.lock().unwrap();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| Error::NotFound(format!("bucket {bucket}")))?;

        let mut outcome = BatchOutcome::default();
        for key in keys {
            match objects.remove(&key) {
                Some(_) => outcome.deleted.push(key),
                None => outcome
                    .errors
                    .push(DeleteError::new(key, "NoSuchKey")),
            }
        }
        Ok(outcome)
    }

    async fn signed_url(&self, bucket: &str, key: &str, ttl: Duration) -> Result<String> {
        Ok(format!(
            "https://signed.test/{bucket}/{key}?expires={}",
            ttl.as_secs()
        ))
    }
}

/// Connection store backed by a plain vector
struct MemConnections(Vec<Connection>);

impl ConnectionStore for MemConnections {
    fn get(&self, id: &str) -> Result<Connection> {
        self.0
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| Error::ConnectionNotFound(id.to_string()))
    }

    fn list(&self) -> Result<Vec<Connection>> {
        Ok(self.0.clone())
    }
}

fn connection() -> Connection {
    Connection::new("c1", "lab", "http://localhost:9000", "admin", "secret")
}

fn session_over(backend: Arc<InMemoryBackend>, conn: Connection) -> Session {
    Session::with_client(conn, backend)
}

#[tokio::test]
async fn test_navigate_without_bucket_lists_buckets() {
    init_tracing();
    let backend = Arc::new(InMemoryBackend::new(100));
    backend.seed("docs", &[("readme.txt", b"hi")]);
    backend.seed("media", &[]);

    let mut session = session_over(backend, connection());
    let listing = session.navigate(None, "").await.unwrap();

    let Listing::Buckets(buckets) = listing else {
        panic!("expected bucket listing");
    };
    assert_eq!(buckets.len(), 2);
    assert!(session.bucket().is_none());
}

#[tokio::test]
async fn test_navigate_merges_folders_and_filters_marker() {
    init_tracing();
    let backend = Arc::new(InMemoryBackend::new(100));
    backend.seed(
        "docs",
        &[
            ("archive/", b"" as &[u8]),
            ("archive/old.txt", b"old"),
            ("readme.txt", b"hello world!"),
        ],
    );

    let mut session = session_over(backend, connection());
    let listing = session.navigate(Some("docs"), "").await.unwrap();

    let Listing::Objects(entries) = listing else {
        panic!("expected object listing");
    };
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].key, "archive/");
    assert!(entries[0].is_folder);
    assert_eq!(entries[0].size, 0);
    assert_eq!(entries[1].key, "readme.txt");
    assert_eq!(entries[1].size, 12);
    assert_eq!(entries[1].content_type, "txt");

    assert_eq!(session.bucket(), Some("docs"));

    // Descend into the folder: its own marker must not list itself.
    let listing = session.navigate(Some("docs"), "archive/").await.unwrap();
    let Listing::Objects(entries) = listing else {
        panic!("expected object listing");
    };
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].key, "archive/old.txt");

    let crumbs = session.breadcrumbs();
    assert_eq!(crumbs.len(), 1);
    assert_eq!(crumbs[0].name, "archive");
}

#[tokio::test]
async fn test_navigate_falls_back_to_default_bucket() {
    init_tracing();
    let backend = Arc::new(InMemoryBackend::new(100));
    backend.seed("docs", &[("readme.txt", b"hi")]);

    let mut conn = connection();
    conn.default_bucket = Some("docs".into());

    let mut session = session_over(backend, conn);
    let listing = session.navigate(None, "").await.unwrap();

    assert!(matches!(listing, Listing::Objects(_)));
    assert_eq!(session.bucket(), Some("docs"));
}

#[tokio::test]
async fn test_delete_selection_requires_confirmation_for_folders() {
    init_tracing();
    let backend = Arc::new(InMemoryBackend::new(100));
    backend.seed("docs", &[("archive/a.txt", b"a"), ("b.txt", b"b")]);

    let mut session = session_over(backend.clone(), connection());
    session.navigate(Some("docs"), "").await.unwrap();

    let items = vec![
        SelectionItem::file("b.txt"),
        SelectionItem::folder("archive/"),
    ];
    let result = session
        .delete_selection(&items, false, &CancelFlag::new())
        .await;

    assert!(matches!(
        result.unwrap_err(),
        Error::ConfirmationRequired(_)
    ));
    // Nothing was deleted, not even the plain file.
    assert_eq!(backend.object_count("docs"), 2);
}

#[tokio::test]
async fn test_delete_selection_files_need_no_confirmation() {
    init_tracing();
    let backend = Arc::new(InMemoryBackend::new(100));
    backend.seed("docs", &[("a.txt", b"a")]);

    let mut session = session_over(backend.clone(), connection());
    session.navigate(Some("docs"), "").await.unwrap();

    let report = session
        .delete_selection(&[SelectionItem::file("a.txt")], false, &CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(report.deleted, 1);
    assert_eq!(backend.object_count("docs"), 0);
}

#[tokio::test]
async fn test_delete_mixed_selection_deletes_all_objects() {
    init_tracing();
    // {file a, folder b with 5 children, file c} across two listing pages.
    let backend = Arc::new(InMemoryBackend::new(3));
    backend.seed(
        "docs",
        &[
            ("a.txt", b"" as &[u8]),
            ("b/1.txt", b""),
            ("b/2.txt", b""),
            ("b/3.txt", b""),
            ("b/4.txt", b""),
            ("b/5.txt", b""),
            ("c.txt", b""),
        ],
    );

    let mut session = session_over(backend.clone(), connection());
    session.navigate(Some("docs"), "").await.unwrap();

    let items = vec![
        SelectionItem::file("a.txt"),
        SelectionItem::folder("b/"),
        SelectionItem::file("c.txt"),
    ];
    let report = session
        .delete_selection(&items, true, &CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(report.deleted, 7);
    assert!(report.errors.is_empty());
    assert_eq!(backend.object_count("docs"), 0);
}

#[tokio::test]
async fn test_delete_selection_without_bucket() {
    init_tracing();
    let backend = Arc::new(InMemoryBackend::new(100));
    let session = session_over(backend, connection());

    let result = session
        .delete_selection(&[SelectionItem::file("a.txt")], true, &CancelFlag::new())
        .await;
    assert!(matches!(result.unwrap_err(), Error::InvalidArgument(_)));
}

#[tokio::test]
async fn test_upload_download_round_trip() {
    init_tracing();
    let backend = Arc::new(InMemoryBackend::new(100));
    backend.seed("docs", &[]);

    let mut session = session_over(backend.clone(), connection());
    session.navigate(Some("docs"), "").await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("report.csv");
    std::fs::write(&source, b"a,b\n1,2\n").unwrap();

    session.upload_file(&source, "reports/report.csv").await.unwrap();
    assert_eq!(backend.object_count("docs"), 1);

    let dest = dir.path().join("downloaded.csv");
    session.download_file("reports/report.csv", &dest).await.unwrap();
    assert_eq!(std::fs::read(&dest).unwrap(), b"a,b\n1,2\n");
}

#[tokio::test]
async fn test_preview_branches_on_extension() {
    init_tracing();
    let backend = Arc::new(InMemoryBackend::new(100));
    backend.seed(
        "docs",
        &[("notes.txt", b"plain text" as &[u8]), ("photo.png", b"\x89PNG")],
    );

    let mut session = session_over(backend, connection());
    session.navigate(Some("docs"), "").await.unwrap();

    match session.preview_file("notes.txt").await.unwrap() {
        Preview::Text { content } => assert_eq!(content, "plain text"),
        Preview::SignedMedia { .. } => panic!("expected text preview"),
    }

    match session.preview_file("photo.png").await.unwrap() {
        Preview::SignedMedia { content_type, url } => {
            assert_eq!(content_type, "png");
            assert!(url.contains("photo.png"));
            assert!(url.contains("expires=3600"));
        }
        Preview::Text { .. } => panic!("expected signed media preview"),
    }
}

#[tokio::test]
async fn test_create_folder_then_navigate() {
    init_tracing();
    let backend = Arc::new(InMemoryBackend::new(100));
    backend.seed("docs", &[]);

    let mut session = session_over(backend, connection());
    session.navigate(Some("docs"), "").await.unwrap();

    session.create_folder("incoming").await.unwrap();

    let listing = session.navigate(Some("docs"), "").await.unwrap();
    let Listing::Objects(entries) = listing else {
        panic!("expected object listing");
    };
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].key, "incoming/");
    assert!(entries[0].is_folder);
}

#[tokio::test]
async fn test_session_open_resolves_connection() {
    init_tracing();
    // Resolution against the real resolver needs no network; only the
    // client construction happens.
    let store = MemConnections(vec![connection()]);
    let session = Session::open(&store, "c1").await.unwrap();
    assert_eq!(session.connection().id, "c1");

    let missing = Session::open(&store, "nope").await;
    assert!(matches!(
        missing.unwrap_err(),
        Error::ConnectionNotFound(_)
    ));
}
