//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the StorageClient trait from cask-core.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};

use cask_core::{
    BatchOutcome, BucketInfo, Connection, DeleteError, Error, FetchedObject, ListOptions,
    ListPage, RemoteObject, Result, StorageClient, MAX_DELETE_BATCH,
};

/// S3 client wrapper bound to one connection's endpoint and credentials
#[derive(Debug)]
pub struct S3Client {
    inner: aws_sdk_s3::Client,
}

impl S3Client {
    /// Create a new S3 client from a resolved connection record
    pub async fn connect(connection: &Connection) -> Result<Self> {
        // Reject malformed endpoints before the SDK swallows them.
        url::Url::parse(&connection.endpoint)?;

        let credentials = aws_credential_types::Credentials::new(
            connection.access_key.clone(),
            connection.secret_key.clone(),
            None, // session token
            None, // expiry
            "cask-static-credentials",
        );

        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(connection.region.clone()))
            .endpoint_url(&connection.endpoint)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(connection.path_style)
            .build();

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
        })
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }
}

/// Translate an SDK error string into the engine taxonomy.
///
/// The SDK nests service errors behind generic wrappers, so classification
/// goes by the error code text the way S3-compatible backends report it.
fn classify_error(err: impl std::fmt::Display, context: &str) -> Error {
    let text = err.to_string();
    if text.contains("InvalidAccessKeyId")
        || text.contains("SignatureDoesNotMatch")
        || text.contains("AccessDenied")
        || text.contains("ExpiredToken")
    {
        Error::Auth(format!("{context}: {text}"))
    } else if text.contains("NotFound")
        || text.contains("NoSuchKey")
        || text.contains("NoSuchBucket")
    {
        Error::NotFound(context.to_string())
    } else {
        Error::Network(format!("{context}: {text}"))
    }
}

fn timestamp_from(dt: &aws_smithy_types::DateTime) -> Option<jiff::Timestamp> {
    jiff::Timestamp::from_second(dt.secs()).ok()
}

#[async_trait]
impl StorageClient for S3Client {
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>> {
        let response = self
            .inner
            .list_buckets()
            .send()
            .await
            .map_err(|e| classify_error(e, "list buckets"))?;

        let buckets = response
            .buckets()
            .iter()
            .map(|b| BucketInfo {
                name: b.name().unwrap_or_default().to_string(),
                created: b.creation_date().and_then(timestamp_from),
            })
            .collect();

        Ok(buckets)
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        options: &ListOptions,
    ) -> Result<ListPage> {
        let mut request = self.inner.list_objects_v2().bucket(bucket);

        if !prefix.is_empty() {
            request = request.prefix(prefix);
        }

        if let Some(delimiter) = &options.delimiter {
            request = request.delimiter(delimiter);
        }

        if let Some(max) = options.max_keys {
            request = request.max_keys(max);
        }

        if let Some(token) = &options.continuation_token {
            request = request.continuation_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_error(e, &format!("list objects in {bucket}/{prefix}")))?;

        let prefixes = response
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix().map(|s| s.to_string()))
            .collect();

        let objects = response
            .contents()
            .iter()
            .map(|object| {
                let mut record = RemoteObject::new(
                    object.key().unwrap_or_default(),
                    object.size().unwrap_or(0).max(0) as u64,
                );
                record.last_modified = object.last_modified().and_then(timestamp_from);
                record.etag = object.e_tag().map(|t| t.trim_matches('"').to_string());
                record.storage_class = object.storage_class().map(|sc| sc.as_str().to_string());
                record.owner = object
                    .owner()
                    .and_then(|o| o.display_name())
                    .map(|s| s.to_string());
                record
            })
            .collect();

        Ok(ListPage {
            prefixes,
            objects,
            next_token: response.next_continuation_token().map(|s| s.to_string()),
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<FetchedObject> {
        let response = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify_error(e, &format!("get {bucket}/{key}")))?;

        let content_type = response.content_type().map(|ct| ct.to_string());
        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::Network(format!("read body of {bucket}/{key}: {e}")))?
            .into_bytes()
            .to_vec();

        Ok(FetchedObject {
            content_length: data.len() as u64,
            content_type,
            data,
        })
    }

    async fn put_object<'a>(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: Option<&'a str>,
    ) -> Result<()> {
        let mut request = self
            .inner
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data));

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request
            .send()
            .await
            .map_err(|e| classify_error(e, &format!("put {bucket}/{key}")))?;

        Ok(())
    }

    async fn upload_file<'a>(
        &self,
        bucket: &str,
        key: &str,
        local: &Path,
        content_type: Option<&'a str>,
    ) -> Result<()> {
        let body = ByteStream::from_path(local)
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))?;

        let mut request = self
            .inner
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body);

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request
            .send()
            .await
            .map_err(|e| classify_error(e, &format!("upload {} to {bucket}/{key}", local.display())))?;

        Ok(())
    }

    async fn download_file(&self, bucket: &str, key: &str, dest: &Path) -> Result<()> {
        let response = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify_error(e, &format!("download {bucket}/{key}")))?;

        // Stream to disk; the object never lives in memory as a whole.
        let mut reader = response.body.into_async_read();
        let mut file = tokio::fs::File::create(dest).await?;
        tokio::io::copy(&mut reader, &mut file).await?;

        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.inner
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify_error(e, &format!("delete {bucket}/{key}")))?;

        Ok(())
    }

    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<BatchOutcome> {
        if keys.len() > MAX_DELETE_BATCH {
            return Err(Error::InvalidArgument(format!(
                "delete batch of {} keys exceeds the maximum of {MAX_DELETE_BATCH}",
                keys.len()
            )));
        }

        if keys.is_empty() {
            return Ok(BatchOutcome::default());
        }

        let objects: Vec<ObjectIdentifier> = keys
            .iter()
            .map(|k| {
                ObjectIdentifier::builder()
                    .key(k)
                    .build()
                    .map_err(|e| Error::InvalidArgument(e.to_string()))
            })
            .collect::<Result<_>>()?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(false)
            .build()
            .map_err(|e| Error::InvalidArgument(e.to_string()))?;

        let response = self
            .inner
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| classify_error(e, &format!("batch delete in {bucket}")))?;

        let deleted = response
            .deleted()
            .iter()
            .filter_map(|d| d.key().map(|k| k.to_string()))
            .collect();

        let errors = response
            .errors()
            .iter()
            .map(|e| {
                let mut err = DeleteError::new(
                    e.key().unwrap_or_default(),
                    e.code().unwrap_or("Unknown"),
                );
                if let Some(message) = e.message() {
                    err = err.with_message(message);
                }
                err
            })
            .collect();

        Ok(BatchOutcome { deleted, errors })
    }

    async fn signed_url(&self, bucket: &str, key: &str, ttl: Duration) -> Result<String> {
        let presigning = PresigningConfig::expires_in(ttl)
            .map_err(|e| Error::InvalidArgument(format!("signed URL ttl: {e}")))?;

        let presigned = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| classify_error(e, &format!("sign URL for {bucket}/{key}")))?;

        Ok(presigned.uri().to_string())
    }
}
