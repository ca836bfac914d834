// CloudJukebox - Music archive and playback over object storage
// Copyright (C) 2025 CloudJukebox Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! S3 & S3-compatible storage backend
//!
//! Implements the `StorageBackend` trait using the AWS S3 SDK. Works against AWS
//! itself and against self-hosted services (MinIO, Ceph RGW, Wasabi, ...) through a
//! custom endpoint.
//!
//! # Containers
//!
//! A container maps to one bucket. Bucket names are global on AWS, so an optional
//! `container_prefix` is prepended to every container name (`alice-` turns
//! `music-metadata` into bucket `alice-music-metadata`) and stripped again when
//! listing.
//!
//! # Configuration
//!
//! ```rust,no_run
//! use jukebox_storage::{S3Backend, S3Config, StorageBackend};
//!
//! #[tokio::main]
//! async fn main() -> jukebox_storage::StorageResult<()> {
//!     let backend = S3Backend::new(S3Config {
//!         endpoint: Some("http://localhost:9000".to_string()),
//!         access_key: "minioadmin".to_string(),
//!         secret_key: "minioadmin".to_string(),
//!         ..Default::default()
//!     })?;
//!
//!     for container in backend.list_containers().await? {
//!         println!("{}", container);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Local MinIO
//!
//! ```bash
//! docker run -p 9000:9000 -p 9001:9001 \
//!   -e MINIO_ROOT_USER=minioadmin \
//!   -e MINIO_ROOT_PASSWORD=minioadmin \
//!   minio/minio server /data --console-address ":9001"
//! ```

use crate::{validate_name, ObjectHeaders, ObjectMetadata, StorageBackend, StorageError, StorageResult};
use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use tracing::{debug, warn};

/// Region used when none is configured; also what MinIO expects by default
pub const DEFAULT_REGION: &str = "us-east-1";

/// Configuration for the S3 backend
#[derive(Clone)]
pub struct S3Config {
    /// Custom endpoint URL (e.g., http://localhost:9000); `None` for AWS
    pub endpoint: Option<String>,

    /// Region name
    pub region: String,

    /// Access key ID
    pub access_key: String,

    /// Secret access key
    pub secret_key: String,

    /// Prefix prepended to every container name to form the bucket name
    pub container_prefix: Option<String>,

    /// Use path-style addressing (default: true, required by MinIO)
    pub path_style: bool,

    /// Maximum number of attempts for a failed request (default: 3)
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (default: 100ms)
    pub initial_retry_delay_ms: u64,
}

impl Default for S3Config {
    fn default() -> Self {
        S3Config {
            endpoint: None,
            region: DEFAULT_REGION.to_string(),
            access_key: String::new(),
            secret_key: String::new(),
            container_prefix: None,
            path_style: true,
            max_retries: 3,
            initial_retry_delay_ms: 100,
        }
    }
}

impl fmt::Debug for S3Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Config")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key", &"***")
            .field("secret_key", &"***")
            .field("container_prefix", &self.container_prefix)
            .field("path_style", &self.path_style)
            .finish()
    }
}

type BoxedOp<T> = Pin<Box<dyn Future<Output = StorageResult<T>> + Send>>;

/// S3 storage backend
#[derive(Clone)]
pub struct S3Backend {
    client: Client,
    config: S3Config,
}

impl S3Backend {
    /// Create a new S3 backend
    ///
    /// No request is made here; connectivity problems surface on first use as
    /// [`StorageError::Unavailable`].
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not an http(s) URL or a credential is empty.
    pub fn new(config: S3Config) -> StorageResult<Self> {
        let mut config = config;

        if let Some(endpoint) = config.endpoint.as_mut() {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(StorageError::backend(
                    "invalid endpoint: must start with http:// or https://",
                ));
            }
            // Remove trailing slash for consistency
            *endpoint = endpoint.trim_end_matches('/').to_string();
        }

        if config.access_key.is_empty() {
            return Err(StorageError::backend("access key cannot be empty"));
        }
        if config.secret_key.is_empty() {
            return Err(StorageError::backend("secret key cannot be empty"));
        }
        if config.region.is_empty() {
            config.region = DEFAULT_REGION.to_string();
        }

        debug!(
            endpoint = ?config.endpoint,
            region = %config.region,
            path_style = config.path_style,
            "Initializing S3 backend"
        );

        let credentials = aws_sdk_s3::config::Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "JukeboxS3Backend",
        );

        // Build the client directly so no IMDS region discovery happens off AWS
        let mut builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .force_path_style(config.path_style)
            .region(aws_sdk_s3::config::Region::new(config.region.clone()));
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Ok(S3Backend {
            client: Client::from_conf(builder.build()),
            config,
        })
    }

    /// Create a new S3 backend from environment variables
    ///
    /// Reads `JUKEBOX_S3_ACCESS_KEY` and `JUKEBOX_S3_SECRET_KEY` (required), plus
    /// `JUKEBOX_S3_ENDPOINT`, `JUKEBOX_S3_REGION` and `JUKEBOX_S3_CONTAINER_PREFIX`.
    pub fn from_env() -> StorageResult<Self> {
        let required = |name: &str| {
            std::env::var(name).map_err(|_| {
                StorageError::backend(format!("{} environment variable not set", name))
            })
        };

        Self::new(S3Config {
            endpoint: std::env::var("JUKEBOX_S3_ENDPOINT").ok(),
            region: std::env::var("JUKEBOX_S3_REGION")
                .unwrap_or_else(|_| DEFAULT_REGION.to_string()),
            access_key: required("JUKEBOX_S3_ACCESS_KEY")?,
            secret_key: required("JUKEBOX_S3_SECRET_KEY")?,
            container_prefix: std::env::var("JUKEBOX_S3_CONTAINER_PREFIX").ok(),
            ..Default::default()
        })
    }

    /// Get the configured endpoint
    pub fn endpoint(&self) -> Option<&str> {
        self.config.endpoint.as_deref()
    }

    /// Map a container name to its bucket name
    pub fn bucket_name(&self, container: &str) -> StorageResult<String> {
        validate_name("container", container)?;
        let bucket = match &self.config.container_prefix {
            Some(prefix) => format!("{}{}", prefix, container),
            None => container.to_string(),
        };
        validate_bucket_name(&bucket)?;
        Ok(bucket)
    }

    /// Perform an operation with exponential backoff retry logic
    ///
    /// Only [`StorageError::Unavailable`] is retried.
    async fn with_retry<F, T>(&self, mut operation: F) -> StorageResult<T>
    where
        F: FnMut() -> BoxedOp<T>,
    {
        let mut attempt = 0;
        let mut delay_ms = self.config.initial_retry_delay_ms;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_unavailable() => {
                    attempt += 1;
                    if attempt >= self.config.max_retries {
                        return Err(StorageError::unavailable(format!(
                            "failed after {} attempts: {}",
                            self.config.max_retries, e
                        )));
                    }

                    warn!(
                        "S3 request failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt, self.config.max_retries, delay_ms, e
                    );

                    tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                    delay_ms = (delay_ms * 2).min(10_000);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// S3 bucket naming rules
fn validate_bucket_name(bucket: &str) -> StorageResult<()> {
    if bucket.len() < 3 || bucket.len() > 63 {
        return Err(StorageError::invalid_name(format!(
            "bucket name must be 3 to 63 characters: {}",
            bucket
        )));
    }

    if !bucket
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(StorageError::invalid_name(format!(
            "bucket name must contain only lowercase letters, numbers, dots and hyphens: {}",
            bucket
        )));
    }

    if bucket.starts_with('-') || bucket.ends_with('-') {
        return Err(StorageError::invalid_name(format!(
            "bucket name cannot start or end with a hyphen: {}",
            bucket
        )));
    }

    Ok(())
}

/// Recognize "does not exist" responses from real and emulated S3 services
fn is_missing(code: Option<&str>, message: &str) -> bool {
    if matches!(code, Some("NoSuchBucket" | "NoSuchKey" | "NotFound")) {
        return true;
    }

    let message = message.to_lowercase();
    message.contains("404")
        || message.contains("not found")
        || message.contains("notfound")
        || message.contains("nosuchkey")
        || message.contains("nosuchbucket")
        || message.contains("does not exist")
}

fn is_already_owned(code: Option<&str>) -> bool {
    matches!(code, Some("BucketAlreadyOwnedByYou" | "BucketAlreadyExists"))
}

impl fmt::Debug for S3Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Backend")
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    async fn list_containers(&self) -> StorageResult<Vec<String>> {
        let client = self.client.clone();
        let prefix = self.config.container_prefix.clone().unwrap_or_default();

        self.with_retry(|| {
            let client = client.clone();
            let prefix = prefix.clone();

            Box::pin(async move {
                let response = client.list_buckets().send().await.map_err(|e| {
                    StorageError::unavailable(format!(
                        "failed to list buckets: {}",
                        DisplayErrorContext(&e)
                    ))
                })?;

                let mut containers: Vec<String> = response
                    .buckets()
                    .iter()
                    .filter_map(|bucket| bucket.name())
                    .filter_map(|name| name.strip_prefix(prefix.as_str()))
                    .map(str::to_string)
                    .collect();
                containers.sort();
                Ok(containers)
            })
        })
        .await
    }

    async fn create_container(&self, container: &str) -> StorageResult<bool> {
        let bucket = self.bucket_name(container)?;
        let client = self.client.clone();
        let region = self.config.region.clone();

        self.with_retry(|| {
            let client = client.clone();
            let bucket = bucket.clone();
            let region = region.clone();

            Box::pin(async move {
                debug!(bucket = %bucket, "Creating bucket");

                let mut request = client.create_bucket().bucket(&bucket);
                if region != DEFAULT_REGION {
                    request = request.create_bucket_configuration(
                        CreateBucketConfiguration::builder()
                            .location_constraint(BucketLocationConstraint::from(region.as_str()))
                            .build(),
                    );
                }

                match request.send().await {
                    Ok(_) => Ok(true),
                    Err(e) if is_already_owned(e.code()) => Ok(true),
                    Err(e) => Err(StorageError::unavailable(format!(
                        "failed to create bucket {}: {}",
                        bucket,
                        DisplayErrorContext(&e)
                    ))),
                }
            })
        })
        .await
    }

    async fn delete_container(&self, container: &str) -> StorageResult<bool> {
        let bucket = self.bucket_name(container)?;

        // Buckets must be empty before they can be deleted
        let Some(objects) = self.list_objects(container).await? else {
            return Ok(false);
        };
        for object in &objects {
            self.delete_object(container, object).await?;
        }

        let client = self.client.clone();
        self.with_retry(|| {
            let client = client.clone();
            let bucket = bucket.clone();

            Box::pin(async move {
                match client.delete_bucket().bucket(&bucket).send().await {
                    Ok(_) => Ok(true),
                    Err(e) => {
                        let message = DisplayErrorContext(&e).to_string();
                        if is_missing(e.code(), &message) {
                            Ok(false)
                        } else {
                            Err(StorageError::unavailable(format!(
                                "failed to delete bucket {}: {}",
                                bucket, message
                            )))
                        }
                    }
                }
            })
        })
        .await
    }

    async fn list_objects(&self, container: &str) -> StorageResult<Option<Vec<String>>> {
        let bucket = self.bucket_name(container)?;
        let client = self.client.clone();

        self.with_retry(|| {
            let client = client.clone();
            let bucket = bucket.clone();

            Box::pin(async move {
                let mut result = vec![];
                let mut continuation_token: Option<String> = None;

                loop {
                    let mut request = client.list_objects_v2().bucket(&bucket);
                    if let Some(token) = continuation_token {
                        request = request.continuation_token(token);
                    }

                    let response = match request.send().await {
                        Ok(response) => response,
                        Err(e) => {
                            let message = DisplayErrorContext(&e).to_string();
                            if is_missing(e.code(), &message) {
                                return Ok(None);
                            }
                            return Err(StorageError::unavailable(format!(
                                "failed to list objects in {}: {}",
                                bucket, message
                            )));
                        }
                    };

                    for obj in response.contents() {
                        if let Some(key) = obj.key() {
                            result.push(key.to_string());
                        }
                    }

                    if response.is_truncated() == Some(true) {
                        continuation_token =
                            response.next_continuation_token().map(|t| t.to_string());
                    } else {
                        break;
                    }
                }

                result.sort();
                debug!(bucket = %bucket, count = result.len(), "Listed objects");
                Ok(Some(result))
            })
        })
        .await
    }

    async fn stat_object(
        &self,
        container: &str,
        object: &str,
    ) -> StorageResult<Option<ObjectMetadata>> {
        let bucket = self.bucket_name(container)?;
        validate_name("object", object)?;
        let client = self.client.clone();
        let key = object.to_string();

        self.with_retry(|| {
            let client = client.clone();
            let bucket = bucket.clone();
            let key = key.clone();

            Box::pin(async move {
                match client.head_object().bucket(&bucket).key(&key).send().await {
                    Ok(response) => {
                        let headers = response
                            .metadata()
                            .map(|metadata| {
                                metadata
                                    .iter()
                                    .map(|(k, v)| (k.to_lowercase(), v.clone()))
                                    .collect()
                            })
                            .unwrap_or_default();
                        let size = response.content_length().unwrap_or(0).max(0) as u64;
                        Ok(Some(ObjectMetadata { size, headers }))
                    }
                    Err(e) => {
                        let message = DisplayErrorContext(&e).to_string();
                        if is_missing(e.code(), &message) {
                            Ok(None)
                        } else {
                            Err(StorageError::unavailable(format!(
                                "failed to stat {}/{}: {}",
                                bucket, key, message
                            )))
                        }
                    }
                }
            })
        })
        .await
    }

    async fn put_object(
        &self,
        container: &str,
        object: &str,
        data: &[u8],
        headers: Option<&ObjectHeaders>,
    ) -> StorageResult<bool> {
        let bucket = self.bucket_name(container)?;
        validate_name("object", object)?;

        if data.is_empty() {
            return Ok(false);
        }

        let client = self.client.clone();
        let key = object.to_string();
        let body = data.to_vec();
        let metadata: Option<HashMap<String, String>> =
            headers.map(|h| h.iter().map(|(k, v)| (k.clone(), v.clone())).collect());

        self.with_retry(|| {
            let client = client.clone();
            let bucket = bucket.clone();
            let key = key.clone();
            let body = body.clone();
            let metadata = metadata.clone();

            Box::pin(async move {
                debug!(bucket = %bucket, key = %key, size = body.len(), "Putting object");

                match client
                    .put_object()
                    .bucket(&bucket)
                    .key(&key)
                    .set_metadata(metadata)
                    .body(ByteStream::from(body))
                    .send()
                    .await
                {
                    Ok(_) => Ok(true),
                    Err(e) => {
                        let message = DisplayErrorContext(&e).to_string();
                        if is_missing(e.code(), &message) {
                            Ok(false)
                        } else {
                            Err(StorageError::unavailable(format!(
                                "failed to put {}/{}: {}",
                                bucket, key, message
                            )))
                        }
                    }
                }
            })
        })
        .await
    }

    async fn delete_object(&self, container: &str, object: &str) -> StorageResult<bool> {
        // S3 deletes are idempotent, so existence has to be checked up front
        if self.stat_object(container, object).await?.is_none() {
            return Ok(false);
        }

        let bucket = self.bucket_name(container)?;
        let client = self.client.clone();
        let key = object.to_string();

        self.with_retry(|| {
            let client = client.clone();
            let bucket = bucket.clone();
            let key = key.clone();

            Box::pin(async move {
                debug!(bucket = %bucket, key = %key, "Deleting object");

                client
                    .delete_object()
                    .bucket(&bucket)
                    .key(&key)
                    .send()
                    .await
                    .map_err(|e| {
                        StorageError::unavailable(format!(
                            "failed to delete {}/{}: {}",
                            bucket,
                            key,
                            DisplayErrorContext(&e)
                        ))
                    })?;
                Ok(true)
            })
        })
        .await
    }

    async fn get_object(&self, container: &str, object: &str, dest: &Path) -> StorageResult<u64> {
        let bucket = self.bucket_name(container)?;
        validate_name("object", object)?;
        let client = self.client.clone();
        let key = object.to_string();

        let data = self
            .with_retry(|| {
                let client = client.clone();
                let bucket = bucket.clone();
                let key = key.clone();

                Box::pin(async move {
                    let response =
                        match client.get_object().bucket(&bucket).key(&key).send().await {
                            Ok(response) => response,
                            Err(e) => {
                                let message = DisplayErrorContext(&e).to_string();
                                if is_missing(e.code(), &message) {
                                    return Ok(None);
                                }
                                return Err(StorageError::unavailable(format!(
                                    "failed to get {}/{}: {}",
                                    bucket, key, message
                                )));
                            }
                        };

                    let body = response.body.collect().await.map_err(|e| {
                        StorageError::unavailable(format!("failed to read object body: {}", e))
                    })?;
                    Ok(Some(body.into_bytes().to_vec()))
                })
            })
            .await?;

        let Some(data) = data else {
            return Ok(0);
        };

        tokio::fs::write(dest, &data).await?;
        Ok(data.len() as u64)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn minio_config() -> S3Config {
        S3Config {
            endpoint: Some("http://localhost:9000/".to_string()),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_removes_trailing_slash() {
        let backend = S3Backend::new(minio_config()).unwrap();
        assert_eq!(backend.endpoint(), Some("http://localhost:9000"));
    }

    #[test]
    fn test_invalid_endpoint_format() {
        let result = S3Backend::new(S3Config {
            endpoint: Some("localhost:9000".to_string()),
            ..minio_config()
        });

        assert!(result.unwrap_err().to_string().contains("must start with http"));
    }

    #[test]
    fn test_empty_credentials() {
        let result = S3Backend::new(S3Config {
            access_key: String::new(),
            ..minio_config()
        });
        assert!(result.is_err());

        let result = S3Backend::new(S3Config {
            secret_key: String::new(),
            ..minio_config()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_bucket_name_uses_prefix() {
        let backend = S3Backend::new(S3Config {
            container_prefix: Some("alice-".to_string()),
            ..minio_config()
        })
        .unwrap();

        assert_eq!(
            backend.bucket_name("music-metadata").unwrap(),
            "alice-music-metadata"
        );
    }

    #[test]
    fn test_bucket_name_rules() {
        assert!(validate_bucket_name("c-artist-songs-ez").is_ok());
        assert!(validate_bucket_name("ab").is_err());
        assert!(validate_bucket_name(&"a".repeat(64)).is_err());
        assert!(validate_bucket_name("Upper-Case").is_err());
        assert!(validate_bucket_name("-leading").is_err());
        assert!(validate_bucket_name("trailing-").is_err());
    }

    #[test]
    fn test_missing_detection() {
        assert!(is_missing(Some("NoSuchBucket"), ""));
        assert!(is_missing(None, "service error: NoSuchKey"));
        assert!(is_missing(None, "HTTP 404"));
        assert!(!is_missing(Some("AccessDenied"), "access denied"));
        assert!(!is_missing(None, "dispatch failure: connection refused"));
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let backend = S3Backend::new(minio_config()).unwrap();
        let debug_str = format!("{:?}", backend);

        assert!(debug_str.contains("S3Backend"));
        assert!(debug_str.contains("***"));
        assert!(!debug_str.contains("minioadmin"));
    }

    #[tokio::test]
    #[ignore = "requires MinIO server"]
    async fn test_container_roundtrip() {
        let backend = S3Backend::new(minio_config()).unwrap();
        let dir = tempfile::TempDir::new().unwrap();

        assert!(backend.create_container("jukebox-test").await.unwrap());
        assert!(backend
            .put_object("jukebox-test", "song.mp3", b"data", None)
            .await
            .unwrap());

        let dest = dir.path().join("song.mp3");
        assert_eq!(
            backend.get_object("jukebox-test", "song.mp3", &dest).await.unwrap(),
            4
        );
        assert!(backend.delete_container("jukebox-test").await.unwrap());
    }
}
