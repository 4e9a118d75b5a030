use crate::keys::{encode_path, validate_key};
use crate::traits::{PayloadReader, Storage, StorageError, StorageResult, StoredLocation};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectStore, ObjectStoreExt, PutMode, PutMultipartOptions, PutOptions,
    PutPayload, WriteMultipart,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::io::AsyncReadExt;

/// Builds an object store scoped to one bucket.
pub type StoreFactory =
    Arc<dyn Fn(&str) -> StorageResult<Arc<dyn ObjectStore>> + Send + Sync>;

/// Read size for streamed uploads; `WriteMultipart` regroups these into parts.
const STREAM_READ_CHUNK: usize = 64 * 1024;
/// In-flight multipart parts per streamed upload.
const MULTIPART_CONCURRENCY: usize = 4;

/// S3 storage implementation
///
/// Buckets are chosen per request, so one object store client is built lazily
/// per bucket and cached.
#[derive(Clone)]
pub struct S3Storage {
    stores: Arc<RwLock<HashMap<String, Arc<dyn ObjectStore>>>>,
    factory: StoreFactory,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
    public_base_url: Option<String>,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    /// * `public_base_url` - Optional CDN or proxy prefix used for public URLs
    pub fn new(
        region: String,
        endpoint_url: Option<String>,
        public_base_url: Option<String>,
    ) -> StorageResult<Self> {
        let builder_region = region.clone();
        let builder_endpoint = endpoint_url.clone();

        let factory: StoreFactory = Arc::new(move |bucket: &str| {
            let mut builder = AmazonS3Builder::from_env()
                .with_region(builder_region.clone())
                .with_bucket_name(bucket.to_string());

            if let Some(ref endpoint) = builder_endpoint {
                let allow_http = endpoint.starts_with("http://");
                builder = builder
                    .with_endpoint(endpoint.clone())
                    .with_allow_http(allow_http);
            }

            let store = builder
                .build()
                .map_err(|e| StorageError::ConfigError(e.to_string()))?;
            Ok(Arc::new(store) as Arc<dyn ObjectStore>)
        });

        Ok(S3Storage {
            stores: Arc::new(RwLock::new(HashMap::new())),
            factory,
            region,
            endpoint_url,
            public_base_url,
        })
    }

    /// Create an instance backed by custom per-bucket stores.
    pub fn with_factory(factory: StoreFactory, public_base_url: Option<String>) -> Self {
        S3Storage {
            stores: Arc::new(RwLock::new(HashMap::new())),
            factory,
            region: String::new(),
            endpoint_url: None,
            public_base_url,
        }
    }

    fn store_for(&self, bucket: &str) -> StorageResult<Arc<dyn ObjectStore>> {
        {
            let stores = self
                .stores
                .read()
                .map_err(|_| StorageError::BackendError("Store cache poisoned".to_string()))?;
            if let Some(store) = stores.get(bucket) {
                return Ok(Arc::clone(store));
            }
        }

        let store = (self.factory)(bucket)?;
        let mut stores = self
            .stores
            .write()
            .map_err(|_| StorageError::BackendError("Store cache poisoned".to_string()))?;
        Ok(Arc::clone(
            stores.entry(bucket.to_string()).or_insert(store),
        ))
    }

    fn location(bucket: &str, path: &str) -> StorageResult<Path> {
        validate_key(bucket, path)?;
        Path::parse(path).map_err(|e| StorageError::InvalidKey(e.to_string()))
    }

    /// Generate public URL for S3 object
    ///
    /// Prefers the configured public base URL, then the custom endpoint in path
    /// style, then the standard AWS virtual-hosted format.
    fn generate_url(&self, bucket: &str, key: &str) -> String {
        let key = encode_path(key);
        if let Some(ref base) = self.public_base_url {
            format!("{}/{}/{}", base.trim_end_matches('/'), bucket, key)
        } else if let Some(ref endpoint) = self.endpoint_url {
            format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key)
        } else {
            format!("https://{}.s3.{}.amazonaws.com/{}", bucket, self.region, key)
        }
    }

    fn map_put_error(bucket: &str, key: &str, err: ObjectStoreError) -> StorageError {
        match err {
            ObjectStoreError::AlreadyExists { .. } | ObjectStoreError::Precondition { .. } => {
                StorageError::AlreadyExists(format!("{}/{}", bucket, key))
            }
            other => StorageError::UploadFailed(other.to_string()),
        }
    }

    fn content_type_attributes(content_type: &str) -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        attributes
    }

    async fn stream_multipart(
        store: &dyn ObjectStore,
        location: &Path,
        content_type: &str,
        mut reader: PayloadReader,
    ) -> StorageResult<u64> {
        let options = PutMultipartOptions {
            attributes: Self::content_type_attributes(content_type),
            ..Default::default()
        };
        let upload = store
            .put_multipart_opts(location, options)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        let mut writer = WriteMultipart::new(upload);
        let mut buf = vec![0u8; STREAM_READ_CHUNK];
        let mut total: u64 = 0;

        loop {
            let read = match reader.read(&mut buf).await {
                Ok(n) => n,
                Err(e) => {
                    let _ = writer.abort().await;
                    return Err(StorageError::UploadFailed(format!(
                        "Failed to read from stream: {}",
                        e
                    )));
                }
            };
            if read == 0 {
                break;
            }

            if let Err(e) = writer.wait_for_capacity(MULTIPART_CONCURRENCY).await {
                let _ = writer.abort().await;
                return Err(StorageError::UploadFailed(e.to_string()));
            }
            writer.write(&buf[..read]);
            total += read as u64;
        }

        writer
            .finish()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        Ok(total)
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put_if_absent(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<StoredLocation> {
        let location = Self::location(bucket, path)?;
        let store = self.store_for(bucket)?;
        let size = data.len() as u64;
        let start = std::time::Instant::now();

        let mut options = PutOptions::from(PutMode::Create);
        options.attributes = Self::content_type_attributes(content_type);

        let result = store
            .put_opts(&location, PutPayload::from(data), options)
            .await;

        if let Err(e) = result {
            let err = Self::map_put_error(bucket, path, e);
            if !matches!(err, StorageError::AlreadyExists(_)) {
                tracing::error!(
                    error = %err,
                    bucket = %bucket,
                    key = %path,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
            }
            return Err(err);
        }

        tracing::info!(
            bucket = %bucket,
            key = %path,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(StoredLocation {
            path: path.to_string(),
            public_url: self.generate_url(bucket, path),
            size_bytes: size,
        })
    }

    /// Streams through a multipart upload.
    ///
    /// Multipart completion cannot be made conditional, so the key is checked
    /// first. A concurrent writer can still win between the check and completion.
    async fn put_stream_if_absent(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        _content_length: Option<u64>,
        reader: PayloadReader,
    ) -> StorageResult<StoredLocation> {
        let location = Self::location(bucket, path)?;
        if self.exists(bucket, path).await? {
            return Err(StorageError::AlreadyExists(format!("{}/{}", bucket, path)));
        }

        let store = self.store_for(bucket)?;
        let start = std::time::Instant::now();

        let size = Self::stream_multipart(store.as_ref(), &location, content_type, reader)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    key = %path,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 stream upload failed"
                );
            })?;

        tracing::info!(
            bucket = %bucket,
            key = %path,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 stream upload successful"
        );

        Ok(StoredLocation {
            path: path.to_string(),
            public_url: self.generate_url(bucket, path),
            size_bytes: size,
        })
    }

    fn public_url(&self, bucket: &str, path: &str) -> StorageResult<String> {
        validate_key(bucket, path)?;
        Ok(self.generate_url(bucket, path))
    }

    async fn exists(&self, bucket: &str, path: &str) -> StorageResult<bool> {
        let location = Self::location(bucket, path)?;
        let store = self.store_for(bucket)?;
        match store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn download(&self, bucket: &str, path: &str) -> StorageResult<Vec<u8>> {
        let location = Self::location(bucket, path)?;
        let store = self.store_for(bucket)?;

        let result = store.get(&location).await.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => {
                StorageError::NotFound(format!("{}/{}", bucket, path))
            }
            other => StorageError::DownloadFailed(other.to_string()),
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        Ok(bytes.to_vec())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
