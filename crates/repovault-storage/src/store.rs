use crate::{Error, Result};
use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

/// Key-value blob interface of the archive container.
///
/// The store client and its credential state are read-only shared
/// configuration; one instance is reused across concurrent uploads.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key`, overwriting any existing object.
    async fn upload(&self, key: &str, bytes: Vec<u8>) -> Result<()>;

    /// Every key currently in the container.
    async fn list_all(&self) -> Result<Vec<String>>;

    async fn delete(&self, key: &str) -> Result<()>;
}

/// S3-compatible archive store.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Build a client from the ambient AWS environment (credentials from the
    /// default provider chain). `endpoint` points at MinIO-style deployments.
    pub async fn connect(
        bucket: String,
        region: Option<String>,
        endpoint: Option<String>,
    ) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }
        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let conf = loader.load().await;

        Self {
            client: Client::new(&conf),
            bucket,
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn upload(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| Error::Upload(DisplayErrorContext(e).to_string()))?;

        tracing::debug!("uploaded {} to bucket {}", key, self.bucket);

        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(&self.bucket);
            if let Some(token) = &continuation {
                request = request.continuation_token(token);
            }

            let page = request
                .send()
                .await
                .map_err(|e| Error::List(DisplayErrorContext(e).to_string()))?;

            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key().map(String::from)),
            );

            match page.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }

        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::Delete(DisplayErrorContext(e).to_string()))?;

        Ok(())
    }
}
