use super::{DataStore, DataStoreError, Result};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use std::sync::Arc;
use tracing::debug;

/// S3-backed data store. One bucket per model version; artifact paths are
/// object keys relative to the bucket root.
pub struct S3DataStore {
    client: Arc<Client>,
    bucket: String,
}

impl S3DataStore {
    /// Create a client with configuration from the environment (credentials,
    /// endpoint) plus an explicit region and bucket.
    pub async fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        let region = aws_sdk_s3::config::Region::new(region.into());
        let aws_config = aws_config::from_env().region(region).load().await;
        Self {
            client: Arc::new(Client::new(&aws_config)),
            bucket: bucket.into(),
        }
    }

    pub fn with_client(client: Arc<Client>, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl DataStore for S3DataStore {
    fn name(&self) -> String {
        format!("s3://{}", self.bucket)
    }

    async fn read_generic_file(&self, path: &str) -> Result<Vec<u8>> {
        debug!(bucket = %self.bucket, key = %path, "Fetching object from S3");

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    DataStoreError::NotFound(format!("s3://{}/{}", self.bucket, path))
                } else {
                    DataStoreError::S3 {
                        path: path.to_string(),
                        message: service_error.to_string(),
                    }
                }
            })?;

        let body = response.body.collect().await.map_err(|e| DataStoreError::S3 {
            path: path.to_string(),
            message: e.to_string(),
        })?;

        Ok(body.into_bytes().to_vec())
    }
}
