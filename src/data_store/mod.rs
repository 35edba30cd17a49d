mod local;
mod s3;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

pub use local::LocalDataStore;
pub use s3::S3DataStore;

#[derive(Debug, Error)]
pub enum DataStoreError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed json in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("s3 error for {path}: {message}")]
    S3 { path: String, message: String },
}

pub type Result<T> = std::result::Result<T, DataStoreError>;

/// The three factor matrices that form one trained PMF model, as stored in
/// the multi-matrix artifact: `m_U` (users), `m_V` (items), `m_theta`
/// (content-derived item prior).
#[derive(Debug, Clone, Deserialize)]
pub struct MultiMatrix {
    #[serde(rename = "m_U")]
    pub m_u: Vec<Vec<f64>>,
    #[serde(rename = "m_V")]
    pub m_v: Vec<Vec<f64>>,
    #[serde(rename = "m_theta")]
    pub m_theta: Vec<Vec<f64>>,
}

impl MultiMatrix {
    pub fn is_empty(&self) -> bool {
        self.m_u.is_empty() && self.m_v.is_empty() && self.m_theta.is_empty()
    }
}

/// Abstracts where the model artifacts live (S3 or local disk). The core
/// never performs raw I/O itself; everything goes through one of the two
/// implementations of this trait.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Human-readable location, for logs.
    fn name(&self) -> String;

    async fn read_generic_file(&self, path: &str) -> Result<Vec<u8>>;

    async fn read_json_file(&self, path: &str) -> Result<serde_json::Value> {
        let bytes = self.read_generic_file(path).await?;
        serde_json::from_slice(&bytes).map_err(|source| DataStoreError::Json {
            path: path.to_string(),
            source,
        })
    }

    async fn load_multi_matrix(&self, path: &str) -> Result<MultiMatrix> {
        let bytes = self.read_generic_file(path).await?;
        serde_json::from_slice(&bytes).map_err(|source| DataStoreError::Json {
            path: path.to_string(),
            source,
        })
    }
}
