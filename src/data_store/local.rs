use super::{DataStore, DataStoreError, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// Local-filesystem data store, rooted at a data directory. Used for tests
/// and for serving from a pre-synced volume.
pub struct LocalDataStore {
    root: PathBuf,
}

impl LocalDataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DataStore for LocalDataStore {
    fn name(&self) -> String {
        self.root.display().to_string()
    }

    async fn read_generic_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.root.join(path);
        match tokio::fs::read(&full_path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(DataStoreError::NotFound(full_path.display().to_string()))
            }
            Err(source) => Err(DataStoreError::Io {
                path: full_path.display().to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let store = LocalDataStore::new("tests/fixtures");
        let result = store.read_generic_file("no-such-file.json").await;

        assert!(matches!(result, Err(DataStoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_name_ends_with_root() {
        let store = LocalDataStore::new("tests/fixtures");
        assert!(store.name().ends_with("tests/fixtures"));
    }
}
