use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::AppResult;
use crate::store::KeyValueStore;

/// Stores each key as `<dir>/<key>.json`
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates the store, making sure the directory exists
    pub async fn open(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        tracing::info!(dir = %dir.display(), "File store ready");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait::async_trait]
impl KeyValueStore for FileStore {
    async fn get_raw(&self, key: &str) -> AppResult<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_raw(&self, key: &str, value: String) -> AppResult<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        // Readers only ever see a complete file
        tokio::fs::write(&tmp, value.as_bytes()).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(key = %key, bytes = value.len(), "Value written to file store");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
