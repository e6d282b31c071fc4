use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use super::{BackendKind, DocumentStore};
use crate::errors::PortfolioError;

/// One lock per document path, shared by every `FileStore` in the process.
static PATH_LOCKS: Lazy<Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn lock_for(path: &Path) -> Arc<AsyncMutex<()>> {
    let mut locks = PATH_LOCKS
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    locks
        .entry(path.to_path_buf())
        .or_insert_with(|| Arc::new(AsyncMutex::new(())))
        .clone()
}

/// Local JSON file. Only suitable outside production.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read(&self) -> Result<Option<String>, PortfolioError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.error("read", &e)),
        }
    }

    /// Writes to a sibling temp file, then renames it over the target.
    async fn write(&self, contents: &str) -> Result<(), PortfolioError> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| self.error("create directory", &e))?;
        }

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
        let tmp = PathBuf::from(tmp_name);

        if let Err(e) = tokio::fs::write(&tmp, contents).await {
            return Err(self.error("write", &e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(self.error("rename", &e));
        }
        Ok(())
    }

    fn error(&self, op: &str, e: &std::io::Error) -> PortfolioError {
        PortfolioError::storage(
            BackendKind::File,
            format!("{op} {}: {e}", self.path.display()),
        )
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    fn kind(&self) -> BackendKind {
        BackendKind::File
    }

    async fn load(&self) -> Result<Option<String>, PortfolioError> {
        self.read().await
    }

    async fn store(&self, contents: &str) -> Result<(), PortfolioError> {
        let lock = lock_for(&self.path);
        let _guard = lock.lock().await;
        self.write(contents).await
    }

    async fn compare_and_swap(
        &self,
        expected: Option<&str>,
        contents: &str,
    ) -> Result<bool, PortfolioError> {
        let lock = lock_for(&self.path);
        let _guard = lock.lock().await;

        let current = self.read().await?;
        if current.as_deref() != expected {
            return Ok(false);
        }
        self.write(contents).await?;
        Ok(true)
    }
}
