//! Document storage backends.
//!
//! Each data domain persists a single JSON document. The backend is chosen
//! from configuration presence (see [`StorageConfig::backend`]) and opened
//! behind the [`DocumentStore`] trait so repositories never know which one
//! they are talking to.

pub mod blob;
pub mod file;
pub mod kv;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::info;

use crate::core::config::StorageConfig;
use crate::errors::PortfolioError;

pub use blob::{BlobClient, BlobStore};
pub use file::FileStore;
pub use kv::{KvClient, KvStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Blob,
    KeyValue,
    File,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Blob => "blob",
            BackendKind::KeyValue => "kv",
            BackendKind::File => "file",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Portfolio,
    Analytics,
}

impl Domain {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Domain::Portfolio => "portfolio",
            Domain::Analytics => "analytics",
        }
    }

    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Domain::Portfolio => "portfolio.json",
            Domain::Analytics => "analytics.json",
        }
    }

    #[must_use]
    pub fn kv_key(self) -> &'static str {
        match self {
            Domain::Portfolio => "portfolio:data",
            Domain::Analytics => "analytics:data",
        }
    }

    #[must_use]
    pub fn blob_pathname(self) -> &'static str {
        match self {
            Domain::Portfolio => "data/portfolio.json",
            Domain::Analytics => "data/analytics.json",
        }
    }
}

/// Where a domain's document lives on the selected backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageTarget {
    Blob { pathname: String },
    KeyValue { key: String },
    File { path: PathBuf },
}

impl StorageTarget {
    #[must_use]
    pub fn kind(&self) -> BackendKind {
        match self {
            StorageTarget::Blob { .. } => BackendKind::Blob,
            StorageTarget::KeyValue { .. } => BackendKind::KeyValue,
            StorageTarget::File { .. } => BackendKind::File,
        }
    }
}

/// A single JSON document on some backend, read and written as raw text.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Returns `None` when the document does not exist yet.
    async fn load(&self) -> Result<Option<String>, PortfolioError>;

    /// Unconditionally replaces the document.
    async fn store(&self, contents: &str) -> Result<(), PortfolioError>;

    /// Replaces the document only if it still equals `expected` (`None`
    /// meaning absent). Returns `Ok(false)` on conflict.
    ///
    /// Backends without a conditional write fall back to a plain store, so
    /// concurrent writers there keep last-writer-wins semantics.
    async fn compare_and_swap(
        &self,
        expected: Option<&str>,
        contents: &str,
    ) -> Result<bool, PortfolioError> {
        let _ = expected;
        self.store(contents).await?;
        Ok(true)
    }
}

/// Opens the store selected by `config` for `domain`.
pub fn open(config: &StorageConfig, domain: Domain, http: &HttpClient) -> Arc<dyn DocumentStore> {
    let target = config.select(domain);
    info!(domain = domain.name(), backend = %target.kind(), "Resolved storage backend");

    match target {
        StorageTarget::Blob { pathname } => {
            let token = config.blob_token.clone().unwrap_or_default();
            let client = BlobClient::new(http.clone(), &config.blob_api_url, token);
            Arc::new(BlobStore::new(client, pathname))
        }
        StorageTarget::KeyValue { key } => {
            let (url, token) = config
                .kv
                .as_ref()
                .map(|kv| (kv.rest_url.clone(), kv.rest_token.clone()))
                .unwrap_or_default();
            Arc::new(KvStore::new(KvClient::new(http.clone(), url, token), key))
        }
        StorageTarget::File { path } => Arc::new(FileStore::new(path)),
    }
}
