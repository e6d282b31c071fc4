use std::sync::Arc;

use reqwest::Client as HttpClient;
use tracing::{error, info, warn};

use super::config::StorageConfig;
use super::models::PortfolioDocument;
use crate::errors::PortfolioError;
use crate::storage::{self, BackendKind, DocumentStore, Domain};

/// Reads and overwrites the single portfolio document.
#[derive(Clone)]
pub struct PortfolioRepository {
    store: Arc<dyn DocumentStore>,
}

impl PortfolioRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn from_config(config: &StorageConfig, http: &HttpClient) -> Self {
        Self::new(storage::open(config, Domain::Portfolio, http))
    }

    #[must_use]
    pub fn backend(&self) -> BackendKind {
        self.store.kind()
    }

    /// Returns the stored document, materializing the default on first read.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend read fails or the stored
    /// document cannot be parsed.
    pub async fn get(&self) -> Result<PortfolioDocument, PortfolioError> {
        let Some(raw) = self.store.load().await? else {
            let doc = PortfolioDocument::default();
            info!(backend = %self.backend(), "Portfolio document missing; creating default");
            if let Err(e) = self.write(&doc).await {
                warn!("Failed to persist default portfolio document: {}", e);
            }
            return Ok(doc);
        };

        serde_json::from_str(&raw).map_err(|e| {
            error!(backend = %self.backend(), "Stored portfolio document is corrupt: {}", e);
            PortfolioError::storage(self.backend(), format!("corrupt portfolio document: {e}"))
        })
    }

    /// Replaces the whole document. Concurrent saves are last-writer-wins.
    ///
    /// # Errors
    ///
    /// Returns a validation error for out-of-range fields, or a storage error
    /// naming the backend if the write fails.
    pub async fn save(&self, doc: &PortfolioDocument) -> Result<(), PortfolioError> {
        doc.validate()?;
        self.write(doc).await?;
        info!(backend = %self.backend(), skills = doc.skills.len(), projects = doc.projects.len(), "Saved portfolio document");
        Ok(())
    }

    async fn write(&self, doc: &PortfolioDocument) -> Result<(), PortfolioError> {
        let body = serde_json::to_string_pretty(doc)
            .map_err(|e| PortfolioError::storage(self.backend(), format!("serialize: {e}")))?;
        self.store.store(&body).await
    }
}
