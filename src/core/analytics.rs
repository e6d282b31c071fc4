use std::sync::Arc;
use std::time::Duration;

use reqwest::Client as HttpClient;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, info, warn};

use super::config::StorageConfig;
use super::models::AnalyticsDocument;
use crate::errors::PortfolioError;
use crate::storage::{self, BackendKind, DocumentStore, Domain};

/// Retries granted to a registration that keeps losing compare-and-swap races.
pub const MAX_CAS_RETRIES: usize = 16;

const MAX_BACKOFF: Duration = Duration::from_millis(250);

/// Outcome of one registration attempt that did not succeed.
enum Attempt {
    Conflict,
    Failed(PortfolioError),
}

fn conflict_backoff() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(2)
        .factor(10)
        .max_delay(MAX_BACKOFF)
        .map(jitter)
        .take(MAX_CAS_RETRIES)
}

/// Unique-visitor counter backed by a single analytics document.
#[derive(Clone)]
pub struct AnalyticsRepository {
    store: Arc<dyn DocumentStore>,
}

impl AnalyticsRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn from_config(config: &StorageConfig, http: &HttpClient) -> Self {
        Self::new(storage::open(config, Domain::Analytics, http))
    }

    #[must_use]
    pub fn backend(&self) -> BackendKind {
        self.store.kind()
    }

    /// # Errors
    ///
    /// Returns a storage error if the backend read fails or the stored
    /// document cannot be parsed.
    pub async fn get(&self) -> Result<AnalyticsDocument, PortfolioError> {
        match self.store.load().await? {
            Some(raw) => self.decode(&raw),
            None => {
                let doc = AnalyticsDocument::default();
                if self.backend() == BackendKind::Blob {
                    info!("Analytics document missing on blob store; creating default");
                    if let Err(e) = self.store.store(&self.encode(&doc)?).await {
                        warn!("Failed to persist default analytics document: {}", e);
                    }
                }
                Ok(doc)
            }
        }
    }

    /// Adds `visitor_id` to the visitor set. Registering a known id leaves
    /// the document untouched. Lost compare-and-swap races are retried with
    /// jittered exponential backoff; backend failures are not retried.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank ids, or a storage error if the
    /// backend fails or conflicting writers exhaust the retry budget.
    pub async fn register_visitor(
        &self,
        visitor_id: &str,
    ) -> Result<AnalyticsDocument, PortfolioError> {
        if visitor_id.trim().is_empty() {
            return Err(PortfolioError::Validation("Invalid visitor ID".to_string()));
        }

        let outcome = RetryIf::spawn(
            conflict_backoff(),
            || self.try_register(visitor_id),
            |e: &Attempt| matches!(e, Attempt::Conflict),
        )
        .await;

        match outcome {
            Ok(doc) => Ok(doc),
            Err(Attempt::Failed(e)) => Err(e),
            Err(Attempt::Conflict) => Err(PortfolioError::storage(
                self.backend(),
                format!("gave up registering visitor after {MAX_CAS_RETRIES} conflicting writes"),
            )),
        }
    }

    async fn try_register(&self, visitor_id: &str) -> Result<AnalyticsDocument, Attempt> {
        let current = self.store.load().await.map_err(Attempt::Failed)?;
        let mut doc = match current.as_deref() {
            Some(raw) => self.decode(raw).map_err(Attempt::Failed)?,
            None => AnalyticsDocument::default(),
        };

        if !doc.register(visitor_id) {
            return Ok(doc);
        }

        let body = self.encode(&doc).map_err(Attempt::Failed)?;
        let swapped = self
            .store
            .compare_and_swap(current.as_deref(), &body)
            .await
            .map_err(Attempt::Failed)?;
        if !swapped {
            warn!("Analytics document changed concurrently; retrying");
            return Err(Attempt::Conflict);
        }

        debug!(unique_visitors = doc.unique_visitors, "Registered visitor");
        Ok(doc)
    }

    fn decode(&self, raw: &str) -> Result<AnalyticsDocument, PortfolioError> {
        serde_json::from_str::<AnalyticsDocument>(raw)
            .map(AnalyticsDocument::normalized)
            .map_err(|e| {
                PortfolioError::storage(self.backend(), format!("corrupt analytics document: {e}"))
            })
    }

    fn encode(&self, doc: &AnalyticsDocument) -> Result<String, PortfolioError> {
        serde_json::to_string_pretty(doc)
            .map_err(|e| PortfolioError::storage(self.backend(), format!("serialize: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store whose first `conflicts` conditional writes lose to a rival writer.
    struct ContendedStore {
        value: Mutex<Option<String>>,
        conflicts: AtomicUsize,
    }

    #[async_trait]
    impl DocumentStore for ContendedStore {
        fn kind(&self) -> BackendKind {
            BackendKind::KeyValue
        }

        async fn load(&self) -> Result<Option<String>, PortfolioError> {
            Ok(self.value.lock().unwrap().clone())
        }

        async fn store(&self, contents: &str) -> Result<(), PortfolioError> {
            *self.value.lock().unwrap() = Some(contents.to_string());
            Ok(())
        }

        async fn compare_and_swap(
            &self,
            expected: Option<&str>,
            contents: &str,
        ) -> Result<bool, PortfolioError> {
            let mut value = self.value.lock().unwrap();
            if self.conflicts.load(Ordering::SeqCst) > 0 {
                self.conflicts.fetch_sub(1, Ordering::SeqCst);
                let mut rival = AnalyticsDocument::default();
                rival.register("rival");
                *value = Some(serde_json::to_string(&rival).unwrap());
                return Ok(false);
            }
            if value.as_deref() != expected {
                return Ok(false);
            }
            *value = Some(contents.to_string());
            Ok(true)
        }
    }

    struct FailingStore;

    #[async_trait]
    impl DocumentStore for FailingStore {
        fn kind(&self) -> BackendKind {
            BackendKind::Blob
        }

        async fn load(&self) -> Result<Option<String>, PortfolioError> {
            Err(PortfolioError::storage(BackendKind::Blob, "list data/analytics.json: status 403"))
        }

        async fn store(&self, _contents: &str) -> Result<(), PortfolioError> {
            Err(PortfolioError::storage(BackendKind::Blob, "put: status 403"))
        }
    }

    /// In-memory store with real compare-and-swap and a little latency, so
    /// concurrent writers interleave between load and swap.
    #[derive(Default)]
    struct SlowStore {
        value: Mutex<Option<String>>,
    }

    #[async_trait]
    impl DocumentStore for SlowStore {
        fn kind(&self) -> BackendKind {
            BackendKind::KeyValue
        }

        async fn load(&self) -> Result<Option<String>, PortfolioError> {
            tokio::time::sleep(Duration::from_millis(2)).await;
            Ok(self.value.lock().unwrap().clone())
        }

        async fn store(&self, contents: &str) -> Result<(), PortfolioError> {
            *self.value.lock().unwrap() = Some(contents.to_string());
            Ok(())
        }

        async fn compare_and_swap(
            &self,
            expected: Option<&str>,
            contents: &str,
        ) -> Result<bool, PortfolioError> {
            tokio::time::sleep(Duration::from_millis(2)).await;
            let mut value = self.value.lock().unwrap();
            if value.as_deref() != expected {
                return Ok(false);
            }
            *value = Some(contents.to_string());
            Ok(true)
        }
    }

    /// Always-empty store that records unconditional writes.
    struct EmptyStore {
        kind: BackendKind,
        writes: Mutex<Vec<String>>,
    }

    impl EmptyStore {
        fn new(kind: BackendKind) -> Arc<Self> {
            Arc::new(Self {
                kind,
                writes: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl DocumentStore for EmptyStore {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        async fn load(&self) -> Result<Option<String>, PortfolioError> {
            Ok(None)
        }

        async fn store(&self, contents: &str) -> Result<(), PortfolioError> {
            self.writes.lock().unwrap().push(contents.to_string());
            Ok(())
        }
    }

    fn contended(conflicts: usize) -> AnalyticsRepository {
        AnalyticsRepository::new(Arc::new(ContendedStore {
            value: Mutex::new(None),
            conflicts: AtomicUsize::new(conflicts),
        }))
    }

    #[tokio::test]
    async fn retries_after_conflict_and_keeps_rival_id() {
        let repo = contended(1);
        let doc = repo.register_visitor("abc").await.unwrap();
        assert_eq!(doc.visitor_ids, vec!["rival", "abc"]);
        assert_eq!(doc.unique_visitors, 2);
    }

    #[tokio::test]
    async fn gives_up_after_retry_budget() {
        let repo = contended(MAX_CAS_RETRIES + 1);
        let err = repo.register_visitor("abc").await.unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("conflicting writes"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn simultaneous_first_visits_all_succeed() {
        // Every lost race is caused by a distinct rival success, so this many
        // writers can never exhaust the retry budget.
        let writers = MAX_CAS_RETRIES + 1;
        let store = Arc::new(SlowStore::default());
        let repo = AnalyticsRepository::new(store.clone());

        let tasks: Vec<_> = (0..writers)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.register_visitor(&format!("v{i}")).await })
            })
            .collect();

        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }

        let doc = repo.get().await.unwrap();
        assert_eq!(doc.unique_visitors as usize, writers);
        assert_eq!(doc.visitor_ids.len(), writers);
    }

    #[tokio::test]
    async fn missing_document_is_created_only_on_blob() {
        let blob = EmptyStore::new(BackendKind::Blob);
        let doc = AnalyticsRepository::new(blob.clone()).get().await.unwrap();
        assert_eq!(doc, AnalyticsDocument::default());

        let writes = blob.writes.lock().unwrap().clone();
        assert_eq!(writes.len(), 1);
        let stored: AnalyticsDocument = serde_json::from_str(&writes[0]).unwrap();
        assert_eq!(stored, AnalyticsDocument::default());

        let kv = EmptyStore::new(BackendKind::KeyValue);
        let doc = AnalyticsRepository::new(kv.clone()).get().await.unwrap();
        assert_eq!(doc.unique_visitors, 0);
        assert!(kv.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn read_failure_is_surfaced_not_defaulted() {
        let repo = AnalyticsRepository::new(Arc::new(FailingStore));
        let err = repo.get().await.unwrap_err();
        assert!(matches!(err, PortfolioError::Storage { backend: BackendKind::Blob, .. }));
        assert!(repo.register_visitor("abc").await.is_err());
    }

    #[tokio::test]
    async fn blank_visitor_id_is_rejected() {
        let repo = contended(0);
        let err = repo.register_visitor("   ").await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
