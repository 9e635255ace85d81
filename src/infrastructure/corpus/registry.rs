//! Per-plug corpus loading and caching

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::store::CorpusStore;
use crate::domain::guardrail::PlugPolicy;
use crate::domain::DomainError;

/// Source of raw corpus text for a plug's declared files
#[async_trait]
pub trait CorpusSource: Send + Sync + Debug {
    /// Fetch the raw text of every corpus file the policy declares,
    /// keyed by filename
    async fn corpus_texts(&self, policy: &PlugPolicy)
        -> Result<HashMap<String, String>, DomainError>;
}

/// Reads corpus files from a base directory on disk
#[derive(Debug)]
pub struct FsCorpusSource {
    base_dir: PathBuf,
}

impl FsCorpusSource {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

#[async_trait]
impl CorpusSource for FsCorpusSource {
    async fn corpus_texts(
        &self,
        policy: &PlugPolicy,
    ) -> Result<HashMap<String, String>, DomainError> {
        let mut texts = HashMap::new();
        for filename in &policy.corpus_files {
            let path = self.base_dir.join(filename);
            let text = tokio::fs::read_to_string(&path).await.map_err(|e| {
                DomainError::corpus(format!(
                    "failed to read corpus file '{}': {e}",
                    path.display()
                ))
            })?;
            texts.insert(filename.clone(), text);
        }
        Ok(texts)
    }
}

/// Caches one parsed [`CorpusStore`] per plug.
///
/// A plug's corpus is loaded at most once per registry lifetime; later
/// queries share the parsed store. `invalidate` forces a reload on the
/// next access.
#[derive(Debug)]
pub struct CorpusRegistry {
    source: Arc<dyn CorpusSource>,
    stores: RwLock<HashMap<String, Arc<CorpusStore>>>,
}

impl CorpusRegistry {
    /// Create a registry backed by the given source
    pub fn new(source: Arc<dyn CorpusSource>) -> Self {
        Self {
            source,
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Get the parsed corpus for a plug, loading it on first access
    pub async fn get_or_load(&self, policy: &PlugPolicy) -> Result<Arc<CorpusStore>, DomainError> {
        if let Some(store) = self.stores.read().await.get(&policy.plug_id) {
            return Ok(Arc::clone(store));
        }

        let texts = self.source.corpus_texts(policy).await?;

        let mut stores = self.stores.write().await;
        // Another task may have loaded it while we fetched.
        if let Some(store) = stores.get(&policy.plug_id) {
            return Ok(Arc::clone(store));
        }

        let mut store = CorpusStore::new();
        // Load in the policy's declared order, not hash order.
        for filename in &policy.corpus_files {
            if let Some(text) = texts.get(filename) {
                store.load_document(filename, text);
            }
        }
        info!(
            plug_id = %policy.plug_id,
            files = policy.corpus_files.len(),
            sections = store.section_count(),
            "loaded corpus"
        );

        let store = Arc::new(store);
        stores.insert(policy.plug_id.clone(), Arc::clone(&store));
        Ok(store)
    }

    /// Drop one plug's cached corpus
    pub async fn invalidate(&self, plug_id: &str) {
        self.stores.write().await.remove(plug_id);
    }

    /// Drop every cached corpus
    pub async fn invalidate_all(&self) {
        self.stores.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct CountingSource {
        loads: AtomicUsize,
    }

    impl CountingSource {
        fn new() -> Self {
            Self {
                loads: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CorpusSource for CountingSource {
        async fn corpus_texts(
            &self,
            policy: &PlugPolicy,
        ) -> Result<HashMap<String, String>, DomainError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(policy
                .corpus_files
                .iter()
                .map(|f| {
                    (
                        f.clone(),
                        "=== LOADS ===\nLive load is 2.4 kPa for offices.\n".to_string(),
                    )
                })
                .collect())
        }
    }

    fn policy() -> PlugPolicy {
        PlugPolicy::new("civil_sme", "Civil SME").with_corpus_files(["loads.txt"])
    }

    #[tokio::test]
    async fn test_corpus_loads_once_per_plug() {
        let source = Arc::new(CountingSource::new());
        let registry = CorpusRegistry::new(Arc::clone(&source) as Arc<dyn CorpusSource>);
        let policy = policy();

        let first = registry.get_or_load(&policy).await.unwrap();
        let second = registry.get_or_load(&policy).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
        assert_eq!(first.section_count(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let source = Arc::new(CountingSource::new());
        let registry = CorpusRegistry::new(Arc::clone(&source) as Arc<dyn CorpusSource>);
        let policy = policy();

        registry.get_or_load(&policy).await.unwrap();
        registry.invalidate(&policy.plug_id).await;
        registry.get_or_load(&policy).await.unwrap();

        assert_eq!(source.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fs_source_reads_declared_files() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(
            dir.path().join("loads.txt"),
            "=== LOADS ===\nLive load is 2.4 kPa.\n",
        )
        .await
        .unwrap();

        let source = FsCorpusSource::new(dir.path());
        let texts = source.corpus_texts(&policy()).await.unwrap();

        assert_eq!(texts.len(), 1);
        assert!(texts["loads.txt"].contains("2.4 kPa"));
    }

    #[tokio::test]
    async fn test_fs_source_missing_file_is_corpus_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsCorpusSource::new(dir.path());

        let err = source.corpus_texts(&policy()).await.unwrap_err();

        assert!(err.to_string().contains("loads.txt"));
    }
}
