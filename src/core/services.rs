//! Unified service container.
//!
//! Wires configuration to the backend, repository source, indexer,
//! importer, and query engine. The CLI and HTTP adapters both run on this
//! same struct.

use crate::core::backend::{SearchBackend, TantivyBackend};
use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::indexer::{Indexer, RefImporter};
use crate::core::search::QueryEngine;
use crate::core::source::{GitRepositorySource, RepositorySource};
use std::sync::Arc;

/// Unified services container
#[derive(Clone)]
pub struct Services {
    pub config: Arc<Config>,
    pub backend: Arc<dyn SearchBackend>,
    pub source: Arc<dyn RepositorySource>,
    pub indexer: Arc<Indexer>,
    pub importer: Arc<RefImporter>,
    pub query: Arc<QueryEngine>,
}

impl Services {
    /// Create services from configuration, opening the index on disk
    pub fn new(config: Config) -> Result<Self> {
        let backend: Arc<dyn SearchBackend> =
            Arc::new(TantivyBackend::open(&config.index_dir())?);
        let source: Arc<dyn RepositorySource> =
            Arc::new(GitRepositorySource::new(config.data_dir.clone()));

        let indexer = Arc::new(Indexer::new(Arc::clone(&backend)));
        let importer = Arc::new(RefImporter::new(
            Arc::clone(&indexer),
            Arc::clone(&source),
        ));
        let query = Arc::new(QueryEngine::new(
            Arc::clone(&backend),
            Arc::clone(&source),
            &config.search,
        ));

        Ok(Self {
            config: Arc::new(config),
            backend,
            source,
            indexer,
            importer,
            query,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn services_open_index_under_data_dir() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = tmp.path().to_path_buf();

        let services = Services::new(config).unwrap();
        assert!(tmp.path().join("index").exists());
        assert_eq!(services.config.search.page_size, 10);
    }

    #[test]
    fn services_clone_shares_components() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = tmp.path().to_path_buf();

        let services = Services::new(config).unwrap();
        let cloned = services.clone();

        assert!(Arc::ptr_eq(&services.indexer, &cloned.indexer));
        assert!(Arc::ptr_eq(&services.query, &cloned.query));
        assert!(Arc::ptr_eq(&services.config, &cloned.config));
    }
}
