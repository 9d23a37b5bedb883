//! Batch ingestion of repository refs.
//!
//! The importer is the bridge from the repository source to the indexer:
//! for each ref it walks the commit tree, reads blobs, and feeds one ADD
//! batch per ref into [`super::Indexer`]. Re-running an import is cheap:
//! unchanged files upsert to a skip.

use crate::core::error::Result;
use crate::core::indexer::Indexer;
use crate::core::preview::MAX_BLOB_SIZE;
use crate::core::source::RepositorySource;
use crate::core::types::{FileIndex, FileIndexOperation, FileMetadata, Scope};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Statistics from one repository import
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportStats {
    pub refs_imported: usize,
    pub files_indexed: usize,
    pub files_skipped: usize,
    pub duration_ms: u64,
}

/// Git-to-index batch ingester
pub struct RefImporter {
    indexer: Arc<Indexer>,
    source: Arc<dyn RepositorySource>,
}

impl RefImporter {
    pub fn new(indexer: Arc<Indexer>, source: Arc<dyn RepositorySource>) -> Self {
        Self { indexer, source }
    }

    /// Re-scan every ref of a repository.
    ///
    /// Per-ref source failures are logged and do not abort the import of
    /// the remaining refs.
    pub fn import_repository(&self, scope: &Scope) -> Result<ImportStats> {
        let start = Instant::now();
        let refs = self.source.refs(scope)?;
        tracing::info!("importing {} refs of {scope}", refs.len());

        let mut stats = ImportStats::default();
        for ref_name in &refs {
            match self.import_ref(scope, ref_name) {
                Ok((indexed, skipped)) => {
                    stats.refs_imported += 1;
                    stats.files_indexed += indexed;
                    stats.files_skipped += skipped;
                }
                Err(e) => {
                    tracing::warn!("import of {scope}:{ref_name} failed: {e}");
                }
            }
        }

        stats.duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "import of {scope} complete: {} refs, {} files indexed, {} skipped in {}ms",
            stats.refs_imported,
            stats.files_indexed,
            stats.files_skipped,
            stats.duration_ms
        );
        Ok(stats)
    }

    /// Import one ref as a single indexer batch. Returns (indexed,
    /// skipped) file counts.
    pub fn import_ref(&self, scope: &Scope, ref_name: &str) -> Result<(usize, usize)> {
        let files = self.source.tree(scope, ref_name)?;
        tracing::debug!("{scope}:{ref_name} has {} tree entries", files.len());

        let mut ops = Vec::with_capacity(files.len());
        let mut skipped = 0usize;

        for file in files {
            if file.size > MAX_BLOB_SIZE {
                tracing::debug!("skipping oversized {}: {} bytes", file.path, file.size);
                skipped += 1;
                continue;
            }

            let bytes = match self.source.read_blob(scope, &file.blob) {
                Ok(bytes) => bytes,
                Err(e) => {
                    // Per-file failure only aborts this file
                    tracing::warn!("cannot read {} in {scope}: {e}", file.path);
                    skipped += 1;
                    continue;
                }
            };

            let content = match String::from_utf8(bytes) {
                Ok(content) => content,
                Err(_) => {
                    tracing::debug!("skipping binary {}", file.path);
                    skipped += 1;
                    continue;
                }
            };

            ops.push(FileIndexOperation::add(FileIndex {
                blob: file.blob,
                metadata: FileMetadata {
                    organization: scope.organization.clone(),
                    project: scope.project.clone(),
                    repository: scope.repository.clone(),
                    refs: vec![ref_name.to_string()],
                    path: file.path,
                    ext: String::new(),
                },
                full_refs: Vec::new(),
                content,
            }));
        }

        let indexed = ops.len();
        self.indexer.batch_file_index(ops)?;
        Ok((indexed, skipped))
    }

    /// Drop refs that no longer exist, deleting documents whose ref set
    /// empties.
    pub fn delete_refs(&self, scope: &Scope, refs: &[String]) -> Result<()> {
        self.indexer.delete_index_by_refs(
            &scope.organization,
            &scope.project,
            &scope.repository,
            refs,
        )
    }
}
