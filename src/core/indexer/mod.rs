//! Index maintenance: create, upsert, ref deletion, and batches.
//!
//! All writes funnel through the [`Indexer`], which owns the per-blob
//! ref-set invariants: a blob reachable from several refs is one document
//! tagged with the union of those refs, and a document whose last ref is
//! removed is deleted. Callers serialize operations per document id (one
//! writer per repository); the invariants are not defended under
//! unsynchronized concurrent upsert.

mod importer;
mod pruner;

pub use importer::{ImportStats, RefImporter};
pub use pruner::ScopeScan;

use crate::core::backend::{BackendBatch, SearchBackend};
use crate::core::codec;
use crate::core::error::Result;
use crate::core::refset::{doc_id, fill_file_index, merge_refs, remove_refs};
use crate::core::types::{BatchMethod, FileIndex, FileIndexOperation};
use std::sync::Arc;

/// What an upsert did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No document existed for this id; one was written
    Created,
    /// Refs were merged into the existing document and it was rewritten
    Updated,
    /// The incoming refs were already present; nothing was written
    Skipped,
}

/// Write-side facade over the search backend
pub struct Indexer {
    backend: Arc<dyn SearchBackend>,
}

impl Indexer {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn SearchBackend> {
        &self.backend
    }

    /// Unconditionally (re)write a document
    pub fn create_file_index(&self, mut f: FileIndex) -> Result<()> {
        fill_file_index(&mut f)?;
        self.write(&f, None)?;
        tracing::debug!("created index for {}", doc_id(&f));
        Ok(())
    }

    /// Merge a document into the index.
    ///
    /// Absent id falls through to create. When the incoming refs add
    /// nothing the operation is skipped, making repeated upserts of the
    /// same file idempotent.
    pub fn upsert_file_index(&self, f: FileIndex) -> Result<UpsertOutcome> {
        self.upsert(f, None)
    }

    /// Remove `refs` from every document in scope that carries any of
    /// them. Documents whose ref set empties are deleted; the rest are
    /// rewritten with the reduced set.
    pub fn delete_index_by_refs(
        &self,
        organization: &str,
        project: &str,
        repository: &str,
        refs: &[String],
    ) -> Result<()> {
        let scan = ScopeScan::refs(
            self.backend.as_ref(),
            organization,
            project,
            repository,
            refs,
        );

        for page in scan {
            let page = page?;
            let mut batch = BackendBatch::new();

            for hit in &page {
                if let Err(e) = self.remove_refs_from_doc(&hit.id, refs, &mut batch) {
                    tracing::warn!("ref removal failed for {}: {e}", hit.id);
                }
            }

            self.backend.commit_batch(batch)?;
        }

        Ok(())
    }

    /// Delete every document of a repository
    pub fn delete_repository(
        &self,
        organization: &str,
        project: &str,
        repository: &str,
    ) -> Result<()> {
        self.prune(|| {
            ScopeScan::repository(self.backend.as_ref(), organization, project, repository)
        })
    }

    /// Delete every document of a project
    pub fn delete_project(&self, organization: &str, project: &str) -> Result<()> {
        self.prune(|| ScopeScan::project(self.backend.as_ref(), organization, project))
    }

    /// Delete every document of an organization
    pub fn delete_organization(&self, organization: &str) -> Result<()> {
        self.prune(|| ScopeScan::organization(self.backend.as_ref(), organization))
    }

    /// Apply a heterogeneous operation sequence as one backend batch.
    ///
    /// Failures of individual operations are logged and do not abort the
    /// batch; a failed commit propagates without retry.
    pub fn batch_file_index(&self, ops: Vec<FileIndexOperation>) -> Result<()> {
        let mut batch = BackendBatch::new();

        for op in ops {
            let result = match op.method {
                BatchMethod::Add => self.upsert(op.file_index, Some(&mut batch)).map(|_| ()),
                BatchMethod::Delete => {
                    let mut f = op.file_index;
                    match fill_file_index(&mut f) {
                        Ok(()) => {
                            let id = doc_id(&f);
                            self.remove_refs_from_doc(&id, &f.metadata.refs, &mut batch)
                        }
                        Err(e) => Err(e),
                    }
                }
            };
            if let Err(e) = result {
                tracing::warn!("batch operation failed: {e}");
            }
        }

        self.backend.commit_batch(batch)
    }

    fn upsert(&self, mut f: FileIndex, batch: Option<&mut BackendBatch>) -> Result<UpsertOutcome> {
        fill_file_index(&mut f)?;
        let id = doc_id(&f);

        let Some(fields) = self.backend.get(&id)? else {
            self.write(&f, batch)?;
            tracing::debug!("created index for {id}");
            return Ok(UpsertOutcome::Created);
        };

        let mut existing = codec::decode(&fields)?;
        let same = merge_refs(&mut existing, &f.metadata.refs);
        if same {
            tracing::debug!("skipped index for {id}");
            return Ok(UpsertOutcome::Skipped);
        }

        // The stored document keeps its original path; the content is the
        // request's copy, byte-identical because the blob hash matches.
        existing.content = f.content;
        self.write(&existing, batch)?;
        tracing::debug!("updated index for {id}");
        Ok(UpsertOutcome::Updated)
    }

    /// Apply a ref removal to one stored document, staging the resulting
    /// delete or rewrite in `batch`. Absent documents are a no-op.
    fn remove_refs_from_doc(
        &self,
        id: &str,
        refs: &[String],
        batch: &mut BackendBatch,
    ) -> Result<()> {
        let Some(fields) = self.backend.get(id)? else {
            return Ok(());
        };
        let mut existing = codec::decode(&fields)?;

        if remove_refs(&mut existing, refs) {
            batch.delete(id);
            tracing::debug!("deleted index for {id}");
        } else {
            batch.index(id, codec::encode(&existing));
            tracing::debug!("updated index for {id} after ref removal");
        }
        Ok(())
    }

    fn write(&self, f: &FileIndex, batch: Option<&mut BackendBatch>) -> Result<()> {
        let id = doc_id(f);
        let fields = codec::encode(f);
        match batch {
            Some(batch) => {
                batch.index(id, fields);
                Ok(())
            }
            None => self.backend.index(&id, &fields),
        }
    }

    /// Repeatedly scan a scope and delete everything it returns. A fresh
    /// scan per round keeps the walk correct while pages shrink under the
    /// deletes.
    fn prune<'a, F>(&self, mut scan: F) -> Result<()>
    where
        F: FnMut() -> ScopeScan<'a>,
    {
        loop {
            let Some(page) = scan().next() else {
                return Ok(());
            };
            let page = page?;

            let mut batch = BackendBatch::new();
            for hit in &page {
                batch.delete(hit.id.as_str());
            }
            self.backend.commit_batch(batch)?;
        }
    }
}
