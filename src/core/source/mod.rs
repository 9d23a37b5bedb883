//! Repository source contract.
//!
//! The indexing and preview pipelines read repository contents through
//! this trait: ref enumeration, commit tree walks, and blob access. The
//! git implementation is in [`git`].

pub mod git;

pub use git::GitRepositorySource;

use crate::core::error::Result;
use crate::core::preview::{filter_lines, MAX_BLOB_SIZE};
use crate::core::types::{PreviewFragment, Scope};

/// One file reachable from a commit tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeFile {
    /// Path at the commit
    pub path: String,
    /// Content hash
    pub blob: String,
    /// Payload size in bytes
    pub size: u64,
}

/// Read access to the repositories backing the index
pub trait RepositorySource: Send + Sync {
    /// Enumerate the refs (branches and tags) of a repository
    fn refs(&self, scope: &Scope) -> Result<Vec<String>>;

    /// Resolve a ref to a commit and walk its tree
    fn tree(&self, scope: &Scope, ref_name: &str) -> Result<Vec<TreeFile>>;

    /// Read a blob's bytes by hash
    fn read_blob(&self, scope: &Scope, blob: &str) -> Result<Vec<u8>>;

    /// Preview extraction: fragments of lines satisfying `predicate` with
    /// `before`/`after` context lines, merged so no line repeats.
    ///
    /// Binary and oversized blobs yield an empty preview, as does any
    /// source failure (the hit survives without a preview).
    fn filter_blob(
        &self,
        scope: &Scope,
        blob: &str,
        predicate: &dyn Fn(&str) -> bool,
        before: usize,
        after: usize,
    ) -> Vec<PreviewFragment> {
        let bytes = match self.read_blob(scope, blob) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("preview read failed for {scope} blob {blob}: {e}");
                return Vec::new();
            }
        };
        if bytes.len() as u64 > MAX_BLOB_SIZE {
            return Vec::new();
        }
        match String::from_utf8(bytes) {
            Ok(content) => filter_lines(&content, predicate, before, after),
            Err(_) => Vec::new(),
        }
    }
}
