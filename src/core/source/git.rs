//! Git implementation of the repository source.
//!
//! Repositories live at `<data_dir>/<organization>/<project>/<repository>`
//! (bare or with a worktree). All access goes through libgit2; nothing is
//! shelled out.

use crate::core::error::{Result, SiftError};
use crate::core::preview::{filter_lines, MAX_BLOB_SIZE};
use crate::core::source::{RepositorySource, TreeFile};
use crate::core::types::{PreviewFragment, Scope};
use git2::{BranchType, ObjectType, Oid, Repository, TreeWalkMode, TreeWalkResult};
use std::path::PathBuf;

/// Repository source over a directory tree of git repositories
pub struct GitRepositorySource {
    data_dir: PathBuf,
}

impl GitRepositorySource {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// On-disk location of a repository
    pub fn repo_path(&self, scope: &Scope) -> PathBuf {
        self.data_dir
            .join(&scope.organization)
            .join(&scope.project)
            .join(&scope.repository)
    }

    fn open_repo(&self, scope: &Scope) -> Result<Repository> {
        let path = self.repo_path(scope);
        Repository::open(&path)
            .map_err(|e| SiftError::Source(format!("cannot open {}: {}", scope, e.message())))
    }
}

impl RepositorySource for GitRepositorySource {
    fn refs(&self, scope: &Scope) -> Result<Vec<String>> {
        let repo = self.open_repo(scope)?;
        let mut refs = Vec::new();

        for branch in repo.branches(Some(BranchType::Local))? {
            let (branch, _) = branch?;
            if let Some(name) = branch.name()? {
                refs.push(name.to_string());
            }
        }

        for tag in repo.tag_names(None)?.iter().flatten() {
            refs.push(tag.to_string());
        }

        Ok(refs)
    }

    fn tree(&self, scope: &Scope, ref_name: &str) -> Result<Vec<TreeFile>> {
        let repo = self.open_repo(scope)?;
        let commit = repo
            .revparse_single(ref_name)
            .and_then(|obj| obj.peel_to_commit())
            .map_err(|e| {
                SiftError::Source(format!(
                    "cannot resolve {ref_name} in {scope}: {}",
                    e.message()
                ))
            })?;
        let tree = commit.tree()?;
        let odb = repo.odb()?;

        let mut files = Vec::new();
        tree.walk(TreeWalkMode::PreOrder, |root, entry| {
            if entry.kind() == Some(ObjectType::Blob) {
                if let Some(name) = entry.name() {
                    let size = odb
                        .read_header(entry.id())
                        .map(|(size, _)| size as u64)
                        .unwrap_or(0);
                    files.push(TreeFile {
                        path: format!("{root}{name}"),
                        blob: entry.id().to_string(),
                        size,
                    });
                }
            }
            TreeWalkResult::Ok
        })?;

        Ok(files)
    }

    fn read_blob(&self, scope: &Scope, blob: &str) -> Result<Vec<u8>> {
        let repo = self.open_repo(scope)?;
        let oid = Oid::from_str(blob)
            .map_err(|e| SiftError::Source(format!("bad blob hash {blob}: {}", e.message())))?;
        let blob = repo
            .find_blob(oid)
            .map_err(|e| SiftError::Source(format!("blob {oid} in {scope}: {}", e.message())))?;
        Ok(blob.content().to_vec())
    }

    fn filter_blob(
        &self,
        scope: &Scope,
        blob: &str,
        predicate: &dyn Fn(&str) -> bool,
        before: usize,
        after: usize,
    ) -> Vec<PreviewFragment> {
        // Native implementation: libgit2 knows binaryness and size without
        // copying the payload out first.
        let repo = match self.open_repo(scope) {
            Ok(repo) => repo,
            Err(e) => {
                tracing::warn!("preview open failed for {scope}: {e}");
                return Vec::new();
            }
        };
        let Ok(oid) = Oid::from_str(blob) else {
            return Vec::new();
        };
        let blob = match repo.find_blob(oid) {
            Ok(blob) => blob,
            Err(e) => {
                tracing::warn!("preview blob {oid} missing in {scope}: {}", e.message());
                return Vec::new();
            }
        };

        if blob.is_binary() || blob.size() as u64 > MAX_BLOB_SIZE {
            return Vec::new();
        }
        match std::str::from_utf8(blob.content()) {
            Ok(content) => filter_lines(content, predicate, before, after),
            Err(_) => Vec::new(),
        }
    }
}
