//! Git repository fixtures for integration tests.
//!
//! Each test gets a temp data dir holding real git repositories at
//! `<data_dir>/<org>/<project>/<repo>` plus the tantivy index the
//! services open under `<data_dir>/index`.

use codesift::core::config::Config;
use codesift::core::services::Services;
use codesift::core::types::Scope;
use git2::{BranchType, Repository, RepositoryInitOptions, Signature};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub struct TestEnv {
    pub services: Services,
    // Held for the lifetime of the test
    pub tmp: TempDir,
}

impl TestEnv {
    pub fn repo_dir(&self, scope: &Scope) -> std::path::PathBuf {
        self.tmp
            .path()
            .join(&scope.organization)
            .join(&scope.project)
            .join(&scope.repository)
    }

    /// Initialize an empty repository for `scope` with `main` as the
    /// initial branch
    pub fn init_repo(&self, scope: &Scope) {
        let dir = self.repo_dir(scope);
        fs::create_dir_all(&dir).unwrap();
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        Repository::init_opts(&dir, &opts).unwrap();
    }
}

/// Services over a fresh temp data dir
pub fn test_env() -> TestEnv {
    let tmp = TempDir::new().unwrap();
    let mut config = Config::default();
    config.data_dir = tmp.path().to_path_buf();

    let services = Services::new(config).unwrap();
    TestEnv { services, tmp }
}

/// Commit `files` onto `branch`, creating the branch ref if needed
pub fn commit_files(env: &TestEnv, scope: &Scope, branch: &str, files: &[(&str, &str)]) {
    let repo_dir = env.repo_dir(scope);
    let repo = Repository::open(&repo_dir).unwrap();

    for (path, content) in files {
        let full = repo_dir.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full, content).unwrap();
    }

    let mut index = repo.index().unwrap();
    for (path, _) in files {
        index.add_path(Path::new(path)).unwrap();
    }
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let sig = Signature::now("tester", "tester@example.com").unwrap();
    let parent = repo
        .find_branch(branch, BranchType::Local)
        .ok()
        .and_then(|b| b.get().peel_to_commit().ok());
    let parents: Vec<_> = parent.iter().collect();

    let refname = format!("refs/heads/{branch}");
    repo.commit(Some(&refname), &sig, &sig, "commit", &tree, &parents)
        .unwrap();
}

/// Create `branch` at the current tip of `from`
pub fn create_branch(env: &TestEnv, scope: &Scope, branch: &str, from: &str) {
    let repo = Repository::open(env.repo_dir(scope)).unwrap();
    let target = repo
        .find_branch(from, BranchType::Local)
        .unwrap()
        .get()
        .peel_to_commit()
        .unwrap();
    repo.branch(branch, &target, false).unwrap();
}
