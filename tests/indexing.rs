//! End-to-end indexing tests over real git repositories: ref-set merging,
//! ref deletion, and the document invariants.

mod common;

use codesift::core::backend::SearchBackend;
use codesift::core::codec;
use codesift::core::refset::doc_id;
use codesift::core::source::RepositorySource;
use codesift::core::types::{FileIndex, Scope};
use common::{commit_files, create_branch, test_env};

fn scope() -> Scope {
    Scope::new("acme", "platform", "api")
}

/// Fetch the stored document for a blob, if any
fn stored(env: &common::TestEnv, scope: &Scope, blob: &str) -> Option<FileIndex> {
    let mut probe = FileIndex::default();
    probe.blob = blob.to_string();
    probe.metadata.organization = scope.organization.clone();
    probe.metadata.project = scope.project.clone();
    probe.metadata.repository = scope.repository.clone();

    env.services
        .backend
        .get(&doc_id(&probe))
        .unwrap()
        .map(|fields| codec::decode(&fields).unwrap())
}

fn blob_of(env: &common::TestEnv, scope: &Scope, ref_name: &str, path: &str) -> String {
    env.services
        .source
        .tree(scope, ref_name)
        .unwrap()
        .into_iter()
        .find(|f| f.path == path)
        .unwrap()
        .blob
}

#[test]
fn two_branches_same_content_share_one_document() {
    let env = test_env();
    let scope = scope();
    env.init_repo(&scope);
    commit_files(&env, &scope, "main", &[("README.md", "hello world\n")]);
    create_branch(&env, &scope, "dev", "main");

    env.services.importer.import_ref(&scope, "main").unwrap();
    env.services.importer.import_ref(&scope, "dev").unwrap();

    let blob = blob_of(&env, &scope, "main", "README.md");
    let doc = stored(&env, &scope, &blob).unwrap();

    assert_eq!(doc.metadata.refs, vec!["main", "dev"]);
    assert_eq!(
        doc.full_refs,
        vec![
            "acme:platform/api:main".to_string(),
            "acme:platform/api:dev".to_string()
        ]
    );
    assert_eq!(doc.metadata.path, "README.md");
    assert_eq!(doc.metadata.ext, ".md");
}

#[test]
fn delete_one_branch_reduces_ref_set() {
    let env = test_env();
    let scope = scope();
    env.init_repo(&scope);
    commit_files(&env, &scope, "main", &[("README.md", "hello world\n")]);
    create_branch(&env, &scope, "dev", "main");
    env.services.importer.import_ref(&scope, "main").unwrap();
    env.services.importer.import_ref(&scope, "dev").unwrap();

    env.services
        .indexer
        .delete_index_by_refs("acme", "platform", "api", &["main".to_string()])
        .unwrap();

    let blob = blob_of(&env, &scope, "dev", "README.md");
    let doc = stored(&env, &scope, &blob).unwrap();
    assert_eq!(doc.metadata.refs, vec!["dev"]);
    assert_eq!(doc.full_refs, vec!["acme:platform/api:dev"]);
}

#[test]
fn delete_last_branch_removes_document() {
    let env = test_env();
    let scope = scope();
    env.init_repo(&scope);
    commit_files(&env, &scope, "main", &[("README.md", "hello world\n")]);
    create_branch(&env, &scope, "dev", "main");
    env.services.importer.import_ref(&scope, "main").unwrap();
    env.services.importer.import_ref(&scope, "dev").unwrap();

    let blob = blob_of(&env, &scope, "main", "README.md");

    env.services
        .indexer
        .delete_index_by_refs("acme", "platform", "api", &["main".to_string()])
        .unwrap();
    assert!(stored(&env, &scope, &blob).is_some());

    env.services
        .indexer
        .delete_index_by_refs("acme", "platform", "api", &["dev".to_string()])
        .unwrap();
    assert!(stored(&env, &scope, &blob).is_none());
}

#[test]
fn import_repository_covers_branches_and_tags() {
    let env = test_env();
    let scope = scope();
    env.init_repo(&scope);
    commit_files(&env, &scope, "main", &[("a.go", "package a\n")]);

    let repo = git2::Repository::open(env.repo_dir(&scope)).unwrap();
    {
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        repo.tag_lightweight("v1.0", head.as_object(), false).unwrap();
    }
    drop(repo);

    let stats = env.services.importer.import_repository(&scope).unwrap();
    assert_eq!(stats.refs_imported, 2);

    let blob = blob_of(&env, &scope, "main", "a.go");
    let doc = stored(&env, &scope, &blob).unwrap();
    let mut refs = doc.metadata.refs.clone();
    refs.sort();
    assert_eq!(refs, vec!["main", "v1.0"]);
}

#[test]
fn documents_keep_refs_and_full_refs_aligned() {
    let env = test_env();
    let scope = scope();
    env.init_repo(&scope);
    commit_files(
        &env,
        &scope,
        "main",
        &[("a.go", "package a\n"), ("b.go", "package b\n")],
    );
    create_branch(&env, &scope, "dev", "main");
    commit_files(&env, &scope, "dev", &[("c.go", "package c\n")]);

    env.services.importer.import_repository(&scope).unwrap();
    env.services
        .indexer
        .delete_index_by_refs("acme", "platform", "api", &["dev".to_string()])
        .unwrap();

    // Every surviving document satisfies the ref invariants
    for path in ["a.go", "b.go"] {
        let blob = blob_of(&env, &scope, "main", path);
        let doc = stored(&env, &scope, &blob).unwrap();
        assert!(!doc.metadata.refs.is_empty());
        assert_eq!(doc.metadata.refs.len(), doc.full_refs.len());
        for (r, fr) in doc.metadata.refs.iter().zip(doc.full_refs.iter()) {
            assert!(fr.ends_with(&format!(":{r}")), "{fr} does not end with :{r}");
        }
    }

    // The dev-only file lost its last ref
    let blob = blob_of(&env, &scope, "dev", "c.go");
    assert!(stored(&env, &scope, &blob).is_none());
}

#[test]
fn same_blob_in_two_repositories_is_two_documents() {
    let env = test_env();
    let api = scope();
    let web = Scope::new("acme", "platform", "web");
    env.init_repo(&api);
    env.init_repo(&web);
    commit_files(&env, &api, "main", &[("README.md", "shared text\n")]);
    commit_files(&env, &web, "main", &[("README.md", "shared text\n")]);

    env.services.importer.import_repository(&api).unwrap();
    env.services.importer.import_repository(&web).unwrap();

    let blob = blob_of(&env, &api, "main", "README.md");
    assert_eq!(blob, blob_of(&env, &web, "main", "README.md"));

    assert!(stored(&env, &api, &blob).is_some());
    assert!(stored(&env, &web, &blob).is_some());
}
