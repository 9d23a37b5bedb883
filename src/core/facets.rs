//! Hierarchical ref facet folding.
//!
//! The backend reports the `fullRefs` facet as a flat list of terms at all
//! four hierarchy levels:
//!
//! - `organization`
//! - `organization:project`
//! - `organization:project/repository`
//! - `organization:project/repository:ref`
//!
//! [`build_full_refs_facet`] folds that list into the
//! Organization→Project→Repository→Ref tree. Parents are looked up by
//! lexical truncation of the child's term; an orphan child is a
//! data-integrity error and is dropped with a warning. Children sort by
//! count descending, then term ascending.

use crate::core::types::{
    OrganizationFacet, ProjectFacet, RefFacet, RepositoryFacet, TermFacet,
};
use std::collections::HashMap;

/// Hierarchy level of one facet term, with its display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermLevel {
    Organization(String),
    Project(String),
    Repository(String),
    Ref(String),
}

/// Classify a facet term by its shape. Returns None for terms that fit no
/// level (e.g. more than two colons without a slash).
pub fn classify(term: &str) -> Option<TermLevel> {
    let colons = term.matches(':').count();
    let has_slash = term.contains('/');

    match (colons, has_slash) {
        (0, false) => Some(TermLevel::Organization(term.to_string())),
        (1, false) => {
            let project = term.split(':').nth(1)?;
            Some(TermLevel::Project(project.to_string()))
        }
        (1, true) => {
            let repository = term.split('/').nth(1)?;
            Some(TermLevel::Repository(repository.to_string()))
        }
        (2, true) => {
            let ref_name = &term[term.rfind(':')? + 1..];
            Some(TermLevel::Ref(ref_name.to_string()))
        }
        _ => None,
    }
}

/// All hierarchy terms a single full ref contributes facet counts to,
/// shallowest first. This is the backend's "hierarchical" analysis of the
/// `fullRefs` field.
pub fn hierarchy_terms(full_ref: &str) -> Vec<String> {
    let mut terms = Vec::with_capacity(4);

    let Some(colon) = full_ref.find(':') else {
        terms.push(full_ref.to_string());
        return terms;
    };
    terms.push(full_ref[..colon].to_string());

    if let Some(slash) = full_ref.find('/') {
        terms.push(full_ref[..slash].to_string());
        if let Some(last_colon) = full_ref.rfind(':') {
            if last_colon > colon {
                terms.push(full_ref[..last_colon].to_string());
            }
        }
    }
    terms.push(full_ref.to_string());
    terms
}

/// Fold a flat `(term, count)` list into the facet tree
pub fn build_full_refs_facet(terms: &[TermFacet]) -> Vec<OrganizationFacet> {
    let mut organizations: HashMap<String, OrganizationFacet> = HashMap::new();
    let mut projects: HashMap<String, ProjectFacet> = HashMap::new();
    let mut repositories: HashMap<String, RepositoryFacet> = HashMap::new();
    let mut refs: HashMap<String, RefFacet> = HashMap::new();

    for tf in terms {
        match classify(&tf.term) {
            Some(TermLevel::Organization(name)) => {
                organizations.insert(
                    tf.term.clone(),
                    OrganizationFacet {
                        term: name,
                        count: tf.count,
                        projects: Vec::new(),
                    },
                );
            }
            Some(TermLevel::Project(name)) => {
                projects.insert(
                    tf.term.clone(),
                    ProjectFacet {
                        term: name,
                        count: tf.count,
                        repositories: Vec::new(),
                    },
                );
            }
            Some(TermLevel::Repository(name)) => {
                repositories.insert(
                    tf.term.clone(),
                    RepositoryFacet {
                        term: name,
                        count: tf.count,
                        refs: Vec::new(),
                    },
                );
            }
            Some(TermLevel::Ref(name)) => {
                refs.insert(
                    tf.term.clone(),
                    RefFacet {
                        term: name,
                        count: tf.count,
                    },
                );
            }
            None => {
                tracing::warn!("unclassifiable facet term {:?} dropped", tf.term);
            }
        }
    }

    // Link children to parents by lexical truncation of the full term.
    for (key, r) in refs {
        let parent_key = &key[..key.rfind(':').unwrap_or(0)];
        match repositories.get_mut(parent_key) {
            Some(parent) => parent.refs.push(r),
            None => tracing::warn!("ref facet {key:?} has no repository parent"),
        }
    }

    for (key, repo) in repositories {
        let parent_key = key.split('/').next().unwrap_or_default();
        match projects.get_mut(parent_key) {
            Some(parent) => parent.repositories.push(repo),
            None => tracing::warn!("repository facet {key:?} has no project parent"),
        }
    }

    for (key, project) in projects {
        let parent_key = key.split(':').next().unwrap_or_default();
        match organizations.get_mut(parent_key) {
            Some(parent) => parent.projects.push(project),
            None => tracing::warn!("project facet {key:?} has no organization parent"),
        }
    }

    let mut out: Vec<OrganizationFacet> = organizations.into_values().collect();
    for org in &mut out {
        for project in &mut org.projects {
            for repo in &mut project.repositories {
                repo.refs
                    .sort_by(|a, b| b.count.cmp(&a.count).then(a.term.cmp(&b.term)));
            }
            project
                .repositories
                .sort_by(|a, b| b.count.cmp(&a.count).then(a.term.cmp(&b.term)));
        }
        org.projects
            .sort_by(|a, b| b.count.cmp(&a.count).then(a.term.cmp(&b.term)));
    }
    out.sort_by(|a, b| b.count.cmp(&a.count).then(a.term.cmp(&b.term)));
    out
}
