//! Scope-bounded page scans over the backend.
//!
//! A [`ScopeScan`] is an iterator of hit pages for one scope conjunction.
//! `from` starts at 0 and advances by each page's hit count until an empty
//! page ends the scan. Callers that delete while iterating shrink the
//! result set underneath the scan; that is acceptable because `from` only
//! grows, and exhaustive delete flows start a fresh scan per round.

use crate::core::backend::{BackendHit, QueryNode, SearchBackend, SearchRequest};
use crate::core::codec::{FIELD_ORGANIZATION, FIELD_PROJECT, FIELD_REFS, FIELD_REPOSITORY};
use crate::core::error::Result;

/// Hits requested per page
pub const SCAN_PAGE_SIZE: usize = 100;

/// Paged scan over all documents matching one scope query
pub struct ScopeScan<'a> {
    backend: &'a dyn SearchBackend,
    query: QueryNode,
    from: usize,
    done: bool,
}

impl<'a> ScopeScan<'a> {
    fn new(backend: &'a dyn SearchBackend, query: QueryNode) -> Self {
        Self {
            backend,
            query,
            from: 0,
            done: false,
        }
    }

    /// Every document of an organization
    pub fn organization(backend: &'a dyn SearchBackend, organization: &str) -> Self {
        Self::new(backend, QueryNode::term(FIELD_ORGANIZATION, organization))
    }

    /// Every document of a project
    pub fn project(backend: &'a dyn SearchBackend, organization: &str, project: &str) -> Self {
        Self::new(
            backend,
            QueryNode::And(vec![
                QueryNode::term(FIELD_ORGANIZATION, organization),
                QueryNode::term(FIELD_PROJECT, project),
            ]),
        )
    }

    /// Every document of a repository
    pub fn repository(
        backend: &'a dyn SearchBackend,
        organization: &str,
        project: &str,
        repository: &str,
    ) -> Self {
        Self::new(
            backend,
            scope_query(organization, project, repository),
        )
    }

    /// Every document of a repository whose ref set intersects `refs`
    pub fn refs(
        backend: &'a dyn SearchBackend,
        organization: &str,
        project: &str,
        repository: &str,
        refs: &[String],
    ) -> Self {
        let ref_terms = refs
            .iter()
            .map(|r| QueryNode::term(FIELD_REFS, r.clone()))
            .collect();
        Self::new(
            backend,
            QueryNode::And(vec![
                scope_query(organization, project, repository),
                QueryNode::Or(ref_terms),
            ]),
        )
    }
}

fn scope_query(organization: &str, project: &str, repository: &str) -> QueryNode {
    QueryNode::And(vec![
        QueryNode::term(FIELD_ORGANIZATION, organization),
        QueryNode::term(FIELD_PROJECT, project),
        QueryNode::term(FIELD_REPOSITORY, repository),
    ])
}

impl Iterator for ScopeScan<'_> {
    type Item = Result<Vec<BackendHit>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let request = SearchRequest::new(self.query.clone(), self.from, SCAN_PAGE_SIZE);
        match self.backend.search(&request) {
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
            Ok(page) => {
                if page.hits.is_empty() {
                    self.done = true;
                    return None;
                }
                self.from += page.hits.len();
                Some(Ok(page.hits))
            }
        }
    }
}
