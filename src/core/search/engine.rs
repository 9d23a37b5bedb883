//! Query execution: filter composition, facet requests, per-hit
//! processing.
//!
//! The engine owns everything between the raw query string and the
//! response: preprocessing, attaching ext/scope filters, requesting the
//! `fullRefs` and `ext` facets, reconstructing each hit's document,
//! filling previews from the repository source, and folding the facet
//! tree. An unparseable query is an empty result, not a fault.

use crate::core::backend::{FacetRequest, QueryNode, SearchBackend, SearchRequest};
use crate::core::codec::{self, FIELD_EXT, FIELD_FULL_REFS, FIELD_ORGANIZATION, FIELD_PROJECT, FIELD_REFS, FIELD_REPOSITORY};
use crate::core::config::SearchConfig;
use crate::core::error::{Result, SiftError};
use crate::core::preview::keyword_predicate;
use crate::core::search::preprocess_query;
use crate::core::source::RepositorySource;
use crate::core::types::{
    FilterParams, Hit, HitSource, SearchOptions, SearchResult,
};
use crate::core::facets::build_full_refs_facet;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// Read-side facade over the backend and repository source
pub struct QueryEngine {
    backend: Arc<dyn SearchBackend>,
    source: Arc<dyn RepositorySource>,
    page_size: usize,
    facet_size: usize,
    preview_before: usize,
    preview_after: usize,
}

impl QueryEngine {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        source: Arc<dyn RepositorySource>,
        config: &SearchConfig,
    ) -> Self {
        Self {
            backend,
            source,
            page_size: config.page_size,
            facet_size: config.facet_size,
            preview_before: config.preview_before,
            preview_after: config.preview_after,
        }
    }

    /// Execute a query with default paging and no deadline
    pub fn search(&self, query: &str, filter_params: &FilterParams) -> Result<SearchResult> {
        self.search_opts(query, filter_params, &SearchOptions::default())
    }

    /// Execute a query
    pub fn search_opts(
        &self,
        query: &str,
        filter_params: &FilterParams,
        opts: &SearchOptions,
    ) -> Result<SearchResult> {
        let start = Instant::now();

        let mut request = SearchRequest::new(
            self.compose_query(query, filter_params),
            opts.from,
            opts.size.unwrap_or(self.page_size),
        );
        request.facets = vec![
            FacetRequest {
                field: FIELD_FULL_REFS.to_string(),
                size: self.facet_size,
            },
            FacetRequest {
                field: FIELD_EXT.to_string(),
                size: self.facet_size,
            },
        ];

        let page = match self.backend.search(&request) {
            Ok(page) => page,
            Err(SiftError::Parse(e)) => {
                tracing::warn!("query parse error for {query:?}: {e}");
                return Ok(SearchResult::empty(query, filter_params));
            }
            Err(e) => return Err(e),
        };

        let mut hits = Vec::with_capacity(page.hits.len());
        for backend_hit in &page.hits {
            if let Some(deadline) = opts.deadline {
                if Instant::now() >= deadline {
                    tracing::debug!(
                        "deadline hit after {} of {} hits",
                        hits.len(),
                        page.hits.len()
                    );
                    break;
                }
            }

            match self.build_hit(&backend_hit.id, &backend_hit.keywords) {
                Ok(hit) => hits.push(hit),
                Err(e) if e.is_not_found() => {
                    tracing::warn!("already deleted from index? id: {}", backend_hit.id);
                }
                Err(e) => {
                    tracing::warn!("dropping hit {}: {e}", backend_hit.id);
                }
            }
        }

        let full_refs_facet = page
            .facets
            .get(FIELD_FULL_REFS)
            .map(|facet| build_full_refs_facet(&facet.terms))
            .unwrap_or_default();

        let facets: BTreeMap<_, _> = page.facets.into_iter().collect();

        Ok(SearchResult {
            query: query.to_string(),
            filter_params: filter_params.clone(),
            hits,
            size: page.total,
            facets,
            full_refs_facet,
            elapsed_seconds: start.elapsed().as_secs_f64(),
        })
    }

    /// Conjoin the parsed query with the ext disjunction and any scope
    /// filters
    fn compose_query(&self, query: &str, filter_params: &FilterParams) -> QueryNode {
        let mut clauses = vec![QueryNode::QueryString(preprocess_query(query))];

        let ext_terms: Vec<QueryNode> = filter_params
            .ext
            .iter()
            .filter(|ext| !ext.is_empty())
            .map(|ext| QueryNode::term(FIELD_EXT, ext.clone()))
            .collect();
        if !ext_terms.is_empty() {
            clauses.push(QueryNode::Or(ext_terms));
        }

        if let Some(organization) = &filter_params.organization {
            clauses.push(QueryNode::term(FIELD_ORGANIZATION, organization.clone()));
        }
        if let Some(project) = &filter_params.project {
            clauses.push(QueryNode::term(FIELD_PROJECT, project.clone()));
        }
        if let Some(repository) = &filter_params.repository {
            clauses.push(QueryNode::term(FIELD_REPOSITORY, repository.clone()));
        }

        let ref_terms: Vec<QueryNode> = filter_params
            .refs
            .iter()
            .filter(|r| !r.is_empty())
            .map(|r| QueryNode::term(FIELD_REFS, r.clone()))
            .collect();
        if !ref_terms.is_empty() {
            clauses.push(QueryNode::Or(ref_terms));
        }

        if clauses.len() == 1 {
            clauses.swap_remove(0)
        } else {
            QueryNode::And(clauses)
        }
    }

    /// Reconstruct one hit: document fetch, codec decode, preview fill
    fn build_hit(&self, id: &str, keywords: &[String]) -> Result<Hit> {
        let fields = self
            .backend
            .get(id)?
            .ok_or_else(|| SiftError::NotFound(id.to_string()))?;
        let file_index = codec::decode(&fields)?;

        let scope = file_index.metadata.scope();
        let predicate = keyword_predicate(keywords);
        let preview = self.source.filter_blob(
            &scope,
            &file_index.blob,
            &predicate,
            self.preview_before,
            self.preview_after,
        );

        Ok(Hit {
            source: HitSource {
                blob: file_index.blob,
                metadata: file_index.metadata,
            },
            preview,
            keyword: keywords.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Engine behavior over a real backend and git fixtures is covered by
    // the crate integration tests; these exercise query composition.

    struct NullSource;

    impl RepositorySource for NullSource {
        fn refs(&self, _: &crate::core::types::Scope) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
        fn tree(
            &self,
            _: &crate::core::types::Scope,
            _: &str,
        ) -> Result<Vec<crate::core::source::TreeFile>> {
            Ok(Vec::new())
        }
        fn read_blob(&self, _: &crate::core::types::Scope, _: &str) -> Result<Vec<u8>> {
            Err(SiftError::Source("empty".to_string()))
        }
    }

    struct NullBackend;

    impl SearchBackend for NullBackend {
        fn get(&self, _: &str) -> Result<Option<Vec<codec::FieldEntry>>> {
            Ok(None)
        }
        fn index(&self, _: &str, _: &[codec::FieldEntry]) -> Result<()> {
            Ok(())
        }
        fn delete(&self, _: &str) -> Result<()> {
            Ok(())
        }
        fn commit_batch(&self, _: crate::core::backend::BackendBatch) -> Result<()> {
            Ok(())
        }
        fn search(
            &self,
            _: &SearchRequest,
        ) -> Result<crate::core::backend::SearchPage> {
            Ok(crate::core::backend::SearchPage::default())
        }
    }

    fn engine() -> QueryEngine {
        QueryEngine::new(
            Arc::new(NullBackend),
            Arc::new(NullSource),
            &SearchConfig::default(),
        )
    }

    #[test]
    fn bare_query_is_a_single_query_string() {
        let node = engine().compose_query("hello", &FilterParams::default());
        assert_eq!(node, QueryNode::QueryString("hello".to_string()));
    }

    #[test]
    fn ext_filter_is_disjunctive_and_conjoined() {
        let filter = FilterParams {
            ext: vec![".go".to_string(), ".rs".to_string()],
            ..Default::default()
        };
        let node = engine().compose_query("hello", &filter);

        let QueryNode::And(clauses) = node else {
            panic!("expected conjunction");
        };
        assert_eq!(clauses.len(), 2);
        assert_eq!(
            clauses[1],
            QueryNode::Or(vec![
                QueryNode::term(FIELD_EXT, ".go"),
                QueryNode::term(FIELD_EXT, ".rs"),
            ])
        );
    }

    #[test]
    fn empty_ext_entries_are_ignored() {
        let filter = FilterParams {
            ext: vec![String::new()],
            ..Default::default()
        };
        let node = engine().compose_query("hello", &filter);
        assert_eq!(node, QueryNode::QueryString("hello".to_string()));
    }

    #[test]
    fn scope_filters_conjoin() {
        let filter = FilterParams {
            organization: Some("orgA".to_string()),
            repository: Some("repoA".to_string()),
            refs: vec!["main".to_string()],
            ..Default::default()
        };
        let node = engine().compose_query("hello", &filter);

        let QueryNode::And(clauses) = node else {
            panic!("expected conjunction");
        };
        assert_eq!(clauses.len(), 4);
        assert!(clauses.contains(&QueryNode::term(FIELD_ORGANIZATION, "orgA")));
        assert!(clauses.contains(&QueryNode::term(FIELD_REPOSITORY, "repoA")));
        assert!(clauses.contains(&QueryNode::Or(vec![QueryNode::term(FIELD_REFS, "main")])));
    }

    #[test]
    fn query_text_is_preprocessed() {
        let node = engine().compose_query("std::io::Read", &FilterParams::default());
        assert_eq!(
            node,
            QueryNode::QueryString("\"std::io::Read\"".to_string())
        );
    }
}
