//! Core data types for codesift.
//!
//! Defines the indexed document model (FileIndex), query-side filter and
//! result types, and the facet tree returned with every search.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

/// The `(organization, project, repository)` tuple qualifying a set of
/// documents. Components never contain `:` or `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub organization: String,
    pub project: String,
    pub repository: String,
}

impl Scope {
    pub fn new(
        organization: impl Into<String>,
        project: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self {
            organization: organization.into(),
            project: project.into(),
            repository: repository.into(),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}/{}",
            self.organization, self.project, self.repository
        )
    }
}

/// Identifying metadata of an indexed file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub organization: String,
    pub project: String,
    pub repository: String,

    /// Refs (branches/tags) that reach this blob. Unique, insertion-order
    /// preserved.
    pub refs: Vec<String>,

    /// File path at the referenced commit
    pub path: String,

    /// Lowercased path extension including the leading dot, or empty
    pub ext: String,
}

impl FileMetadata {
    pub fn scope(&self) -> Scope {
        Scope::new(&self.organization, &self.project, &self.repository)
    }
}

/// The indexed document: one per unique content blob within a scope.
///
/// `full_refs` is derived, one entry per ref, encoding the hierarchy as
/// `organization:project/repository:ref`. `content` is indexed for
/// full-text search but never stored; a FileIndex restored from the
/// backend carries an empty `content`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileIndex {
    pub blob: String,
    pub metadata: FileMetadata,
    #[serde(default)]
    pub full_refs: Vec<String>,
    #[serde(default)]
    pub content: String,
}

/// Query-time filter: optional extension set (disjunctive) plus optional
/// scope restrictions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterParams {
    #[serde(default)]
    pub ext: Vec<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub refs: Vec<String>,
}

/// Paging and cancellation knobs for one query execution
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub from: usize,
    pub size: Option<usize>,
    /// Query deadline. Checked between per-hit preview fetches; when
    /// exceeded, accumulated hits are returned as-is.
    pub deadline: Option<Instant>,
}

/// A contiguous run of file lines delivered with a hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewFragment {
    /// 1-based line number of the first line in the fragment
    pub offset: usize,
    pub preview: String,
}

/// The indexed-side identity of a hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitSource {
    pub blob: String,
    pub metadata: FileMetadata,
}

/// One search hit with its preview fragments and matched terms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hit {
    pub source: HitSource,
    pub preview: Vec<PreviewFragment>,
    pub keyword: Vec<String>,
}

/// A single `(term, count)` facet bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermFacet {
    pub term: String,
    pub count: u64,
}

/// Flat facet summary for one field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetResult {
    pub field: String,
    pub total: u64,
    pub missing: u64,
    pub other: u64,
    pub terms: Vec<TermFacet>,
}

/// Ref leaf of the facet tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefFacet {
    pub term: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryFacet {
    pub term: String,
    pub count: u64,
    pub refs: Vec<RefFacet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFacet {
    pub term: String,
    pub count: u64,
    pub repositories: Vec<RepositoryFacet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationFacet {
    pub term: String,
    pub count: u64,
    pub projects: Vec<ProjectFacet>,
}

/// Result of one query execution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub query: String,
    pub filter_params: FilterParams,
    pub hits: Vec<Hit>,

    /// Total matching documents reported by the backend (may exceed
    /// `hits.len()`)
    pub size: u64,

    pub facets: BTreeMap<String, FacetResult>,
    pub full_refs_facet: Vec<OrganizationFacet>,
    pub elapsed_seconds: f64,
}

impl SearchResult {
    /// The empty result returned when the query string fails to parse
    pub fn empty(query: &str, filter_params: &FilterParams) -> Self {
        Self {
            query: query.to_string(),
            filter_params: filter_params.clone(),
            hits: Vec::new(),
            size: 0,
            facets: BTreeMap::new(),
            full_refs_facet: Vec::new(),
            elapsed_seconds: 0.0,
        }
    }
}

/// Batch operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchMethod {
    Add,
    Delete,
}

/// One entry of a heterogeneous index batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileIndexOperation {
    pub method: BatchMethod,
    pub file_index: FileIndex,
}

impl FileIndexOperation {
    pub fn add(file_index: FileIndex) -> Self {
        Self {
            method: BatchMethod::Add,
            file_index,
        }
    }

    pub fn delete(file_index: FileIndex) -> Self {
        Self {
            method: BatchMethod::Delete,
            file_index,
        }
    }
}
