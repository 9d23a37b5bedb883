//! Abstract search backend contract.
//!
//! The core never sees backend-native query or document types. Documents
//! cross the boundary as [`FieldEntry`] lists (see [`crate::core::codec`]),
//! queries as a small composable [`QueryNode`] tree, and batches as a
//! plain [`BackendBatch`] accumulator the backend commits in one shot.

mod tantivy;

pub use self::tantivy::TantivyBackend;

use crate::core::codec::FieldEntry;
use crate::core::error::Result;
use crate::core::types::FacetResult;
use std::collections::HashMap;

/// Backend-agnostic query tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryNode {
    /// Free-form query string, parsed by the backend's query parser with
    /// conjunction as the default operator
    QueryString(String),
    /// Exact term match on a keyword field
    Term { field: String, value: String },
    And(Vec<QueryNode>),
    Or(Vec<QueryNode>),
}

impl QueryNode {
    pub fn term(field: &str, value: impl Into<String>) -> Self {
        QueryNode::Term {
            field: field.to_string(),
            value: value.into(),
        }
    }
}

/// Facet request: term buckets over one field
#[derive(Debug, Clone)]
pub struct FacetRequest {
    pub field: String,
    pub size: usize,
}

/// One page request against the backend
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: QueryNode,
    pub from: usize,
    pub size: usize,
    pub facets: Vec<FacetRequest>,
}

impl SearchRequest {
    pub fn new(query: QueryNode, from: usize, size: usize) -> Self {
        Self {
            query,
            from,
            size,
            facets: Vec::new(),
        }
    }
}

/// One backend hit: the document id plus the analyzed content-field terms
/// the query matched on
#[derive(Debug, Clone)]
pub struct BackendHit {
    pub id: String,
    pub keywords: Vec<String>,
}

/// One page of backend results
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub hits: Vec<BackendHit>,
    pub total: u64,
    pub facets: HashMap<String, FacetResult>,
}

/// One pending batch operation
#[derive(Debug, Clone)]
pub enum BatchOp {
    Index { id: String, fields: Vec<FieldEntry> },
    Delete { id: String },
}

/// Accumulator for a multi-document batch. Ordering is preserved; the
/// whole batch is applied by a single [`SearchBackend::commit_batch`].
#[derive(Debug, Clone, Default)]
pub struct BackendBatch {
    ops: Vec<BatchOp>,
}

impl BackendBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&mut self, id: impl Into<String>, fields: Vec<FieldEntry>) {
        self.ops.push(BatchOp::Index {
            id: id.into(),
            fields,
        });
    }

    pub fn delete(&mut self, id: impl Into<String>) {
        self.ops.push(BatchOp::Delete { id: id.into() });
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }
}

/// The contract the indexing and query pipelines are written against.
///
/// Single-document writes are visible to subsequent reads of the same id
/// once the call returns. Batches become visible atomically on commit.
pub trait SearchBackend: Send + Sync {
    /// Fetch a stored document's fields, or None when absent
    fn get(&self, doc_id: &str) -> Result<Option<Vec<FieldEntry>>>;

    /// Write one document, replacing any previous version
    fn index(&self, doc_id: &str, fields: &[FieldEntry]) -> Result<()>;

    /// Delete one document; deleting an absent id is not an error
    fn delete(&self, doc_id: &str) -> Result<()>;

    /// Apply an accumulated batch in order and commit once
    fn commit_batch(&self, batch: BackendBatch) -> Result<()>;

    /// Execute one paged search
    fn search(&self, request: &SearchRequest) -> Result<SearchPage>;
}
