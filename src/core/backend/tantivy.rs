//! Tantivy implementation of the search backend contract.
//!
//! The schema is a constant built in code: keyword fields for identity and
//! metadata, one tokenized `content` field (indexed, not stored), and an
//! `indexed_at` timestamp owned by this backend. The `fullRefs` field is
//! mapped hierarchically for faceting: each stored value also counts
//! toward its organization, project, and repository prefix terms.

use crate::core::backend::{
    BackendBatch, BackendHit, BatchOp, FacetRequest, QueryNode, SearchBackend, SearchPage,
    SearchRequest,
};
use crate::core::codec::{
    FieldEntry, FIELD_BLOB, FIELD_CONTENT, FIELD_EXT, FIELD_FULL_REFS, FIELD_ORGANIZATION,
    FIELD_PATH, FIELD_PROJECT, FIELD_REFS, FIELD_REPOSITORY,
};
use crate::core::error::{Result, SiftError};
use crate::core::facets::hierarchy_terms;
use crate::core::types::{FacetResult, TermFacet};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use tantivy::collector::{Count, DocSetCollector, TopDocs};
use tantivy::directory::MmapDirectory;
use tantivy::query::{BooleanQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::{
    Field, IndexRecordOption, Schema, Value, STORED, STRING, TEXT,
};
use tantivy::{DocAddress, Index, IndexWriter, TantivyDocument, Term};

/// Internal keyword field carrying the document id
const FIELD_ID: &str = "id";

/// Writer heap size
const WRITER_HEAP_BYTES: usize = 50_000_000;

/// Build the index schema.
///
/// `content` is the only tokenized field; everything else is stored as a
/// raw keyword so term filters and the codec see exact values.
pub fn create_schema() -> Schema {
    let mut builder = Schema::builder();

    builder.add_text_field(FIELD_ID, STRING | STORED);
    builder.add_text_field(FIELD_BLOB, STRING | STORED);
    builder.add_text_field(FIELD_CONTENT, TEXT);
    builder.add_text_field(FIELD_FULL_REFS, STRING | STORED);
    builder.add_text_field(FIELD_ORGANIZATION, STRING | STORED);
    builder.add_text_field(FIELD_PROJECT, STRING | STORED);
    builder.add_text_field(FIELD_REPOSITORY, STRING | STORED);
    builder.add_text_field(FIELD_REFS, STRING | STORED);
    builder.add_text_field(FIELD_PATH, STRING | STORED);
    builder.add_text_field(FIELD_EXT, STRING | STORED);
    builder.add_date_field("indexed_at", STORED);

    builder.build()
}

/// Resolved schema fields
struct SchemaFields {
    id: Field,
    content: Field,
    indexed_at: Field,
    /// Stored text fields by contract name, in codec emission order
    stored: Vec<(&'static str, Field)>,
}

/// Tantivy-backed search index
pub struct TantivyBackend {
    index: Index,
    fields: SchemaFields,
    writer: Mutex<IndexWriter>,
}

impl std::fmt::Debug for TantivyBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TantivyBackend").finish()
    }
}

impl TantivyBackend {
    /// Open the index at `index_dir`, creating it if absent
    pub fn open(index_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(index_dir)?;

        let schema = create_schema();
        let dir = MmapDirectory::open(index_dir)
            .map_err(|e| SiftError::Backend(format!("failed to open index dir: {e}")))?;
        let index = Index::open_or_create(dir, schema.clone())
            .map_err(|e| SiftError::Backend(format!("failed to open index: {e}")))?;

        let writer = index
            .writer(WRITER_HEAP_BYTES)
            .map_err(|e| SiftError::Backend(format!("failed to create writer: {e}")))?;

        let fields = Self::resolve_fields(&schema)?;

        Ok(Self {
            index,
            fields,
            writer: Mutex::new(writer),
        })
    }

    fn resolve_fields(schema: &Schema) -> Result<SchemaFields> {
        let get = |name: &str| {
            schema
                .get_field(name)
                .map_err(|e| SiftError::Backend(format!("missing schema field {name}: {e}")))
        };

        let stored = vec![
            (FIELD_BLOB, get(FIELD_BLOB)?),
            (FIELD_ORGANIZATION, get(FIELD_ORGANIZATION)?),
            (FIELD_PROJECT, get(FIELD_PROJECT)?),
            (FIELD_REPOSITORY, get(FIELD_REPOSITORY)?),
            (FIELD_PATH, get(FIELD_PATH)?),
            (FIELD_EXT, get(FIELD_EXT)?),
            (FIELD_REFS, get(FIELD_REFS)?),
            (FIELD_FULL_REFS, get(FIELD_FULL_REFS)?),
        ];

        Ok(SchemaFields {
            id: get(FIELD_ID)?,
            content: get(FIELD_CONTENT)?,
            indexed_at: get("indexed_at")?,
            stored,
        })
    }

    fn field_by_name(&self, name: &str) -> Result<Field> {
        if name == FIELD_CONTENT {
            return Ok(self.fields.content);
        }
        self.fields
            .stored
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, f)| *f)
            .ok_or_else(|| SiftError::Backend(format!("unknown field {name}")))
    }

    /// Build a tantivy document from codec field entries. Entries with
    /// unknown names are dropped with a warning.
    fn build_document(&self, doc_id: &str, entries: &[FieldEntry]) -> TantivyDocument {
        let mut doc = TantivyDocument::new();
        doc.add_text(self.fields.id, doc_id);

        for entry in entries {
            if entry.name == FIELD_CONTENT {
                doc.add_text(self.fields.content, &entry.value);
                continue;
            }
            match self.field_by_name(&entry.name) {
                Ok(field) => doc.add_text(field, &entry.value),
                Err(_) => {
                    tracing::warn!("dropping entry for unknown field {:?}", entry.name);
                }
            }
        }

        doc.add_date(
            self.fields.indexed_at,
            tantivy::DateTime::from_timestamp_secs(Utc::now().timestamp()),
        );
        doc
    }

    /// Extract codec field entries from a stored document
    fn document_entries(&self, doc: &TantivyDocument) -> Vec<FieldEntry> {
        let mut entries = Vec::new();
        for (name, field) in &self.fields.stored {
            for (position, value) in doc.get_all(*field).enumerate() {
                if let Some(text) = value.as_str() {
                    entries.push(FieldEntry::new(name, text, position));
                }
            }
        }
        entries
    }

    fn searcher(&self) -> Result<tantivy::Searcher> {
        let reader = self
            .index
            .reader()
            .map_err(|e| SiftError::Backend(format!("failed to create reader: {e}")))?;
        Ok(reader.searcher())
    }

    fn id_term(&self, doc_id: &str) -> Term {
        Term::from_field_text(self.fields.id, doc_id)
    }

    fn build_query(&self, node: &QueryNode) -> Result<Box<dyn Query>> {
        match node {
            QueryNode::QueryString(q) => {
                let mut parser =
                    QueryParser::for_index(&self.index, vec![self.fields.content]);
                parser.set_conjunction_by_default();
                parser
                    .parse_query(q)
                    .map_err(|e| SiftError::Parse(e.to_string()))
            }
            QueryNode::Term { field, value } => {
                let field = self.field_by_name(field)?;
                Ok(Box::new(TermQuery::new(
                    Term::from_field_text(field, value),
                    IndexRecordOption::Basic,
                )))
            }
            QueryNode::And(nodes) => {
                let clauses = nodes
                    .iter()
                    .map(|n| Ok((Occur::Must, self.build_query(n)?)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Box::new(BooleanQuery::new(clauses)))
            }
            QueryNode::Or(nodes) => {
                let clauses = nodes
                    .iter()
                    .map(|n| Ok((Occur::Should, self.build_query(n)?)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Box::new(BooleanQuery::new(clauses)))
            }
        }
    }

    /// Analyzed content-field terms of the query, in visitation order
    fn content_keywords(&self, query: &dyn Query) -> Vec<String> {
        let mut keywords = Vec::new();
        query.query_terms(&mut |term: &Term, _need_positions: bool| {
            if term.field() == self.fields.content {
                if let Some(text) = term.value().as_str() {
                    if !keywords.iter().any(|k| k == text) {
                        keywords.push(text.to_string());
                    }
                }
            }
        });
        keywords
    }

    /// Count facet terms over the matching document set.
    ///
    /// `fullRefs` values are analyzed hierarchically: one stored value
    /// contributes to its own term and every ancestor prefix. Counts are
    /// per occurrence, so the ref counts under one repository sum to that
    /// repository's own count.
    fn collect_facets(
        &self,
        searcher: &tantivy::Searcher,
        doc_set: &HashSet<DocAddress>,
        requests: &[FacetRequest],
    ) -> Result<HashMap<String, FacetResult>> {
        let mut results = HashMap::new();
        if requests.is_empty() {
            return Ok(results);
        }

        let mut docs: Vec<TantivyDocument> = Vec::with_capacity(doc_set.len());
        for addr in doc_set {
            let doc = searcher
                .doc(*addr)
                .map_err(|e| SiftError::Backend(format!("failed to load document: {e}")))?;
            docs.push(doc);
        }

        for request in requests {
            let field = self.field_by_name(&request.field)?;
            let hierarchical = request.field == FIELD_FULL_REFS;

            let mut counts: HashMap<String, u64> = HashMap::new();
            let mut missing = 0u64;

            for doc in &docs {
                let mut seen_any = false;
                for value in doc.get_all(field) {
                    let Some(text) = value.as_str() else {
                        continue;
                    };
                    seen_any = true;
                    if hierarchical {
                        for term in hierarchy_terms(text) {
                            *counts.entry(term).or_insert(0) += 1;
                        }
                    } else {
                        *counts.entry(text.to_string()).or_insert(0) += 1;
                    }
                }
                if !seen_any {
                    missing += 1;
                }
            }

            let total: u64 = counts.values().sum();
            let mut terms: Vec<TermFacet> = counts
                .into_iter()
                .map(|(term, count)| TermFacet { term, count })
                .collect();
            terms.sort_by(|a, b| b.count.cmp(&a.count).then(a.term.cmp(&b.term)));

            let other: u64 = terms
                .iter()
                .skip(request.size)
                .map(|t| t.count)
                .sum();
            terms.truncate(request.size);

            results.insert(
                request.field.clone(),
                FacetResult {
                    field: request.field.clone(),
                    total,
                    missing,
                    other,
                    terms,
                },
            );
        }

        Ok(results)
    }
}

impl SearchBackend for TantivyBackend {
    fn get(&self, doc_id: &str) -> Result<Option<Vec<FieldEntry>>> {
        let searcher = self.searcher()?;
        let query = TermQuery::new(self.id_term(doc_id), IndexRecordOption::Basic);
        let top = searcher
            .search(&query, &TopDocs::with_limit(1))
            .map_err(|e| SiftError::Backend(format!("get failed: {e}")))?;

        let Some((_score, addr)) = top.into_iter().next() else {
            return Ok(None);
        };

        let doc: TantivyDocument = searcher
            .doc(addr)
            .map_err(|e| SiftError::Backend(format!("failed to load document: {e}")))?;
        Ok(Some(self.document_entries(&doc)))
    }

    fn index(&self, doc_id: &str, fields: &[FieldEntry]) -> Result<()> {
        let doc = self.build_document(doc_id, fields);
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| SiftError::Backend("index writer lock poisoned".to_string()))?;

        writer.delete_term(self.id_term(doc_id));
        writer
            .add_document(doc)
            .map_err(|e| SiftError::Backend(format!("failed to add document: {e}")))?;
        writer
            .commit()
            .map_err(|e| SiftError::Backend(format!("failed to commit: {e}")))?;
        Ok(())
    }

    fn delete(&self, doc_id: &str) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| SiftError::Backend("index writer lock poisoned".to_string()))?;

        writer.delete_term(self.id_term(doc_id));
        writer
            .commit()
            .map_err(|e| SiftError::Backend(format!("failed to commit: {e}")))?;
        Ok(())
    }

    fn commit_batch(&self, batch: BackendBatch) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| SiftError::Backend("index writer lock poisoned".to_string()))?;

        for op in batch.ops() {
            match op {
                BatchOp::Index { id, fields } => {
                    let doc = self.build_document(id, fields);
                    writer.delete_term(self.id_term(id));
                    // A failed op is logged but does not abort the batch
                    if let Err(e) = writer.add_document(doc) {
                        tracing::warn!("batch add failed for {id}: {e}");
                    }
                }
                BatchOp::Delete { id } => {
                    writer.delete_term(self.id_term(id));
                }
            }
        }

        writer
            .commit()
            .map_err(|e| SiftError::Backend(format!("batch commit failed: {e}")))?;
        Ok(())
    }

    fn search(&self, request: &SearchRequest) -> Result<SearchPage> {
        let query = self.build_query(&request.query)?;
        let searcher = self.searcher()?;

        let limit = request.size.max(1);
        let (top_docs, total, doc_set) = searcher
            .search(
                &query,
                &(
                    TopDocs::with_limit(limit).and_offset(request.from),
                    Count,
                    DocSetCollector,
                ),
            )
            .map_err(|e| SiftError::Backend(format!("search failed: {e}")))?;

        let keywords = self.content_keywords(query.as_ref());

        let mut hits = Vec::with_capacity(top_docs.len());
        if request.size > 0 {
            for (_score, addr) in top_docs {
                let doc: TantivyDocument = searcher
                    .doc(addr)
                    .map_err(|e| SiftError::Backend(format!("failed to load document: {e}")))?;
                let Some(id) = doc
                    .get_first(self.fields.id)
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
                else {
                    continue;
                };
                hits.push(BackendHit {
                    id,
                    keywords: keywords.clone(),
                });
            }
        }

        let facets = self.collect_facets(&searcher, &doc_set, &request.facets)?;

        Ok(SearchPage {
            hits,
            total: total as u64,
            facets,
        })
    }
}
