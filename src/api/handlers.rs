//! HTTP request handlers.

use crate::api::ApiError;
use crate::core::indexer::ImportStats;
use crate::core::services::Services;
use crate::core::types::{FilterParams, Scope, SearchOptions, SearchResult};
use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Search request body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchBody {
    pub query: String,
    #[serde(default)]
    pub filter_params: FilterParams,
    #[serde(default)]
    pub from: usize,
    #[serde(default)]
    pub size: Option<usize>,
}

/// Index request body: a repository, optionally restricted to some refs
#[derive(Debug, Clone, Deserialize)]
pub struct IndexBody {
    pub organization: String,
    pub project: String,
    pub repository: String,
    #[serde(default)]
    pub refs: Vec<String>,
}

/// Ref deletion request body
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteRefsBody {
    pub organization: String,
    pub project: String,
    pub repository: String,
    pub refs: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteRefsResponse {
    pub status: String,
}

/// Returns server status and version
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Execute a search and return hits, facets, and the facet tree
pub async fn search_handler(
    State(services): State<Services>,
    Json(body): Json<SearchBody>,
) -> Result<Json<SearchResult>, ApiError> {
    let opts = SearchOptions {
        from: body.from,
        size: body.size,
        deadline: None,
    };
    let result = services
        .query
        .search_opts(&body.query, &body.filter_params, &opts)?;
    Ok(Json(result))
}

/// Import a repository's refs (all of them, or the listed subset)
pub async fn index_handler(
    State(services): State<Services>,
    Json(body): Json<IndexBody>,
) -> Result<Json<ImportStats>, ApiError> {
    let scope = Scope::new(body.organization, body.project, body.repository);

    let stats = if body.refs.is_empty() {
        services.importer.import_repository(&scope)?
    } else {
        let mut stats = ImportStats::default();
        for ref_name in &body.refs {
            let (indexed, skipped) = services.importer.import_ref(&scope, ref_name)?;
            stats.refs_imported += 1;
            stats.files_indexed += indexed;
            stats.files_skipped += skipped;
        }
        stats
    };

    Ok(Json(stats))
}

/// Remove refs from the index, deleting documents whose ref set empties
pub async fn delete_refs_handler(
    State(services): State<Services>,
    Json(body): Json<DeleteRefsBody>,
) -> Result<Json<DeleteRefsResponse>, ApiError> {
    services.indexer.delete_index_by_refs(
        &body.organization,
        &body.project,
        &body.repository,
        &body.refs,
    )?;
    Ok(Json(DeleteRefsResponse {
        status: "deleted".to_string(),
    }))
}
