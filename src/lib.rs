//! codesift - faceted source-code search across git repositories.
//!
//! Ingests the contents of version-controlled repositories and serves
//! full-text queries with faceted navigation across organizations,
//! projects, repositories, and refs, with contextual line previews read
//! back from the repositories at query time.
//!
//! # Architecture
//!
//! - **core/**: domain logic - indexer, query engine, codec, facets,
//!   preview extraction, backed by a tantivy index and git repositories
//! - **api/**: REST adapter via axum
//! - **cli/**: clap adapter
//!
//! The same content blob reachable from several refs is indexed once per
//! repository and tagged with the union of those refs; removing the last
//! ref deletes the document.

pub mod api;
pub mod cli;
pub mod core;

pub use crate::core::error::{Result, SiftError};
pub use crate::core::types::{FileIndex, FilterParams, Hit, Scope, SearchResult};
