//! Domain core of codesift.
//!
//! Everything protocol-independent lives here; the `cli` and `api`
//! modules are thin adapters over [`services::Services`].

pub mod backend;
pub mod codec;
pub mod config;
pub mod error;
pub mod facets;
pub mod indexer;
pub mod preview;
pub mod refset;
pub mod search;
pub mod services;
pub mod source;
pub mod types;
