//! Ref-set operations and FileIndex normalization.
//!
//! A document's ref set is the list of branches/tags that reach its blob.
//! All mutations go through [`merge_refs`] and [`remove_refs`], which keep
//! `full_refs` in lockstep with `refs`. [`fill_file_index`] normalizes and
//! validates a caller-supplied FileIndex before it is written.

use crate::core::error::{Result, SiftError};
use crate::core::types::FileIndex;

/// Deterministic document id for a FileIndex: scope plus blob.
pub fn doc_id(f: &FileIndex) -> String {
    format!(
        "{}:{}/{}:{}",
        f.metadata.organization, f.metadata.project, f.metadata.repository, f.blob
    )
}

/// Fully qualified facet term for one ref
pub fn full_ref(organization: &str, project: &str, repository: &str, ref_name: &str) -> String {
    format!("{organization}:{project}/{repository}:{ref_name}")
}

/// Canonical extension of a path: lowercased, with the leading dot, or
/// empty when the final component has no extension.
pub fn ext_of(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        // A leading dot (".gitignore") is a hidden file, not an extension
        Some(0) | None => String::new(),
        Some(idx) => name[idx..].to_ascii_lowercase(),
    }
}

/// Union-assign `incoming` into the document's ref set.
///
/// Existing order is preserved; new refs append in input order; duplicates
/// are silently absorbed. Returns true iff nothing was added (membership
/// equality, so a reordered subset is still "same"). `full_refs` is
/// recomputed after any addition.
pub fn merge_refs(existing: &mut FileIndex, incoming: &[String]) -> bool {
    let mut added = false;
    for r in incoming {
        if !existing.metadata.refs.iter().any(|e| e == r) {
            existing.metadata.refs.push(r.clone());
            added = true;
        }
    }
    if added {
        rebuild_full_refs(existing);
    }
    !added
}

/// Delete every ref in `to_remove` from the document's ref set.
///
/// Returns true iff the set is now empty, in which case the caller must
/// delete the document instead of rewriting it.
pub fn remove_refs(existing: &mut FileIndex, to_remove: &[String]) -> bool {
    existing
        .metadata
        .refs
        .retain(|r| !to_remove.iter().any(|d| d == r));
    rebuild_full_refs(existing);
    existing.metadata.refs.is_empty()
}

/// Recompute `full_refs` from scope and `refs`
pub fn rebuild_full_refs(f: &mut FileIndex) {
    f.full_refs = f
        .metadata
        .refs
        .iter()
        .map(|r| {
            full_ref(
                &f.metadata.organization,
                &f.metadata.project,
                &f.metadata.repository,
                r,
            )
        })
        .collect();
}

/// Normalize a caller-supplied FileIndex: compute `ext` from `path`,
/// build `full_refs`, and validate the document invariants.
pub fn fill_file_index(f: &mut FileIndex) -> Result<()> {
    validate_scope_component("organization", &f.metadata.organization)?;
    validate_scope_component("project", &f.metadata.project)?;
    validate_scope_component("repository", &f.metadata.repository)?;

    if f.blob.is_empty() {
        return Err(SiftError::Validation("blob hash is empty".to_string()));
    }
    if f.metadata.refs.is_empty() {
        return Err(SiftError::Validation(format!(
            "ref set is empty for {}",
            f.metadata.path
        )));
    }

    // Absorb duplicates the caller may have passed
    let mut seen = Vec::with_capacity(f.metadata.refs.len());
    for r in f.metadata.refs.drain(..) {
        if r.is_empty() {
            return Err(SiftError::Validation("empty ref name".to_string()));
        }
        if !seen.contains(&r) {
            seen.push(r);
        }
    }
    f.metadata.refs = seen;

    f.metadata.ext = ext_of(&f.metadata.path);
    rebuild_full_refs(f);
    Ok(())
}

fn validate_scope_component(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(SiftError::Validation(format!("{name} is empty")));
    }
    if value.contains(':') || value.contains('/') {
        return Err(SiftError::Validation(format!(
            "{name} {value:?} contains a reserved facet separator"
        )));
    }
    Ok(())
}
