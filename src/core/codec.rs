//! Document codec: FileIndex to and from backend field entries.
//!
//! The search backend exposes stored documents as loosely-typed
//! `(name, value, arrayPosition)` tuples with dotted field names. The
//! decoder is a tagged dispatch on the first name segment with a secondary
//! dispatch for `metadata.*`; repeated fields are grouped by array
//! position, first observed value per position wins. Unknown fields are
//! ignored for forward compatibility.

use crate::core::error::{Result, SiftError};
use crate::core::types::{FileIndex, FileMetadata};
use std::collections::BTreeMap;

pub const FIELD_BLOB: &str = "blob";
pub const FIELD_CONTENT: &str = "content";
pub const FIELD_FULL_REFS: &str = "fullRefs";
pub const FIELD_ORGANIZATION: &str = "metadata.organization";
pub const FIELD_PROJECT: &str = "metadata.project";
pub const FIELD_REPOSITORY: &str = "metadata.repository";
pub const FIELD_REFS: &str = "metadata.refs";
pub const FIELD_PATH: &str = "metadata.path";
pub const FIELD_EXT: &str = "metadata.ext";

/// One stored field value of a backend document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEntry {
    /// Dotted field name (`metadata.refs`, `fullRefs`, `blob`, ...)
    pub name: String,
    pub value: String,
    /// Index within a repeated field; 0 for scalar fields
    pub position: usize,
}

impl FieldEntry {
    pub fn new(name: &str, value: impl Into<String>, position: usize) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            position,
        }
    }
}

/// Serialize a FileIndex into typed field entries
pub fn encode(f: &FileIndex) -> Vec<FieldEntry> {
    let mut fields = Vec::with_capacity(7 + 2 * f.metadata.refs.len());

    fields.push(FieldEntry::new(FIELD_BLOB, f.blob.as_str(), 0));
    fields.push(FieldEntry::new(FIELD_CONTENT, f.content.as_str(), 0));
    fields.push(FieldEntry::new(
        FIELD_ORGANIZATION,
        f.metadata.organization.as_str(),
        0,
    ));
    fields.push(FieldEntry::new(
        FIELD_PROJECT,
        f.metadata.project.as_str(),
        0,
    ));
    fields.push(FieldEntry::new(
        FIELD_REPOSITORY,
        f.metadata.repository.as_str(),
        0,
    ));
    fields.push(FieldEntry::new(FIELD_PATH, f.metadata.path.as_str(), 0));
    fields.push(FieldEntry::new(FIELD_EXT, f.metadata.ext.as_str(), 0));

    for (i, r) in f.metadata.refs.iter().enumerate() {
        fields.push(FieldEntry::new(FIELD_REFS, r.as_str(), i));
    }
    for (i, fr) in f.full_refs.iter().enumerate() {
        fields.push(FieldEntry::new(FIELD_FULL_REFS, fr.as_str(), i));
    }

    fields
}

/// Reconstruct a FileIndex from backend field entries
pub fn decode(fields: &[FieldEntry]) -> Result<FileIndex> {
    let mut f = FileIndex::default();
    let mut refs = BTreeMap::new();
    let mut full_refs = BTreeMap::new();

    for entry in fields {
        let mut name = entry.name.splitn(2, '.');
        match name.next().unwrap_or_default() {
            "blob" => f.blob = entry.value.clone(),
            "content" => f.content = entry.value.clone(),
            "fullRefs" => {
                full_refs
                    .entry(entry.position)
                    .or_insert_with(|| entry.value.clone());
            }
            "metadata" => match name.next().unwrap_or_default() {
                "organization" => f.metadata.organization = entry.value.clone(),
                "project" => f.metadata.project = entry.value.clone(),
                "repository" => f.metadata.repository = entry.value.clone(),
                "refs" => {
                    refs.entry(entry.position)
                        .or_insert_with(|| entry.value.clone());
                }
                "path" => f.metadata.path = entry.value.clone(),
                "ext" => f.metadata.ext = entry.value.clone(),
                _ => {}
            },
            _ => {}
        }
    }

    f.metadata.refs = into_dense(FIELD_REFS, refs)?;
    f.full_refs = into_dense(FIELD_FULL_REFS, full_refs)?;

    Ok(f)
}

/// Collapse a position-keyed map into a sequence, requiring the positions
/// to form a dense `[0, n)` range.
fn into_dense(field: &str, map: BTreeMap<usize, String>) -> Result<Vec<String>> {
    let mut out = Vec::with_capacity(map.len());
    for (expected, (pos, value)) in map.into_iter().enumerate() {
        if pos != expected {
            return Err(SiftError::Backend(format!(
                "{field}: array positions are not dense (expected {expected}, got {pos})"
            )));
        }
        out.push(value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::refset::fill_file_index;

    fn sample() -> FileIndex {
        let mut f = FileIndex {
            blob: "cafe12".to_string(),
            metadata: FileMetadata {
                organization: "orgA".to_string(),
                project: "projA".to_string(),
                repository: "repoA".to_string(),
                refs: vec!["main".to_string(), "dev".to_string()],
                path: "src/lib.rs".to_string(),
                ext: String::new(),
            },
            full_refs: Vec::new(),
            content: "pub fn hello() {}".to_string(),
        };
        fill_file_index(&mut f).unwrap();
        f
    }

    #[test]
    fn round_trip() {
        let f = sample();
        let decoded = decode(&encode(&f)).unwrap();
        assert_eq!(decoded, f);
    }

    #[test]
    fn repeated_fields_keep_positions() {
        let f = sample();
        let decoded = decode(&encode(&f)).unwrap();
        assert_eq!(decoded.metadata.refs, vec!["main", "dev"]);
        assert_eq!(
            decoded.full_refs,
            vec!["orgA:projA/repoA:main", "orgA:projA/repoA:dev"]
        );
    }

    #[test]
    fn first_value_per_position_wins() {
        // Multi-term analysis can surface the same position twice
        let mut fields = encode(&sample());
        fields.push(FieldEntry::new(FIELD_REFS, "shadowed", 0));
        let decoded = decode(&fields).unwrap();
        assert_eq!(decoded.metadata.refs[0], "main");
    }

    #[test]
    fn out_of_order_entries_decode() {
        let mut fields = encode(&sample());
        fields.reverse();
        let decoded = decode(&fields).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn unknown_fields_ignored() {
        let mut fields = encode(&sample());
        fields.push(FieldEntry::new("indexed_at", "2026-01-01T00:00:00Z", 0));
        fields.push(FieldEntry::new("metadata.checksum", "ff", 0));
        let decoded = decode(&fields).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn position_gap_is_an_error() {
        let fields = vec![
            FieldEntry::new(FIELD_BLOB, "cafe12", 0),
            FieldEntry::new(FIELD_REFS, "main", 0),
            FieldEntry::new(FIELD_REFS, "dev", 2),
        ];
        assert!(matches!(decode(&fields), Err(SiftError::Backend(_))));
    }

    #[test]
    fn empty_document_decodes_empty() {
        let decoded = decode(&[]).unwrap();
        assert_eq!(decoded, FileIndex::default());
    }
}
