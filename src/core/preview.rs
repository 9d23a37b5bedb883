//! Preview extraction: windowed line excerpts around matched lines.
//!
//! Line numbers are 1-based. Each matching line contributes a window of
//! `[max(1, n - before), n + after]`; adjacent or overlapping windows are
//! merged so no line appears in two fragments.

use crate::core::types::PreviewFragment;

/// Blobs larger than this are never previewed or indexed
pub const MAX_BLOB_SIZE: u64 = 1 << 30;

/// Extract preview fragments from `content` for every line satisfying
/// `predicate`.
pub fn filter_lines<P>(
    content: &str,
    predicate: P,
    before: usize,
    after: usize,
) -> Vec<PreviewFragment>
where
    P: Fn(&str) -> bool,
{
    let lines: Vec<&str> = content.lines().collect();
    let total = lines.len();

    // Merge windows first, then materialize text
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if !predicate(line) {
            continue;
        }
        let n = i + 1;
        let start = n.saturating_sub(before).max(1);
        let end = (n + after).min(total);

        match ranges.last_mut() {
            Some((_, last_end)) if start <= *last_end + 1 => {
                *last_end = (*last_end).max(end);
            }
            _ => ranges.push((start, end)),
        }
    }

    ranges
        .into_iter()
        .map(|(start, end)| PreviewFragment {
            offset: start,
            preview: lines[start - 1..end].join("\n"),
        })
        .collect()
}

/// Case-insensitive substring test over a set of matched terms, the
/// predicate used for query-time previews.
pub fn keyword_predicate(keywords: &[String]) -> impl Fn(&str) -> bool + '_ {
    move |line: &str| {
        let lower = line.to_lowercase();
        keywords.iter().any(|k| lower.contains(&k.to_lowercase()))
    }
}
