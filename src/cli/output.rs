//! CLI output formatting.

use crate::cli::OutputFormat;
use crate::core::indexer::ImportStats;
use crate::core::types::SearchResult;

/// Print import statistics
pub fn print_import_stats(stats: &ImportStats, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(stats),
        OutputFormat::Human => {
            println!(
                "imported {} refs: {} files indexed, {} skipped ({}ms)",
                stats.refs_imported, stats.files_indexed, stats.files_skipped, stats.duration_ms
            );
        }
    }
}

/// Print a search result
pub fn print_search_result(result: &SearchResult, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(result),
        OutputFormat::Human => print_search_human(result),
    }
}

fn print_search_human(result: &SearchResult) {
    println!(
        "{} hits for {:?} ({:.3}s)",
        result.size, result.query, result.elapsed_seconds
    );

    for hit in &result.hits {
        let meta = &hit.source.metadata;
        println!();
        println!(
            "{}:{}/{} {} [{}]",
            meta.organization,
            meta.project,
            meta.repository,
            meta.path,
            meta.refs.join(", ")
        );
        for fragment in &hit.preview {
            for (i, line) in fragment.preview.lines().enumerate() {
                println!("  {:>5} | {line}", fragment.offset + i);
            }
        }
    }

    if !result.full_refs_facet.is_empty() {
        println!();
        for org in &result.full_refs_facet {
            println!("{} ({})", org.term, org.count);
            for project in &org.projects {
                println!("  {} ({})", project.term, project.count);
                for repo in &project.repositories {
                    println!("    {} ({})", repo.term, repo.count);
                    for r in &repo.refs {
                        println!("      {} ({})", r.term, r.count);
                    }
                }
            }
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("cannot serialize output: {e}"),
    }
}
