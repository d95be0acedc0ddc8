use std::collections::HashSet;

use crate::models::SearchResult;

/// Flatten per-query result lists into one list with a single entry per title.
/// The first occurrence of a title wins and first-seen order is kept.
pub fn merge_by_title<I>(batches: I) -> Vec<SearchResult>
where
    I: IntoIterator<Item = Vec<SearchResult>>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    for result in batches.into_iter().flatten() {
        if seen.insert(result.title.clone()) {
            merged.push(result);
        }
    }

    merged
}
