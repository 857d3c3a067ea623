use super::model::{Dataset, Dish};

// ---------------------------------------------------------------------------
// Name filter: case-insensitive substring match on the dish name
// ---------------------------------------------------------------------------

/// Return dishes whose name contains `query`, ignoring case.
///
/// * The query is trimmed; an empty query matches nothing.
/// * Results keep dataset order and stop after `limit` hits.
pub fn search_by_name<'a>(dataset: &'a Dataset, query: &str, limit: usize) -> Vec<&'a Dish> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    dataset
        .iter()
        .filter(|dish| dish.name.to_lowercase().contains(&needle))
        .take(limit)
        .collect()
}
