use super::model::{Dish, NutrientVector};

/// A dataset dish paired with its distance to a query.
#[derive(Debug, Clone, Copy)]
pub struct Neighbor<'a> {
    pub dish: &'a Dish,
    pub distance: f64,
}

/// The `k` dishes closest to `query` by Euclidean distance on raw nutrients.
///
/// Ties keep dataset order. When `k` exceeds the number of dishes, every
/// dish is returned, fully ordered. Brute force, O(n·d) per query; fine for
/// a table of a few thousand dishes, there is no index behind it.
pub fn find_nearest<'a>(query: &NutrientVector, dishes: &'a [Dish], k: usize) -> Vec<Neighbor<'a>> {
    let mut neighbors: Vec<Neighbor<'a>> = dishes
        .iter()
        .map(|dish| Neighbor {
            dish,
            distance: query.distance(&dish.nutrients),
        })
        .collect();
    // `sort_by` is stable.
    neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    neighbors.truncate(k);
    neighbors
}

/// Rough match percentage shown next to CLI matches.
pub fn similarity_percent(distance: f64) -> f64 {
    (100.0 - distance * 2.0).max(0.0)
}
