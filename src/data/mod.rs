/// Data layer: core types, loading, and lookups.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (scores attached per dish)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset   │  Vec<Dish>, source column names
///   └──────────┘
///        │
///        ├──────────────┐
///        ▼              ▼
///   ┌──────────┐   ┌──────────┐
///   │  filter   │   │ nearest  │
///   └──────────┘   └──────────┘
///   name substring  Euclidean k-NN
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod nearest;
