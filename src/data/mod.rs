/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  data/<site>.csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → SolarTable, memoized per site (SiteCache)
///   └──────────┘
///        │   load_all: concatenate sites in enumeration order
///        ▼
///   ┌────────────┐
///   │ SolarTable │  site tag, Timestamp, numeric columns
///   └────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  closed date range → new SolarTable
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
