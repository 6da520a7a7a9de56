/// Data layer: table model, loading, filtering, summaries and export.
///
/// Architecture:
/// ```text
///  uploaded bytes (.csv ; / .xlsx / .xls)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  sniff format → Table          (cache: keyed by bytes)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  age range, then 8 multiselects → filtered Table
///   └──────────┘                                  (cache: keyed by FilterSpec)
///        │
///        ▼
///   ┌──────────┐        ┌──────────┐
///   │ summary   │        │  export   │  Table → csv / xlsx bytes
///   └──────────┘        └──────────┘
/// ```

pub mod cache;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod summary;
