//! Data layer: record model, loading, filtering, aggregation and export.
//!
//! Architecture:
//! ```text
//!  .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐      ┌──────────┐
//!   │  loader   │ ◄──  │  cache    │  sha256(bytes) → parsed dataset
//!   └──────────┘      └──────────┘
//!        │
//!        ▼
//!   ┌───────────────┐
//!   │ DefectDataset  │  Vec<Record>, derived fields computed once
//!   └───────────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  FilterSpec → stable subset
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ aggregate  │  summary, grouped counts, monthly series, risk ranking
//!   └───────────┘
//!        │
//!        ▼
//!   columns / export   table cells and CSV download
//! ```

pub mod aggregate;
pub mod cache;
pub mod columns;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
