// src/catalog/mod.rs

//! The financial-product catalog: normalization of provider records,
//! ingestion into the store, and filtered queries over it.

pub mod ingest;
pub mod normalize;
pub mod query;

pub use ingest::{IngestReport, bootstrap_if_empty, ingest_equities, ingest_feeds, refresh_catalog};
pub use query::CatalogQuery;
