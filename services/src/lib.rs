pub mod chart_service;
pub mod database;
pub mod entity;
pub mod ingestion_service;
pub mod metric_store;
pub mod query_service;

#[cfg(test)]
mod test_support;

pub use chart_service::{charts_or_empty, derive_charts, time_label, ChartError};
pub use database::{create_connection, ConnectionSettings};
pub use ingestion_service::{IngestError, IngestionService};
pub use metric_store::{MetricStore, StoreError};
pub use query_service::QueryService;

// Re-export entities for convenience
pub use entity::metrics;
