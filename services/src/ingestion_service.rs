use crate::metric_store::{MetricStore, StoreError};
use chrono::{DateTime, SecondsFormat, Utc};
use pulsewatch_shared::MetricPayload;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Client id used when neither the payload nor the transport identify the agent.
pub const UNKNOWN_CALLER: &str = "unknown";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("No data provided")]
    MissingPayload,
    #[error("Invalid JSON payload: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("Metric payload must be a JSON object")]
    NotAnObject,
    #[error("Failed to store metric: {0}")]
    Persistence(#[from] StoreError),
}

impl IngestError {
    /// Whether the agent sent something unusable, as opposed to the server
    /// failing to persist it.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, IngestError::Persistence(_))
    }
}

/// Validates, stamps and stores incoming samples.
pub struct IngestionService {
    store: Arc<MetricStore>,
}

impl IngestionService {
    pub fn new(store: Arc<MetricStore>) -> Self {
        Self { store }
    }

    /// Ingests a raw request body. `caller` is the network address of the
    /// agent, used as the client id of last resort.
    pub async fn ingest(&self, body: &[u8], caller: Option<&str>) -> Result<String, IngestError> {
        let payload = parse_payload(body)?;
        self.ingest_payload(payload, caller, Utc::now()).await
    }

    /// Stamps `received_at`, resolves the client id and persists the sample.
    /// Returns the resolved client id.
    pub async fn ingest_payload(
        &self,
        mut payload: MetricPayload,
        caller: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<String, IngestError> {
        if payload.is_empty() {
            return Err(IngestError::MissingPayload);
        }

        stamp_received_at(&mut payload, now);
        let client_id = resolve_client_id(&payload, caller);
        log::info!("Processing metrics from client: {}", client_id);

        self.store.insert(&client_id, &payload).await?;

        log::info!("Metrics received successfully from {}", client_id);
        Ok(client_id)
    }
}

/// Parses a request body into a payload object.
pub fn parse_payload(body: &[u8]) -> Result<MetricPayload, IngestError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(IngestError::MissingPayload);
    }

    match serde_json::from_slice::<Value>(body).map_err(IngestError::InvalidJson)? {
        Value::Object(fields) if fields.is_empty() => Err(IngestError::MissingPayload),
        Value::Object(fields) => Ok(MetricPayload::new(fields)),
        Value::Null => Err(IngestError::MissingPayload),
        _ => Err(IngestError::NotAnObject),
    }
}

/// Overwrites any agent-supplied `received_at` with the server clock.
pub fn stamp_received_at(payload: &mut MetricPayload, now: DateTime<Utc>) {
    payload.insert(
        "received_at",
        now.to_rfc3339_opts(SecondsFormat::Micros, true),
    );
}

/// `client_name`, then `client_id`, then the caller's address.
pub fn resolve_client_id(payload: &MetricPayload, caller: Option<&str>) -> String {
    payload
        .non_empty_str("client_name")
        .or_else(|| payload.non_empty_str("client_id"))
        .or(caller.filter(|addr| !addr.is_empty()))
        .unwrap_or(UNKNOWN_CALLER)
        .to_string()
}
