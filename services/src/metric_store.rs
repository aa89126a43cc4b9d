use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use sea_orm::ActiveValue::Set;
use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use pulsewatch_shared::{ClientSummary, MetricPayload};
use crate::entity::metrics;

/// Upper bound on rows returned by a single listing.
pub const MAX_LIST_LIMIT: u64 = 1000;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),
    #[error("failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, FromQueryResult)]
struct StoredPayload {
    client_id: String,
    raw_data: String,
}

impl StoredPayload {
    /// Rebuilds the logical record from the raw blob with the resolved
    /// `client_id` laid over it.
    fn reconstruct(self) -> Option<MetricPayload> {
        match serde_json::from_str::<Value>(&self.raw_data) {
            Ok(Value::Object(mut fields)) => {
                fields.insert("client_id".to_string(), Value::String(self.client_id));
                Some(MetricPayload::new(fields))
            }
            Ok(other) => {
                log::warn!(
                    "Skipping stored metric for client {}: raw data is {} rather than an object",
                    self.client_id,
                    json_kind(&other)
                );
                None
            }
            Err(e) => {
                log::warn!("Skipping unreadable stored metric for client {}: {}", self.client_id, e);
                None
            }
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct ClientRow {
    client_id: String,
    client_name: Option<String>,
    last_seen: Option<String>,
    metric_count: i64,
}

impl From<ClientRow> for ClientSummary {
    fn from(row: ClientRow) -> Self {
        ClientSummary {
            client_name: row.client_name.unwrap_or_else(|| row.client_id.clone()),
            client_id: row.client_id,
            last_seen: row.last_seen,
            metric_count: row.metric_count.max(0) as u64,
        }
    }
}

/// Append-only access to the `metrics` table.
///
/// Writes report every failure to the caller. Reads come in two flavours:
/// `try_*` returns the error, the plain variant logs it and yields an
/// empty or zero result so a flaky database cannot take a view down.
pub struct MetricStore {
    db: DatabaseConnection,
}

impl MetricStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Persists one sample and returns its surrogate key.
    pub async fn insert(&self, client_id: &str, payload: &MetricPayload) -> Result<i32, StoreError> {
        log::info!("Inserting metric for client: {}", client_id);
        log::debug!(
            "Metric data for {} - CPU: {:?}%, RAM: {:?}%",
            client_id,
            payload.f64_field("cpu_percent"),
            payload.get("ram").and_then(|ram| ram.get("percent")).and_then(Value::as_f64)
        );

        let result = async {
            let model = Self::to_active_model(client_id, payload)?;
            let inserted = metrics::Entity::insert(model).exec(&self.db).await?;
            Ok::<_, StoreError>(inserted.last_insert_id)
        }
        .await;

        match &result {
            Ok(id) => log::info!("Metric {} inserted for client: {}", id, client_id),
            Err(e) => log::error!("Insert metric failed for client {}: {}", client_id, e),
        }
        result
    }

    pub async fn try_list_all(&self, limit: u64) -> Result<Vec<MetricPayload>, StoreError> {
        self.fetch(None, limit).await
    }

    /// Up to `limit` most recent records by `timestamp`, newest first.
    pub async fn list_all(&self, limit: u64) -> Vec<MetricPayload> {
        log::info!("Fetching all metrics (limit: {})", limit);
        match self.try_list_all(limit).await {
            Ok(metrics) => {
                log::info!("Retrieved {} metrics", metrics.len());
                metrics
            }
            Err(e) => {
                log::error!("Get all metrics failed (limit: {}): {}", limit, e);
                Vec::new()
            }
        }
    }

    pub async fn try_list_by_client(
        &self,
        client_id: Option<&str>,
        limit: u64,
    ) -> Result<Vec<MetricPayload>, StoreError> {
        self.fetch(client_id.filter(|id| !id.is_empty()), limit).await
    }

    /// Like [`list_all`](Self::list_all) restricted to one client; an empty
    /// or absent id lists every client.
    pub async fn list_by_client(&self, client_id: Option<&str>, limit: u64) -> Vec<MetricPayload> {
        let label = client_id.filter(|id| !id.is_empty()).unwrap_or("all");
        log::info!("Fetching metrics for client: {} (limit: {})", label, limit);
        match self.try_list_by_client(client_id, limit).await {
            Ok(metrics) => {
                log::info!("Retrieved {} metrics for client: {}", metrics.len(), label);
                metrics
            }
            Err(e) => {
                log::error!("Get client metrics failed for client {}: {}", label, e);
                Vec::new()
            }
        }
    }

    pub async fn try_count_distinct_clients(&self) -> Result<u64, StoreError> {
        let count = metrics::Entity::find()
            .select_only()
            .column(metrics::Column::ClientId)
            .distinct()
            .count(&self.db)
            .await?;
        Ok(count)
    }

    pub async fn count_distinct_clients(&self) -> u64 {
        match self.try_count_distinct_clients().await {
            Ok(count) => {
                log::info!("Total clients: {}", count);
                count
            }
            Err(e) => {
                log::error!("Count distinct clients failed: {}", e);
                0
            }
        }
    }

    pub async fn try_count_records(&self) -> Result<u64, StoreError> {
        Ok(metrics::Entity::find().count(&self.db).await?)
    }

    pub async fn count_records(&self) -> u64 {
        match self.try_count_records().await {
            Ok(count) => {
                log::info!("Total metrics: {}", count);
                count
            }
            Err(e) => {
                log::error!("Count metrics failed: {}", e);
                0
            }
        }
    }

    pub async fn try_list_clients(&self) -> Result<Vec<ClientSummary>, StoreError> {
        let rows = metrics::Entity::find()
            .select_only()
            .column(metrics::Column::ClientId)
            .column_as(metrics::Column::ClientName.max(), "client_name")
            .column_as(metrics::Column::Timestamp.max(), "last_seen")
            .column_as(metrics::Column::Id.count(), "metric_count")
            .group_by(metrics::Column::ClientId)
            .order_by_asc(metrics::Column::ClientId)
            .into_model::<ClientRow>()
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(ClientSummary::from).collect())
    }

    /// One entry per distinct client with its newest timestamp and record count.
    pub async fn list_clients(&self) -> Vec<ClientSummary> {
        log::info!("Fetching client list");
        match self.try_list_clients().await {
            Ok(clients) => {
                log::info!("Retrieved {} clients", clients.len());
                clients
            }
            Err(e) => {
                log::error!("Get client list failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn fetch(
        &self,
        client_id: Option<&str>,
        limit: u64,
    ) -> Result<Vec<MetricPayload>, StoreError> {
        let mut query = metrics::Entity::find()
            .select_only()
            .column(metrics::Column::ClientId)
            .column(metrics::Column::RawData);

        if let Some(id) = client_id {
            query = query.filter(metrics::Column::ClientId.eq(id));
        }

        let rows = query
            .order_by_desc(metrics::Column::Timestamp)
            .order_by_desc(metrics::Column::Id)
            .limit(limit.clamp(1, MAX_LIST_LIMIT))
            .into_model::<StoredPayload>()
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().filter_map(StoredPayload::reconstruct).collect())
    }

    // Helper: build the row; typed columns are lenient, raw_data is verbatim
    fn to_active_model(
        client_id: &str,
        payload: &MetricPayload,
    ) -> Result<metrics::ActiveModel, StoreError> {
        let received_at = payload
            .non_empty_str("received_at")
            .map(str::to_owned)
            .unwrap_or_else(|| Utc::now().to_rfc3339());

        let timestamp = match payload.get("timestamp") {
            Some(Value::String(ts)) => ts.clone(),
            None | Some(Value::Null) => received_at.clone(),
            Some(other) => other.to_string(),
        };

        let ram_json = match payload.get("ram") {
            None | Some(Value::Null) => None,
            Some(ram) => Some(serde_json::to_string(ram)?),
        };

        Ok(metrics::ActiveModel {
            client_id: Set(client_id.to_owned()),
            client_name: Set(payload.non_empty_str("client_name").map(str::to_owned)),
            timestamp: Set(timestamp),
            received_at: Set(received_at),
            cpu_percent: Set(payload.f64_field("cpu_percent")),
            gpu_percent: Set(payload.f64_field("gpu_percent")),
            ram_json: Set(ram_json),
            ping_ms: Set(payload.f64_field("ping_ms")),
            internet_connected: Set(payload.bool_field("internet_connected")),
            raw_data: Set(serde_json::to_string(payload)?),
            ..Default::default()
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
