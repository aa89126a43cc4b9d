use crate::chart_service::charts_or_empty;
use crate::metric_store::{MetricStore, StoreError, MAX_LIST_LIMIT};
use pulsewatch_shared::{
    ClientHistory, ClientRoster, DashboardSummary, MetricPayload, MetricsOverview,
};
use std::sync::Arc;

/// Entries returned by `GET /api/metrics` when no limit is given.
pub const API_METRICS_LIMIT: u64 = MAX_LIST_LIMIT;
/// Entries listed on the dashboard.
pub const DASHBOARD_METRICS_LIMIT: u64 = 50;
/// Samples fed into the dashboard charts.
pub const CHART_WINDOW: u64 = 20;
/// Entries returned for a single client's history when no limit is given.
pub const CLIENT_HISTORY_LIMIT: u64 = 20;

/// Read-side composition over [`MetricStore`].
pub struct QueryService {
    store: Arc<MetricStore>,
}

impl QueryService {
    pub fn new(store: Arc<MetricStore>) -> Self {
        Self { store }
    }

    /// Newest first.
    pub async fn latest_metrics(&self, limit: u64) -> Vec<MetricPayload> {
        self.store.list_all(limit).await
    }

    pub async fn client_metrics(&self, client_id: Option<&str>, limit: u64) -> Vec<MetricPayload> {
        self.store.list_by_client(client_id, limit).await
    }

    /// The single newest record. Records sharing a timestamp come back in
    /// no particular order.
    pub async fn latest(&self) -> Option<MetricPayload> {
        self.store.list_all(1).await.into_iter().next()
    }

    /// The newest `limit` records, oldest first, for charting.
    pub async fn recent_window(&self, limit: u64) -> Vec<MetricPayload> {
        let mut window = self.store.list_by_client(None, limit).await;
        window.reverse();
        window
    }

    pub async fn total_clients(&self) -> u64 {
        self.store.count_distinct_clients().await
    }

    pub async fn total_records(&self) -> u64 {
        self.store.count_records().await
    }

    /// Distinct client count, failing loudly; used to probe store reachability.
    pub async fn check_store(&self) -> Result<u64, StoreError> {
        self.store.try_count_distinct_clients().await
    }

    pub async fn metrics_overview(&self, client_id: Option<&str>, limit: u64) -> MetricsOverview {
        let metrics = self.client_metrics(client_id, limit).await;
        let total_clients = self.total_clients().await;

        MetricsOverview {
            total_entries: metrics.len(),
            total_clients,
            metrics,
        }
    }

    pub async fn client_history(&self, client_id: &str, limit: u64) -> ClientHistory {
        let metrics = self.client_metrics(Some(client_id), limit).await;

        ClientHistory {
            client_id: client_id.to_string(),
            total_entries: metrics.len(),
            metrics,
        }
    }

    pub async fn client_roster(&self) -> ClientRoster {
        let clients = self.store.list_clients().await;

        ClientRoster {
            total_clients: clients.len(),
            clients,
        }
    }

    pub async fn dashboard_summary(&self) -> DashboardSummary {
        let metrics = self.latest_metrics(DASHBOARD_METRICS_LIMIT).await;
        let latest_metrics = metrics.first().cloned();
        let recent_metrics = self.recent_window(CHART_WINDOW).await;
        let charts = charts_or_empty(&recent_metrics);
        let total_clients = self.total_clients().await;
        let total_metrics = self.total_records().await;

        DashboardSummary {
            metrics,
            latest_metrics,
            recent_metrics,
            charts,
            total_clients,
            total_metrics,
        }
    }
}
