pub mod models;

pub use models::{
    ChartSeries, ChartSet, ClientHistory, ClientRoster, ClientSummary, DashboardSummary,
    DashboardView, HealthReport, IngestAck, MetricPayload, MetricsOverview, Signal,
};
