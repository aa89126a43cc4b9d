use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// One metric sample exactly as an agent sent it.
///
/// The payload is schema-agnostic: the well-known fields (`client_name`,
/// `timestamp`, `cpu_percent`, `ram`, ...) are read through accessors, and
/// everything else is carried along untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricPayload(Map<String, Value>);

impl MetricPayload {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the field as a string slice when it is a non-empty JSON string.
    pub fn non_empty_str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn f64_field(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    pub fn bool_field(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for MetricPayload {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestAck {
    pub status: String,
    pub message: String,
    pub client_id: String,
}

impl IngestAck {
    pub fn accepted(client_id: String) -> Self {
        Self {
            status: "success".to_string(),
            message: "Metrics received".to_string(),
            client_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsOverview {
    pub total_entries: usize,
    pub total_clients: u64,
    pub metrics: Vec<MetricPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientHistory {
    pub client_id: String,
    pub total_entries: usize,
    pub metrics: Vec<MetricPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSummary {
    pub client_id: String,
    pub client_name: String,
    pub last_seen: Option<String>,
    pub metric_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRoster {
    pub total_clients: usize,
    pub clients: Vec<ClientSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clients: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}

impl HealthReport {
    pub fn healthy(clients: u64, timestamp: String) -> Self {
        Self {
            status: "healthy".to_string(),
            clients: Some(clients),
            error: None,
            timestamp,
        }
    }

    pub fn unhealthy(error: String, timestamp: String) -> Self {
        Self {
            status: "unhealthy".to_string(),
            clients: None,
            error: Some(error),
            timestamp,
        }
    }
}

/// A measured dimension that is charted independently of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Cpu,
    Ram,
    Gpu,
    Ping,
}

impl Signal {
    /// Display order of the dashboard charts.
    pub const ALL: [Signal; 4] = [Signal::Cpu, Signal::Ram, Signal::Gpu, Signal::Ping];

    pub fn display_name(self) -> &'static str {
        match self {
            Signal::Cpu => "CPU Usage",
            Signal::Ram => "RAM Usage",
            Signal::Gpu => "GPU Usage",
            Signal::Ping => "Network Latency",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Signal::Cpu => "CPU Usage Over Time",
            Signal::Ram => "RAM Usage Over Time",
            Signal::Gpu => "GPU Usage Over Time",
            Signal::Ping => "Network Latency Over Time",
        }
    }

    pub fn y_label(self) -> &'static str {
        match self {
            Signal::Cpu => "CPU Usage (%)",
            Signal::Ram => "RAM Usage (%)",
            Signal::Gpu => "GPU Usage (%)",
            Signal::Ping => "Ping (ms)",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Signal::Cpu => "#667eea",
            Signal::Ram => "#764ba2",
            Signal::Gpu => "#22c55e",
            Signal::Ping => "#f59e0b",
        }
    }

    /// Fixed upper bound of the y axis; latency is unbounded.
    pub fn y_max(self) -> Option<f64> {
        match self {
            Signal::Ping => None,
            _ => Some(100.0),
        }
    }
}

/// Time-labelled points of one signal, ready for a line chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub signal: Signal,
    pub title: String,
    pub y_label: String,
    pub color: String,
    pub y_max: Option<f64>,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    pub fn new(signal: Signal, labels: Vec<String>, values: Vec<f64>) -> Self {
        Self {
            signal,
            title: signal.title().to_string(),
            y_label: signal.y_label().to_string(),
            color: signal.color().to_string(),
            y_max: signal.y_max(),
            labels,
            values,
        }
    }
}

/// Charts keyed by signal display name; serializes as a JSON object in
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSet {
    series: Vec<ChartSeries>,
}

impl ChartSet {
    pub fn push(&mut self, series: ChartSeries) {
        self.series.retain(|s| s.signal != series.signal);
        self.series.push(series);
    }

    pub fn get(&self, name: &str) -> Option<&ChartSeries> {
        self.series
            .iter()
            .find(|s| s.signal.display_name() == name)
    }

    pub fn signal(&self, signal: Signal) -> Option<&ChartSeries> {
        self.series.iter().find(|s| s.signal == signal)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl Serialize for ChartSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.series.len()))?;
        for series in &self.series {
            map.serialize_entry(series.signal.display_name(), series)?;
        }
        map.end()
    }
}

/// Everything the dashboard view needs, prepared for an external renderer.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub metrics: Vec<MetricPayload>,
    pub latest_metrics: Option<MetricPayload>,
    pub recent_metrics: Vec<MetricPayload>,
    pub charts: ChartSet,
    pub total_clients: u64,
    pub total_metrics: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub identity: String,
    pub base_url: String,
    #[serde(flatten)]
    pub summary: DashboardSummary,
}
