use pulsewatch_shared::{ChartSeries, ChartSet, MetricPayload, Signal};
use serde_json::Value;
use thiserror::Error;

/// A single point cannot show a trend.
pub const MIN_POINTS: usize = 2;

/// Characters kept from the end of a timestamp for the axis label.
pub const LABEL_CHARS: usize = 8;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("{signal:?} value {value} is not a number")]
    NonNumericValue { signal: Signal, value: String },
    #[error("timestamp {0} is not a string")]
    NonStringTimestamp(String),
}

/// Builds one series per signal from records in ascending time order.
///
/// Each signal is filtered independently, so a record without CPU data
/// still contributes to the RAM series. Signals with fewer than
/// [`MIN_POINTS`] values are left out.
pub fn derive_charts(records: &[MetricPayload]) -> Result<ChartSet, ChartError> {
    log::info!("Generating charts from {} metrics", records.len());
    let mut charts = ChartSet::default();

    for signal in Signal::ALL {
        let mut labels = Vec::new();
        let mut values = Vec::new();

        for record in records {
            let Some(value) = signal_value(signal, record)? else {
                continue;
            };
            labels.push(time_label(record_timestamp(record)?));
            values.push(value);
        }

        if values.len() < MIN_POINTS {
            log::debug!("Not enough {:?} data for a chart ({} points)", signal, values.len());
            continue;
        }

        log::debug!("{} chart generated with {} points", signal.display_name(), values.len());
        charts.push(ChartSeries::new(signal, labels, values));
    }

    log::info!("Generated {} charts total", charts.len());
    Ok(charts)
}

/// [`derive_charts`] for views: a failure is logged and yields no charts.
pub fn charts_or_empty(records: &[MetricPayload]) -> ChartSet {
    derive_charts(records).unwrap_or_else(|e| {
        log::error!("Chart generation failed: {}", e);
        ChartSet::default()
    })
}

/// Last [`LABEL_CHARS`] characters of the timestamp, taken verbatim.
pub fn time_label(timestamp: &str) -> String {
    let skip = timestamp.chars().count().saturating_sub(LABEL_CHARS);
    timestamp.chars().skip(skip).collect()
}

fn signal_value(signal: Signal, record: &MetricPayload) -> Result<Option<f64>, ChartError> {
    let raw = match signal {
        Signal::Cpu => record.get("cpu_percent"),
        Signal::Gpu => record.get("gpu_percent"),
        Signal::Ping => record.get("ping_ms"),
        Signal::Ram => record
            .get("ram")
            .and_then(Value::as_object)
            .and_then(|ram| ram.get("percent")),
    };

    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(other) => Err(ChartError::NonNumericValue {
            signal,
            value: other.to_string(),
        }),
    }
}

fn record_timestamp(record: &MetricPayload) -> Result<&str, ChartError> {
    match record.get("timestamp") {
        None | Some(Value::Null) => Ok(""),
        Some(Value::String(ts)) => Ok(ts.as_str()),
        Some(other) => Err(ChartError::NonStringTimestamp(other.to_string())),
    }
}
