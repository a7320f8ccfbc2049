//! Indicator lines and trade markers collected over a run.

use rotation_engines::{ChartMarker, IterationReport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Chart data accumulated from iteration reports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartLog {
    /// Line name to (unix millis, value) samples
    pub lines: BTreeMap<String, Vec<(i64, f64)>>,
    pub markers: Vec<ChartMarker>,
}

impl ChartLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the lines and markers of one iteration.
    pub fn record(&mut self, report: &IterationReport) {
        for point in &report.lines {
            self.lines
                .entry(point.name.clone())
                .or_default()
                .push((point.timestamp.timestamp_millis(), point.value));
        }
        self.markers.extend(report.markers.iter().cloned());
    }

    pub fn line(&self, name: &str) -> Option<&[(i64, f64)]> {
        self.lines.get(name).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.markers.is_empty()
    }

    /// Long-format CSV: one row per sample.
    pub fn lines_to_csv(&self) -> String {
        let mut csv = String::from("timestamp,line,value\n");
        for (name, points) in &self.lines {
            for (ts, value) in points {
                csv.push_str(&format!("{},{},{}\n", ts, name, value));
            }
        }
        csv
    }

    pub fn markers_to_csv(&self) -> String {
        let mut csv = String::from("timestamp,asset,side,price\n");
        for marker in &self.markers {
            let price = marker.price.map(|p| p.to_string()).unwrap_or_default();
            csv.push_str(&format!(
                "{},{},{},{}\n",
                marker.timestamp.timestamp_millis(),
                marker.asset,
                marker.side,
                price
            ));
        }
        csv
    }
}
