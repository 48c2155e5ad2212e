use super::Metric;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Oldest-first copies of every rolling series, indexed by [`Metric::index`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesSnapshot {
    series: [Vec<f64>; 5],
}

impl SeriesSnapshot {
    pub fn new(series: [Vec<f64>; 5]) -> Self {
        Self { series }
    }

    pub fn get(&self, metric: Metric) -> &[f64] {
        &self.series[metric.index()]
    }
}

/// Everything one sampling tick produced. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleResult {
    /// Tick sequence number, starting at 1.
    pub tick: u64,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    /// KB/s
    pub net_sent_rate: f64,
    /// KB/s
    pub net_recv_rate: f64,
    /// Metrics whose alert gate went from quiet to firing on this tick.
    pub alerts_fired: BTreeSet<Metric>,
    pub series: SeriesSnapshot,
}

impl SampleResult {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Cpu => self.cpu_percent,
            Metric::Memory => self.memory_percent,
            Metric::Disk => self.disk_percent,
            Metric::NetSent => self.net_sent_rate,
            Metric::NetRecv => self.net_recv_rate,
        }
    }

    pub fn fired(&self, metric: Metric) -> bool {
        self.alerts_fired.contains(&metric)
    }
}
