use crate::backend::alert::AlertGate;
use crate::backend::rate::RateCounter;
use crate::backend::series::RollingSeries;
use crate::backend::source::MetricSource;
use crate::error::MetricError;
use crate::model::{AlertThresholds, Metric, SampleResult, SeriesSnapshot};
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use std::time::Instant;

/// Elapsed time assumed for the first tick.
pub const NOMINAL_PERIOD_SECS: f64 = 1.0;

/// Settings a tick reads once at its start. Changes apply from the next tick.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerSettings {
    pub thresholds: AlertThresholds,
    pub disk_path: PathBuf,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            thresholds: AlertThresholds::default(),
            disk_path: PathBuf::from("/"),
        }
    }
}

/// Owns all state that survives between ticks: history, network counter
/// baselines and alert gates.
pub struct MetricSampler {
    source: Box<dyn MetricSource>,
    series: [RollingSeries; 5],
    gates: [AlertGate; 3],
    sent: RateCounter,
    recv: RateCounter,
    last_tick: Option<Instant>,
    ticks: u64,
    // Metrics whose last read failed, so a persistent failure logs once.
    failing: HashSet<Metric>,
}

impl MetricSampler {
    pub fn new(mut source: Box<dyn MetricSource>, history_len: usize) -> Self {
        let (sent, recv) = match source.net_counters() {
            Ok(c) => (RateCounter::primed(c.bytes_sent), RateCounter::primed(c.bytes_recv)),
            Err(e) => {
                log::warn!("Could not prime network counters: {}", e);
                (RateCounter::new(), RateCounter::new())
            }
        };
        Self {
            source,
            series: std::array::from_fn(|_| RollingSeries::new(history_len, 0.0)),
            gates: Default::default(),
            sent,
            recv,
            last_tick: None,
            ticks: 0,
            failing: HashSet::new(),
        }
    }

    /// Runs one sampling tick at time `now`.
    pub fn tick(&mut self, settings: &SamplerSettings, now: Instant) -> SampleResult {
        let elapsed = match self.last_tick {
            Some(prev) => now.saturating_duration_since(prev).as_secs_f64(),
            None => NOMINAL_PERIOD_SECS,
        };
        self.last_tick = Some(now);
        self.ticks += 1;

        let cpu = self.source.cpu_percent();
        let cpu_percent = self.or_zero(Metric::Cpu, cpu);
        let memory = self.source.memory_percent();
        let memory_percent = self.or_zero(Metric::Memory, memory);
        let disk = self.source.disk_percent(&settings.disk_path);
        let disk_percent = self.or_zero(Metric::Disk, disk);

        let (net_sent_rate, net_recv_rate) = match self.source.net_counters() {
            Ok(counters) => {
                self.failing.remove(&Metric::NetSent);
                (
                    self.sent.update(counters.bytes_sent, elapsed) / 1024.0,
                    self.recv.update(counters.bytes_recv, elapsed) / 1024.0,
                )
            }
            Err(e) => {
                self.report_failure(Metric::NetSent, &e);
                (0.0, 0.0)
            }
        };

        let values = [cpu_percent, memory_percent, disk_percent, net_sent_rate, net_recv_rate];
        for metric in Metric::ALL {
            self.series[metric.index()].push(values[metric.index()]);
        }

        let mut alerts_fired = BTreeSet::new();
        for metric in Metric::ALERTING {
            let Some(threshold) = settings.thresholds.get(metric) else {
                continue;
            };
            let value = values[metric.index()];
            if self.gates[metric.index()].evaluate(value, threshold) {
                log::debug!("{} over threshold: {:.1}% (threshold {}%)", metric, value, threshold);
                alerts_fired.insert(metric);
            }
        }

        SampleResult {
            tick: self.ticks,
            cpu_percent,
            memory_percent,
            disk_percent,
            net_sent_rate,
            net_recv_rate,
            alerts_fired,
            series: self.snapshot(),
        }
    }

    pub fn series(&self, metric: Metric) -> &RollingSeries {
        &self.series[metric.index()]
    }

    pub fn snapshot(&self) -> SeriesSnapshot {
        SeriesSnapshot::new(std::array::from_fn(|i| self.series[i].snapshot()))
    }

    pub fn is_firing(&self, metric: Metric) -> bool {
        metric.is_alerting() && self.gates[metric.index()].is_firing()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn or_zero(&mut self, metric: Metric, reading: Result<f64, MetricError>) -> f64 {
        match reading {
            Ok(value) if value.is_finite() => {
                self.failing.remove(&metric);
                value
            }
            Ok(value) => {
                self.report_failure(metric, &MetricError::parse(format!("{} reading {}", metric, value)));
                0.0
            }
            Err(e) => {
                self.report_failure(metric, &e);
                0.0
            }
        }
    }

    fn report_failure(&mut self, metric: Metric, error: &MetricError) {
        if self.failing.insert(metric) {
            log::warn!("{} unavailable, using 0: {}", metric, error);
        } else {
            log::debug!("{} still unavailable: {}", metric, error);
        }
    }
}
