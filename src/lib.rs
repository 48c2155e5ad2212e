//! Host resource sampling for Linux: CPU, memory, disk and network history
//! with edge-triggered alerts, plus an on-demand process catalog.

pub mod backend;
pub mod config;
pub mod error;
pub mod model;
pub mod monitor;

pub use backend::{
    AlertGate, AppClassifier, ChannelSink, HeuristicClassifier, MetricSampler, MetricSource,
    NetCounters, ProcessCatalog, ProcessTable, RateCounter, RollingSeries, SampleSink,
    SamplerSettings, Scheduler,
};
pub use config::Config;
pub use error::{ConfigError, MetricError, TerminationError};
pub use model::{AlertThresholds, Metric, ProcessInfo, SampleResult};
pub use monitor::Monitor;
