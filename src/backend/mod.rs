pub mod alert;
pub mod catalog;
pub mod classifier;
pub mod desktop_resolver;
pub mod process;
pub mod rate;
pub mod sampler;
pub mod scheduler;
pub mod series;
pub mod source;
pub mod window_resolver;

pub use alert::{AlertGate, GateState};
pub use catalog::ProcessCatalog;
pub use classifier::{AppClassifier, HeuristicClassifier};
pub use desktop_resolver::DesktopResolver;
pub use process::{ProcTable, ProcessSample, ProcessScan, ProcessTable, ScanStats};
pub use rate::RateCounter;
pub use sampler::{MetricSampler, SamplerSettings};
pub use scheduler::{ChannelSink, SampleSink, Scheduler, SchedulerControl};
pub use series::RollingSeries;
pub use source::{MetricSource, NetCounters, ProcSource};
pub use window_resolver::{NoTitles, TitleSource, WindowResolver};
