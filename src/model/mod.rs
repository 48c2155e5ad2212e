mod metric;
mod process_info;
mod sample;
mod thresholds;

pub use metric::Metric;
pub use process_info::{placeholder_title, status_name, ProcessInfo};
pub use sample::{SampleResult, SeriesSnapshot};
pub use thresholds::AlertThresholds;
