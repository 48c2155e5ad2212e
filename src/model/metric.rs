use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Cpu,
    Memory,
    Disk,
    NetSent,
    NetRecv,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Cpu,
        Metric::Memory,
        Metric::Disk,
        Metric::NetSent,
        Metric::NetRecv,
    ];

    /// Metrics that carry an alert threshold.
    pub const ALERTING: [Metric; 3] = [Metric::Cpu, Metric::Memory, Metric::Disk];

    pub fn index(self) -> usize {
        match self {
            Metric::Cpu => 0,
            Metric::Memory => 1,
            Metric::Disk => 2,
            Metric::NetSent => 3,
            Metric::NetRecv => 4,
        }
    }

    pub fn is_alerting(self) -> bool {
        matches!(self, Metric::Cpu | Metric::Memory | Metric::Disk)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Cpu => write!(f, "cpu"),
            Metric::Memory => write!(f, "memory"),
            Metric::Disk => write!(f, "disk"),
            Metric::NetSent => write!(f, "net_sent"),
            Metric::NetRecv => write!(f, "net_recv"),
        }
    }
}
