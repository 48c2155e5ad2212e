use super::Metric;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            cpu: 90.0,
            memory: 85.0,
            disk: 90.0,
        }
    }
}

impl AlertThresholds {
    /// Builds a validated set. Every value must be a finite percentage.
    pub fn new(cpu: f64, memory: f64, disk: f64) -> Result<Self, ConfigError> {
        let thresholds = Self { cpu, memory, disk };
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Parses thresholds as typed into a settings form.
    pub fn parse(cpu: &str, memory: &str, disk: &str) -> Result<Self, ConfigError> {
        Self::new(
            parse_one(Metric::Cpu, cpu)?,
            parse_one(Metric::Memory, memory)?,
            parse_one(Metric::Disk, disk)?,
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for metric in Metric::ALERTING {
            let value = self.get(metric).unwrap_or_default();
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::InvalidThreshold { metric, value });
            }
        }
        Ok(())
    }

    /// Threshold for an alerting metric; network metrics have none.
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Cpu => Some(self.cpu),
            Metric::Memory => Some(self.memory),
            Metric::Disk => Some(self.disk),
            Metric::NetSent | Metric::NetRecv => None,
        }
    }
}

fn parse_one(metric: Metric, input: &str) -> Result<f64, ConfigError> {
    input
        .trim()
        .parse::<f64>()
        .map_err(|_| ConfigError::NotANumber {
            metric,
            input: input.to_string(),
        })
}
