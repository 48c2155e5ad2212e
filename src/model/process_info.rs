use serde::{Deserialize, Serialize};

/// One process as seen by a single catalog query.
///
/// A snapshot value: `pid` is only meaningful within the query that produced
/// it. `start_time` (clock ticks after boot) tells a reused pid apart from the
/// process that held it before.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: i32,
    pub name: String,
    pub status: String,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub memory_bytes: u64,
    pub is_application: bool,
    pub window_title: String,
    pub start_time: u64,
}

impl Default for ProcessInfo {
    fn default() -> Self {
        Self {
            pid: 0,
            name: String::new(),
            status: String::from("unknown"),
            cpu_percent: 0.0,
            memory_percent: 0.0,
            memory_bytes: 0,
            is_application: false,
            window_title: String::new(),
            start_time: 0,
        }
    }
}

impl ProcessInfo {
    pub fn memory_mb(&self) -> f64 {
        self.memory_bytes as f64 / 1024.0 / 1024.0
    }
}

/// Placeholder shown when no window title could be resolved for `pid`.
pub fn placeholder_title(pid: i32) -> String {
    format!("Process {}", pid)
}

/// Maps the single-letter state from `/proc/<pid>/stat` to a readable word.
pub fn status_name(state: &str) -> &'static str {
    match state {
        "R" => "running",
        "S" => "sleeping",
        "D" => "disk-sleep",
        "T" => "stopped",
        "t" => "tracing-stop",
        "Z" => "zombie",
        "X" | "x" => "dead",
        "K" => "wake-kill",
        "W" => "waking",
        "P" => "parked",
        "I" => "idle",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_letters() {
        assert_eq!(status_name("R"), "running");
        assert_eq!(status_name("Z"), "zombie");
        assert_eq!(status_name("I"), "idle");
        assert_eq!(status_name("?"), "unknown");
    }

    #[test]
    fn memory_mb_converts_bytes() {
        let info = ProcessInfo {
            memory_bytes: 50 * 1024 * 1024,
            ..Default::default()
        };
        assert_eq!(info.memory_mb(), 50.0);
    }
}
