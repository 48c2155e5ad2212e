use crate::error::TerminationError;
use crate::model::status_name;
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::collections::HashMap;
use std::fs;
use std::io;

/// Raw per-process reading, before classification.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessSample {
    pub pid: i32,
    pub name: String,
    pub status: String,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub memory_bytes: u64,
    pub start_time: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Exited between listing `/proc` and reading their files.
    pub vanished: usize,
    /// Could not be read for lack of permission.
    pub denied: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ProcessScan {
    pub processes: Vec<ProcessSample>,
    pub stats: ScanStats,
}

/// The OS process table.
pub trait ProcessTable: Send {
    /// Reads every process that can be read. Failures are counted, not returned.
    fn scan(&mut self) -> ProcessScan;

    /// Asks the OS to terminate `pid`. Does not wait for it to exit.
    fn terminate(&self, pid: i32) -> Result<(), TerminationError>;
}

/// `/proc` backed process table.
///
/// CPU percent is the share of CPU time used since the previous scan, scaled
/// by core count; a process seen for the first time reports 0.
pub struct ProcTable {
    // (pid, start_time) -> cumulative cpu ticks at the previous scan
    prev_cpu: HashMap<(i32, u64), u64>,
    prev_total_cpu: u64,
    total_memory: u64,
    num_cores: usize,
}

impl ProcTable {
    pub fn new() -> Self {
        Self {
            prev_cpu: HashMap::new(),
            prev_total_cpu: 0,
            total_memory: total_memory(),
            num_cores: num_cpus(),
        }
    }
}

impl Default for ProcTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable for ProcTable {
    fn scan(&mut self) -> ProcessScan {
        let total_cpu = read_total_cpu_time();
        let delta_total = total_cpu.saturating_sub(self.prev_total_cpu);
        let first_scan = self.prev_total_cpu == 0;

        let mut scan = ProcessScan::default();
        let mut seen = HashMap::new();

        let entries = match fs::read_dir("/proc") {
            Ok(entries) => entries,
            Err(e) => {
                log::error!("Failed to list /proc: {}", e);
                return scan;
            }
        };

        for entry in entries.flatten() {
            let pid: i32 = match entry.file_name().to_string_lossy().parse() {
                Ok(p) => p,
                Err(_) => continue,
            };

            let raw = match read_process(pid) {
                Ok(raw) => raw,
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                    scan.stats.denied += 1;
                    continue;
                }
                Err(_) => {
                    scan.stats.vanished += 1;
                    continue;
                }
            };

            let key = (pid, raw.start_time);
            let cpu_percent = match self.prev_cpu.get(&key) {
                Some(&prev) if !first_scan && delta_total > 0 => {
                    raw.cpu_time.saturating_sub(prev) as f64 / delta_total as f64
                        * 100.0
                        * self.num_cores as f64
                }
                _ => 0.0,
            };
            seen.insert(key, raw.cpu_time);

            let memory_percent = if self.total_memory > 0 {
                raw.memory_bytes as f64 / self.total_memory as f64 * 100.0
            } else {
                0.0
            };

            scan.processes.push(ProcessSample {
                pid,
                name: raw.name,
                status: status_name(&raw.state).to_string(),
                cpu_percent,
                memory_percent,
                memory_bytes: raw.memory_bytes,
                start_time: raw.start_time,
            });
        }

        // Only live (pid, start_time) pairs survive, so a reused pid starts fresh.
        self.prev_cpu = seen;
        self.prev_total_cpu = total_cpu;

        if scan.stats != ScanStats::default() {
            log::debug!(
                "Process scan skipped {} vanished, {} inaccessible",
                scan.stats.vanished,
                scan.stats.denied
            );
        }
        scan
    }

    fn terminate(&self, pid: i32) -> Result<(), TerminationError> {
        terminate(pid)
    }
}

/// Sends SIGTERM to `pid`.
pub fn terminate(pid: i32) -> Result<(), TerminationError> {
    // 0 and negative pids address process groups.
    if pid <= 0 {
        return Err(TerminationError::NotFound(pid));
    }
    match signal::kill(Pid::from_raw(pid), Signal::SIGTERM) {
        Ok(()) => {
            log::info!("Sent SIGTERM to PID {}", pid);
            Ok(())
        }
        Err(Errno::ESRCH) => Err(TerminationError::NotFound(pid)),
        Err(Errno::EPERM) => {
            log::error!("Permission denied sending SIGTERM to PID {}", pid);
            Err(TerminationError::AccessDenied(pid))
        }
        Err(e) => {
            log::error!("Failed to send SIGTERM to PID {}: {}", pid, e);
            Err(TerminationError::Unknown {
                pid,
                detail: e.to_string(),
            })
        }
    }
}

struct RawProcess {
    name: String,
    state: String,
    cpu_time: u64,
    start_time: u64,
    memory_bytes: u64,
}

fn read_process(pid: i32) -> io::Result<RawProcess> {
    let stat = fs::read_to_string(format!("/proc/{}/stat", pid))?;
    let status = fs::read_to_string(format!("/proc/{}/status", pid))?;
    parse_process(&stat, &status)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "malformed stat"))
}

fn parse_process(stat: &str, status: &str) -> Option<RawProcess> {
    // comm may itself contain spaces and parentheses.
    let comm_start = stat.find('(')?;
    let comm_end = stat.rfind(')')?;
    let name = stat.get(comm_start + 1..comm_end)?.to_string();

    let fields: Vec<&str> = stat.get(comm_end + 2..)?.split_whitespace().collect();
    if fields.len() < 22 {
        return None;
    }

    let utime: u64 = fields[11].parse().unwrap_or(0);
    let stime: u64 = fields[12].parse().unwrap_or(0);
    let start_time = fields[19].parse().unwrap_or(0);

    let memory_bytes = status
        .lines()
        .find_map(|line| line.strip_prefix("VmRSS:"))
        .and_then(|val| val.split_whitespace().next())
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0)
        * 1024;

    Some(RawProcess {
        name,
        state: fields[0].to_string(),
        cpu_time: utime + stime,
        start_time,
        memory_bytes,
    })
}

fn read_total_cpu_time() -> u64 {
    fs::read_to_string("/proc/stat")
        .unwrap_or_default()
        .lines()
        .next()
        .map(|line| {
            line.split_whitespace()
                .skip(1)
                .take(8)
                .filter_map(|s| s.parse::<u64>().ok())
                .sum()
        })
        .unwrap_or(0)
}

fn total_memory() -> u64 {
    fs::read_to_string("/proc/meminfo")
        .unwrap_or_default()
        .lines()
        .find(|l| l.starts_with("MemTotal:"))
        .and_then(|l| l.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0)
        * 1024
}

fn num_cpus() -> usize {
    fs::read_to_string("/proc/stat")
        .unwrap_or_default()
        .lines()
        .filter(|l| l.starts_with("cpu") && !l.starts_with("cpu "))
        .count()
        .max(1)
}
