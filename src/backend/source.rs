use crate::error::MetricError;
use std::fs;
use std::path::{Path, PathBuf};

/// Cumulative byte counters summed over all non-loopback interfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetCounters {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
}

/// Where the sampler gets its raw readings from.
pub trait MetricSource: Send {
    /// Total CPU load since the previous call, in percent.
    fn cpu_percent(&mut self) -> Result<f64, MetricError>;
    fn memory_percent(&mut self) -> Result<f64, MetricError>;
    fn disk_percent(&mut self, path: &Path) -> Result<f64, MetricError>;
    fn net_counters(&mut self) -> Result<NetCounters, MetricError>;
}

/// Reads `/proc` and `statvfs` directly.
pub struct ProcSource {
    prev_total: u64,
    prev_idle: u64,
}

impl ProcSource {
    pub fn new() -> Self {
        let mut source = Self {
            prev_total: 0,
            prev_idle: 0,
        };
        // Prime the jiffy counters so the first tick is not an average since boot.
        if let Err(e) = source.cpu_percent() {
            log::warn!("Could not prime CPU counters: {}", e);
        }
        source
    }
}

impl Default for ProcSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricSource for ProcSource {
    fn cpu_percent(&mut self) -> Result<f64, MetricError> {
        let stat = read("/proc/stat")?;
        let (total, idle) = parse_cpu_line(&stat).ok_or_else(|| MetricError::parse("/proc/stat"))?;

        let dtotal = total.saturating_sub(self.prev_total);
        let didle = idle.saturating_sub(self.prev_idle);
        self.prev_total = total;
        self.prev_idle = idle;

        Ok(if dtotal > 0 {
            (dtotal.saturating_sub(didle) as f64 / dtotal as f64) * 100.0
        } else {
            0.0
        })
    }

    fn memory_percent(&mut self) -> Result<f64, MetricError> {
        let meminfo = read("/proc/meminfo")?;
        parse_memory_percent(&meminfo).ok_or_else(|| MetricError::parse("/proc/meminfo"))
    }

    fn disk_percent(&mut self, path: &Path) -> Result<f64, MetricError> {
        let stat = nix::sys::statvfs::statvfs(path).map_err(|source| MetricError::DiskUsage {
            path: path.to_path_buf(),
            source,
        })?;
        let frsize = stat.fragment_size() as u64;
        Ok(disk_percent(
            stat.blocks() as u64 * frsize,
            stat.blocks_free() as u64 * frsize,
            stat.blocks_available() as u64 * frsize,
        ))
    }

    fn net_counters(&mut self) -> Result<NetCounters, MetricError> {
        let netdev = read("/proc/net/dev")?;
        Ok(parse_net_dev(&netdev))
    }
}

fn read(path: &str) -> Result<String, MetricError> {
    fs::read_to_string(path).map_err(|e| MetricError::io(path, e))
}

/// Aggregate `cpu` line of `/proc/stat` as (total, idle) jiffies.
fn parse_cpu_line(stat: &str) -> Option<(u64, u64)> {
    let line = stat.lines().find(|l| l.starts_with("cpu "))?;
    let parts: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map(|s| s.parse().unwrap_or(0))
        .collect();
    if parts.len() < 7 {
        return None;
    }
    // user nice system idle iowait irq softirq [steal ...]
    let total: u64 = parts.iter().take(8).sum();
    let idle = parts[3] + parts[4];
    Some((total, idle))
}

fn parse_memory_percent(meminfo: &str) -> Option<f64> {
    let mut total = None;
    let mut available = None;
    for line in meminfo.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 {
            continue;
        }
        match parts[0] {
            "MemTotal:" => total = parts[1].parse::<u64>().ok(),
            "MemAvailable:" => available = parts[1].parse::<u64>().ok(),
            _ => {}
        }
    }
    let total = total.filter(|&t| t > 0)?;
    let used = total.saturating_sub(available?);
    Some(used as f64 / total as f64 * 100.0)
}

fn parse_net_dev(netdev: &str) -> NetCounters {
    let mut counters = NetCounters::default();
    for line in netdev.lines().skip(2) {
        let Some((name, rest)) = line.split_once(':') else {
            continue;
        };
        if name.trim() == "lo" {
            continue;
        }
        let parts: Vec<&str> = rest.split_whitespace().collect();
        if parts.len() < 9 {
            continue;
        }
        counters.bytes_recv += parts[0].parse::<u64>().unwrap_or(0);
        counters.bytes_sent += parts[8].parse::<u64>().unwrap_or(0);
    }
    counters
}

/// Used space as a share of what an unprivileged user can reach, like `df`.
fn disk_percent(total: u64, free: u64, available: u64) -> f64 {
    let used = total.saturating_sub(free);
    let usable = used + available;
    if usable == 0 {
        return 0.0;
    }
    used as f64 / usable as f64 * 100.0
}

/// Mount points from `/proc/mounts`, for choosing which disk to sample.
pub fn mount_points() -> Vec<PathBuf> {
    fs::read_to_string("/proc/mounts")
        .map(|mounts| parse_mounts(&mounts))
        .unwrap_or_default()
}

fn parse_mounts(mounts: &str) -> Vec<PathBuf> {
    const VIRTUAL: &[&str] = &[
        "proc", "sysfs", "devtmpfs", "devpts", "tmpfs", "cgroup", "cgroup2", "securityfs",
        "pstore", "debugfs", "tracefs", "mqueue", "hugetlbfs", "configfs", "fusectl",
        "autofs", "bpf", "binfmt_misc", "efivarfs", "overlay", "squashfs", "nsfs",
    ];
    let mut points = Vec::new();
    for line in mounts.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 || VIRTUAL.contains(&parts[2]) {
            continue;
        }
        // Spaces in mount points are octal-escaped.
        let point = PathBuf::from(parts[1].replace("\\040", " "));
        if !points.contains(&point) {
            points.push(point);
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_line_totals() {
        let stat = "cpu  100 0 50 800 50 0 0 0 0 0\ncpu0 50 0 25 400 25 0 0 0 0 0\n";
        assert_eq!(parse_cpu_line(stat), Some((1000, 850)));
        assert_eq!(parse_cpu_line("intr 1 2 3"), None);
    }

    #[test]
    fn memory_percent_uses_available() {
        let meminfo = "MemTotal:       1000 kB\nMemFree:         100 kB\nMemAvailable:    250 kB\n";
        assert_eq!(parse_memory_percent(meminfo), Some(75.0));
        assert_eq!(parse_memory_percent("MemTotal: 0 kB\nMemAvailable: 0 kB\n"), None);
    }

    #[test]
    fn net_dev_skips_loopback() {
        let netdev = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 9999 10 0 0 0 0 0 0 9999 10 0 0 0 0 0 0
  eth0: 1000 10 0 0 0 0 0 0 2000 20 0 0 0 0 0 0
 wlan0:500 5 0 0 0 0 0 0 700 7 0 0 0 0 0 0
";
        assert_eq!(
            parse_net_dev(netdev),
            NetCounters {
                bytes_sent: 2700,
                bytes_recv: 1500
            }
        );
    }

    #[test]
    fn disk_percent_matches_df() {
        assert_eq!(disk_percent(100, 40, 40), 60.0);
        // Reserved blocks: free 20 but only 10 available to users.
        assert!((disk_percent(100, 20, 10) - 88.888).abs() < 0.01);
        assert_eq!(disk_percent(0, 0, 0), 0.0);
    }

    #[test]
    fn mounts_skip_virtual_filesystems() {
        let mounts = "\
/dev/sda1 / ext4 rw 0 0
proc /proc proc rw 0 0
tmpfs /run tmpfs rw 0 0
/dev/sdb1 /mnt/my\\040disk ext4 rw 0 0
";
        assert_eq!(
            parse_mounts(mounts),
            vec![PathBuf::from("/"), PathBuf::from("/mnt/my disk")]
        );
    }

    #[test]
    fn missing_disk_path_is_an_error() {
        let mut source = ProcSource {
            prev_total: 0,
            prev_idle: 0,
        };
        let err = source
            .disk_percent(Path::new("/definitely/not/mounted/here"))
            .unwrap_err();
        assert!(matches!(err, MetricError::DiskUsage { .. }));
    }
}
