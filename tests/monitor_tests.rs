use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use system_monitor_linux::backend::{ProcessSample, ProcessScan, ScanStats};
use system_monitor_linux::{
    ChannelSink, ConfigError, Metric, MetricError, MetricSampler, MetricSource, Monitor,
    NetCounters, ProcessCatalog, ProcessTable, SampleResult, SamplerSettings, TerminationError,
};

#[derive(Clone)]
struct Steady {
    cpu: Arc<Mutex<f64>>,
    disk_paths: Arc<Mutex<Vec<PathBuf>>>,
}

impl MetricSource for Steady {
    fn cpu_percent(&mut self) -> Result<f64, MetricError> {
        Ok(*self.cpu.lock().unwrap())
    }

    fn memory_percent(&mut self) -> Result<f64, MetricError> {
        Ok(40.0)
    }

    fn disk_percent(&mut self, path: &Path) -> Result<f64, MetricError> {
        self.disk_paths.lock().unwrap().push(path.to_path_buf());
        Ok(30.0)
    }

    fn net_counters(&mut self) -> Result<NetCounters, MetricError> {
        Ok(NetCounters::default())
    }
}

struct OneProcess;

impl ProcessTable for OneProcess {
    fn scan(&mut self) -> ProcessScan {
        ProcessScan {
            processes: vec![ProcessSample {
                pid: 42,
                name: "firefox".to_string(),
                status: "running".to_string(),
                cpu_percent: 5.0,
                memory_percent: 3.0,
                memory_bytes: 300 * 1024 * 1024,
                start_time: 7,
            }],
            stats: ScanStats { vanished: 2, denied: 0 },
        }
    }

    fn terminate(&self, pid: i32) -> Result<(), TerminationError> {
        match pid {
            42 => Err(TerminationError::AccessDenied(42)),
            _ => Err(TerminationError::NotFound(pid)),
        }
    }
}

fn monitor(source: Steady) -> Monitor {
    Monitor::from_parts(
        MetricSampler::new(Box::new(source), 60),
        ProcessCatalog::new(Box::new(OneProcess)),
        SamplerSettings::default(),
        Duration::from_millis(10),
    )
}

fn steady(cpu: f64) -> Steady {
    Steady {
        cpu: Arc::new(Mutex::new(cpu)),
        disk_paths: Arc::new(Mutex::new(Vec::new())),
    }
}

fn next(rx: &flume::Receiver<SampleResult>) -> SampleResult {
    rx.recv_timeout(Duration::from_secs(5)).expect("tick")
}

#[test]
fn invalid_thresholds_keep_previous_values() {
    let monitor = monitor(steady(10.0));
    monitor.set_thresholds(70.0, 60.0, 80.0).unwrap();

    let err = monitor.set_thresholds(f64::NAN, 60.0, 80.0).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidThreshold { metric: Metric::Cpu, .. }));
    let err = monitor.set_thresholds(50.0, -1.0, 80.0).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidThreshold { metric: Metric::Memory, .. }));

    let t = monitor.thresholds();
    assert_eq!((t.cpu, t.memory, t.disk), (70.0, 60.0, 80.0));
}

#[test]
fn end_to_end_cpu_alert_cycle() {
    let source = steady(95.0);
    let cpu = Arc::clone(&source.cpu);
    let monitor = monitor(source);
    let (tx, rx) = flume::unbounded();
    monitor.on_sample(ChannelSink(tx)).unwrap();

    assert!(next(&rx).fired(Metric::Cpu));
    assert!(next(&rx).alerts_fired.is_empty());

    monitor.pause();
    rx.drain().for_each(drop);
    *cpu.lock().unwrap() = 80.0;
    monitor.resume();
    let low = next(&rx);
    assert_eq!(low.cpu_percent, 80.0);
    assert!(low.alerts_fired.is_empty());

    monitor.pause();
    rx.drain().for_each(drop);
    *cpu.lock().unwrap() = 95.0;
    monitor.resume();
    assert_eq!(next(&rx).alerts_fired.into_iter().collect::<Vec<_>>(), vec![Metric::Cpu]);
    assert!(next(&rx).alerts_fired.is_empty());

    let sampler = monitor.stop().unwrap();
    assert!(sampler.is_firing(Metric::Cpu));
}

#[test]
fn disk_path_switch_applies_to_later_ticks() {
    let source = steady(10.0);
    let paths = Arc::clone(&source.disk_paths);
    let monitor = monitor(source);
    let (tx, rx) = flume::unbounded();
    monitor.on_sample(ChannelSink(tx)).unwrap();

    next(&rx);
    monitor.pause();
    monitor.set_disk_path("/srv");
    assert_eq!(monitor.disk_path(), PathBuf::from("/srv"));
    monitor.resume();
    next(&rx);
    monitor.stop();

    let paths = paths.lock().unwrap();
    assert_eq!(paths.first(), Some(&PathBuf::from("/")));
    assert_eq!(paths.last(), Some(&PathBuf::from("/srv")));
}

#[test]
fn second_consumer_is_ignored() {
    let monitor = monitor(steady(10.0));
    let (tx1, rx1) = flume::unbounded();
    let (tx2, rx2) = flume::unbounded();
    monitor.on_sample(ChannelSink(tx1)).unwrap();
    monitor.on_sample(ChannelSink(tx2)).unwrap();

    next(&rx1);
    monitor.stop();
    assert!(rx2.is_empty());
}

#[test]
fn process_queries_work_without_scheduler() {
    let monitor = monitor(steady(10.0));
    let apps = monitor.query_applications(Some("FIRE"));
    assert_eq!(apps.len(), 1);
    assert_eq!(apps[0].window_title, "Process 42");
    assert_eq!(monitor.query_processes(None)[0].pid, 42);
    assert_eq!(monitor.last_scan_stats().vanished, 2);

    assert_eq!(monitor.terminate(42), Err(TerminationError::AccessDenied(42)));
    assert_eq!(monitor.terminate(1), Err(TerminationError::NotFound(1)));
}

#[test]
fn queries_run_while_sampling_from_another_thread() {
    let monitor = Arc::new(monitor(steady(10.0)));
    let (tx, rx) = flume::unbounded();
    monitor.on_sample(ChannelSink(tx)).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let monitor = Arc::clone(&monitor);
            std::thread::spawn(move || monitor.query_processes(Some("")).len())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 1);
    }

    next(&rx);
    assert!(monitor.stop().is_some());
}

#[test]
fn pause_from_sink_while_another_thread_pauses() {
    let monitor = Arc::new(monitor(steady(10.0)));
    let slot: Arc<Mutex<Option<std::sync::Weak<Monitor>>>> = Arc::new(Mutex::new(None));
    let (entered_tx, entered_rx) = flume::bounded(1);

    let sink_slot = Arc::clone(&slot);
    monitor
        .on_sample(move |_: SampleResult| {
            let _ = entered_tx.try_send(());
            std::thread::sleep(Duration::from_millis(200));
            let weak = sink_slot.lock().unwrap().clone();
            if let Some(m) = weak.and_then(|w| w.upgrade()) {
                m.pause();
            }
        })
        .unwrap();
    *slot.lock().unwrap() = Some(Arc::downgrade(&monitor));

    entered_rx.recv_timeout(Duration::from_secs(5)).expect("sink entered");
    let (done_tx, done_rx) = flume::bounded(1);
    let outside = Arc::clone(&monitor);
    std::thread::spawn(move || {
        outside.pause();
        let _ = done_tx.send(());
    });

    done_rx
        .recv_timeout(Duration::from_secs(3))
        .expect("outside pause returned");
    monitor.resume();
    assert!(monitor.stop().is_some());
}

#[test]
fn available_disks_are_absolute_mount_points() {
    let monitor = monitor(steady(10.0));
    assert!(monitor.available_disks().iter().all(|p| p.is_absolute()));
}
