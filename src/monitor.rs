use crate::backend::catalog::ProcessCatalog;
use crate::backend::classifier::HeuristicClassifier;
use crate::backend::desktop_resolver::DesktopResolver;
use crate::backend::process::{ProcTable, ScanStats};
use crate::backend::sampler::{MetricSampler, SamplerSettings};
use crate::backend::scheduler::{SampleSink, Scheduler, SchedulerControl};
use crate::backend::source::{mount_points, ProcSource};
use crate::backend::window_resolver::WindowResolver;
use crate::config::Config;
use crate::error::{ConfigError, TerminationError};
use crate::model::{AlertThresholds, ProcessInfo};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// The surface a UI talks to: periodic samples, settings, and on-demand
/// process queries.
pub struct Monitor {
    settings: Arc<Mutex<SamplerSettings>>,
    // Parked here until a consumer registers.
    sampler: Mutex<Option<MetricSampler>>,
    scheduler: Mutex<Option<Scheduler>>,
    catalog: Mutex<ProcessCatalog>,
    period: Duration,
}

impl Monitor {
    /// Monitor reading the local machine, set up from `config`.
    pub fn new(config: &Config) -> Self {
        let mut classifier = HeuristicClassifier::new(memory_floor_bytes(config.app_memory_floor_mb))
            .with_names(&config.extra_app_names);
        if config.scan_desktop_entries {
            classifier = classifier.with_names(DesktopResolver::new().executables());
        }

        let catalog = ProcessCatalog::new(Box::new(ProcTable::new()))
            .with_classifier(Box::new(classifier))
            .with_titles(Box::new(WindowResolver::new()))
            .with_process_limit(config.process_limit);

        let sampler = MetricSampler::new(Box::new(ProcSource::new()), config.history_len);
        Self::from_parts(sampler, catalog, config.sampler_settings(), config.refresh_interval())
    }

    pub fn from_parts(
        sampler: MetricSampler,
        catalog: ProcessCatalog,
        settings: SamplerSettings,
        period: Duration,
    ) -> Self {
        Self {
            settings: Arc::new(Mutex::new(settings)),
            sampler: Mutex::new(Some(sampler)),
            scheduler: Mutex::new(None),
            catalog: Mutex::new(catalog),
            period,
        }
    }

    /// Registers the sample consumer and starts ticking. Only the first
    /// call has an effect.
    pub fn on_sample(&self, sink: impl SampleSink) -> std::io::Result<()> {
        let Some(sampler) = lock(&self.sampler).take() else {
            log::warn!("Sample consumer already registered, ignoring");
            return Ok(());
        };
        let scheduler = Scheduler::start(sampler, Arc::clone(&self.settings), self.period, sink)?;
        *lock(&self.scheduler) = Some(scheduler);
        Ok(())
    }

    /// Safe to call from the sample consumer, including while another
    /// thread is pausing.
    pub fn pause(&self) {
        if let Some(control) = self.control() {
            control.pause();
        }
    }

    pub fn resume(&self) {
        if let Some(control) = self.control() {
            control.resume();
        }
    }

    /// Stops the tick loop for good and returns the sampler's final state.
    pub fn stop(&self) -> Option<MetricSampler> {
        let scheduler = lock(&self.scheduler).take()?;
        scheduler.stop()
    }

    // The pause ack is awaited without holding the scheduler lock.
    fn control(&self) -> Option<SchedulerControl> {
        lock(&self.scheduler).as_ref().map(Scheduler::control)
    }

    /// Takes effect from the next tick. Invalid values leave the current
    /// thresholds untouched.
    pub fn set_thresholds(&self, cpu: f64, memory: f64, disk: f64) -> Result<(), ConfigError> {
        let thresholds = AlertThresholds::new(cpu, memory, disk)?;
        lock(&self.settings).thresholds = thresholds;
        log::info!("Alert thresholds set to cpu {} memory {} disk {}", cpu, memory, disk);
        Ok(())
    }

    pub fn thresholds(&self) -> AlertThresholds {
        lock(&self.settings).thresholds
    }

    /// Takes effect from the next tick.
    pub fn set_disk_path(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        log::info!("Disk usage now sampled from {}", path.display());
        lock(&self.settings).disk_path = path;
    }

    pub fn disk_path(&self) -> PathBuf {
        lock(&self.settings).disk_path.clone()
    }

    pub fn query_applications(&self, filter: Option<&str>) -> Vec<ProcessInfo> {
        lock(&self.catalog).list_applications(filter)
    }

    pub fn query_processes(&self, filter: Option<&str>) -> Vec<ProcessInfo> {
        lock(&self.catalog).list_processes(filter)
    }

    pub fn terminate(&self, pid: i32) -> Result<(), TerminationError> {
        log::info!("Termination requested for PID {}", pid);
        lock(&self.catalog).terminate(pid)
    }

    pub fn last_scan_stats(&self) -> ScanStats {
        lock(&self.catalog).last_stats()
    }

    /// Mount points the disk metric can be pointed at.
    pub fn available_disks(&self) -> Vec<PathBuf> {
        mount_points()
    }
}

fn memory_floor_bytes(megabytes: u64) -> u64 {
    megabytes.saturating_mul(1024 * 1024)
}

// A panic elsewhere must not take the monitor down with it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
