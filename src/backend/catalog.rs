use crate::backend::classifier::{AppClassifier, HeuristicClassifier};
use crate::backend::process::{ProcessSample, ProcessTable, ScanStats};
use crate::backend::window_resolver::{NoTitles, TitleSource};
use crate::error::TerminationError;
use crate::model::{placeholder_title, ProcessInfo};
use std::cmp::Ordering;

pub const DEFAULT_PROCESS_LIMIT: usize = 100;

/// On-demand view of the OS process table.
///
/// Every query rebuilds its result from a fresh scan; nothing is cached
/// between queries except the CPU time baselines inside the table.
pub struct ProcessCatalog {
    table: Box<dyn ProcessTable>,
    classifier: Box<dyn AppClassifier>,
    titles: Box<dyn TitleSource>,
    process_limit: usize,
    last_stats: ScanStats,
}

impl ProcessCatalog {
    pub fn new(table: Box<dyn ProcessTable>) -> Self {
        Self {
            table,
            classifier: Box::new(HeuristicClassifier::default()),
            titles: Box::new(NoTitles),
            process_limit: DEFAULT_PROCESS_LIMIT,
            last_stats: ScanStats::default(),
        }
    }

    pub fn with_classifier(mut self, classifier: Box<dyn AppClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_titles(mut self, titles: Box<dyn TitleSource>) -> Self {
        self.titles = titles;
        self
    }

    pub fn with_process_limit(mut self, limit: usize) -> Self {
        self.process_limit = limit;
        self
    }

    /// Applications, largest resident memory first. `filter` matches name or
    /// window title, ignoring case.
    pub fn list_applications(&mut self, filter: Option<&str>) -> Vec<ProcessInfo> {
        let needle = needle(filter);
        let mut apps: Vec<ProcessInfo> = self
            .snapshot()
            .into_iter()
            .filter(|p| p.is_application)
            .filter(|p| {
                needle
                    .as_deref()
                    .map_or(true, |n| contains(&p.name, n) || contains(&p.window_title, n))
            })
            .collect();
        apps.sort_by(|a, b| b.memory_bytes.cmp(&a.memory_bytes).then(a.pid.cmp(&b.pid)));
        apps
    }

    /// All processes, busiest first, at most `process_limit` after filtering
    /// by name.
    pub fn list_processes(&mut self, filter: Option<&str>) -> Vec<ProcessInfo> {
        let needle = needle(filter);
        let mut procs: Vec<ProcessInfo> = self
            .snapshot()
            .into_iter()
            .filter(|p| needle.as_deref().map_or(true, |n| contains(&p.name, n)))
            .collect();
        procs.sort_by(|a, b| {
            b.cpu_percent
                .partial_cmp(&a.cpu_percent)
                .unwrap_or(Ordering::Equal)
                .then(a.pid.cmp(&b.pid))
        });
        procs.truncate(self.process_limit);
        procs
    }

    pub fn terminate(&self, pid: i32) -> Result<(), TerminationError> {
        self.table.terminate(pid)
    }

    /// Skip counts from the most recent query.
    pub fn last_stats(&self) -> ScanStats {
        self.last_stats
    }

    fn snapshot(&mut self) -> Vec<ProcessInfo> {
        let scan = self.table.scan();
        self.last_stats = scan.stats;
        let titles = self.titles.titles();
        scan.processes
            .into_iter()
            .map(|sample| {
                let title = titles.get(&sample.pid).map(String::as_str);
                let is_application = self.classifier.is_application(&sample, title);
                let window_title = title
                    .map(str::to_string)
                    .unwrap_or_else(|| placeholder_title(sample.pid));
                into_info(sample, is_application, window_title)
            })
            .collect()
    }
}

fn into_info(sample: ProcessSample, is_application: bool, window_title: String) -> ProcessInfo {
    ProcessInfo {
        pid: sample.pid,
        name: sample.name,
        status: sample.status,
        cpu_percent: sample.cpu_percent,
        memory_percent: sample.memory_percent,
        memory_bytes: sample.memory_bytes,
        is_application,
        window_title,
        start_time: sample.start_time,
    }
}

/// Lowercased filter, or None when there is nothing to filter by.
fn needle(filter: Option<&str>) -> Option<String> {
    filter.filter(|f| !f.is_empty()).map(str::to_lowercase)
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
