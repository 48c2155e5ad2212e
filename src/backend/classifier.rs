//! Deciding which processes count as "applications".
//!
//! There is no portable way to ask which processes own a user-facing window,
//! so classification is a best-effort heuristic behind [`AppClassifier`].
//! Swap in another implementation for platform specific rules.

use crate::backend::process::ProcessSample;
use once_cell::sync::Lazy;
use std::collections::HashSet;

pub const DEFAULT_MEMORY_FLOOR_BYTES: u64 = 50 * 1024 * 1024;

static COMMON_APPS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // browsers
        "chrome", "chromium", "google-chrome", "firefox", "firefox-esr", "msedge", "opera",
        "brave", "vivaldi",
        // editors and IDEs
        "code", "codium", "pycharm", "idea", "clion", "devenv", "androidstudio", "studio",
        "sublime_text", "gedit", "kate", "notepad", "notepad++",
        // office
        "word", "winword", "excel", "powerpnt", "outlook", "libreoffice", "soffice.bin",
        "thunderbird",
        // chat and media
        "teams", "discord", "slack", "telegram", "telegram-desktop", "whatsapp", "spotify",
        "vlc", "figma", "obs", "gimp", "inkscape",
    ]
    .into_iter()
    .collect()
});

/// Pluggable "is this an application" rule.
pub trait AppClassifier: Send {
    fn is_application(&self, process: &ProcessSample, window_title: Option<&str>) -> bool;
}

impl<F> AppClassifier for F
where
    F: Fn(&ProcessSample, Option<&str>) -> bool + Send,
{
    fn is_application(&self, process: &ProcessSample, window_title: Option<&str>) -> bool {
        self(process, window_title)
    }
}

/// An application is a process with a known interactive name, a window, or a
/// resident set above `memory_floor`.
///
/// The memory floor is a weak proxy for "has windows" and will misclassify
/// large daemons and small GUI tools alike.
pub struct HeuristicClassifier {
    extra_names: HashSet<String>,
    memory_floor: u64,
}

impl HeuristicClassifier {
    pub fn new(memory_floor: u64) -> Self {
        Self {
            extra_names: HashSet::new(),
            memory_floor,
        }
    }

    /// Adds executable names to the allow-list.
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extra_names
            .extend(names.into_iter().map(|n| normalize(n.as_ref())));
        self
    }

    pub fn is_known_name(&self, name: &str) -> bool {
        let name = normalize(name);
        COMMON_APPS.contains(name.as_str()) || self.extra_names.contains(&name)
    }
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_FLOOR_BYTES)
    }
}

impl AppClassifier for HeuristicClassifier {
    fn is_application(&self, process: &ProcessSample, window_title: Option<&str>) -> bool {
        self.is_known_name(&process.name)
            || window_title.is_some_and(|t| !t.is_empty())
            || process.memory_bytes > self.memory_floor
    }
}

/// Lowercases and drops a Windows style `.exe` suffix.
fn normalize(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    match lower.strip_suffix(".exe") {
        Some(stem) => stem.to_string(),
        None => lower,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str, mb: u64) -> ProcessSample {
        ProcessSample {
            name: name.to_string(),
            memory_bytes: mb * 1024 * 1024,
            ..Default::default()
        }
    }

    #[test]
    fn allow_list_ignores_case_and_exe() {
        let c = HeuristicClassifier::default();
        assert!(c.is_application(&sample("Firefox", 1), None));
        assert!(c.is_application(&sample("chrome.exe", 1), None));
        assert!(!c.is_application(&sample("kworker/0:1", 1), None));
    }

    #[test]
    fn memory_floor_is_strict() {
        let c = HeuristicClassifier::default();
        assert!(!c.is_application(&sample("daemon", 50), None));
        assert!(c.is_application(&sample("daemon", 51), None));
    }

    #[test]
    fn window_title_marks_application() {
        let c = HeuristicClassifier::default();
        assert!(c.is_application(&sample("xterm", 1), Some("Terminal")));
        assert!(!c.is_application(&sample("xterm", 1), Some("")));
    }

    #[test]
    fn extra_names_extend_allow_list() {
        let c = HeuristicClassifier::new(u64::MAX).with_names(["Krita"]);
        assert!(c.is_application(&sample("krita", 1), None));
    }

    #[test]
    fn closures_are_classifiers() {
        let only_init = |p: &ProcessSample, _: Option<&str>| p.pid == 1;
        let init = ProcessSample {
            pid: 1,
            ..Default::default()
        };
        assert!(only_init.is_application(&init, None));
    }
}
