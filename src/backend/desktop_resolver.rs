use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Executables that ship a `.desktop` launcher, i.e. things users start from
/// a menu. Feeds the application allow-list.
pub struct DesktopResolver {
    /// lowercase executable basenames
    executables: HashSet<String>,
}

impl DesktopResolver {
    pub fn new() -> Self {
        let mut resolver = Self {
            executables: HashSet::new(),
        };
        for dir in desktop_entry_dirs() {
            resolver.scan_dir(&dir);
        }
        log::info!("Desktop resolver loaded {} entries", resolver.executables.len());
        resolver
    }

    pub fn scan_dir(&mut self, dir: &Path) {
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "desktop") {
                if let Ok(content) = fs::read_to_string(&path) {
                    self.add_entry(&content);
                }
            }
        }
    }

    fn add_entry(&mut self, content: &str) {
        if let Some((exe, name)) = parse_desktop_entry(content) {
            log::debug!("Desktop entry {} for {}", name, exe);
            self.executables.insert(exe);
        }
    }

    pub fn executables(&self) -> impl Iterator<Item = &str> {
        self.executables.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.executables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executables.is_empty()
    }
}

impl Default for DesktopResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// (executable basename, Name) from the `[Desktop Entry]` group.
fn parse_desktop_entry(content: &str) -> Option<(String, String)> {
    let mut name = None;
    let mut exec = None;
    let mut in_desktop_entry = false;

    for line in content.lines() {
        let line = line.trim();
        if line == "[Desktop Entry]" {
            in_desktop_entry = true;
            continue;
        }
        if line.starts_with('[') {
            in_desktop_entry = false;
            continue;
        }
        if !in_desktop_entry {
            continue;
        }
        if let Some(val) = line.strip_prefix("Name=") {
            name.get_or_insert_with(|| val.to_string());
        } else if let Some(val) = line.strip_prefix("Exec=") {
            exec = Some(val.to_string());
        }
    }

    let (name, exec) = (name?, exec?);
    let mut args = exec.split_whitespace();
    let mut cmd = args.next()?;
    // `env VAR=x app --flag` launches `app`.
    if cmd == "env" || cmd.ends_with("/env") {
        cmd = args.find(|a| !a.contains('='))?;
    }
    let basename = cmd.rsplit('/').next().unwrap_or(cmd).trim_matches('"');
    if basename.is_empty() || name.is_empty() {
        return None;
    }
    Some((basename.to_lowercase(), name))
}

fn desktop_entry_dirs() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("/usr/share/applications"),
        PathBuf::from("/usr/local/share/applications"),
    ];

    if let Some(data) = dirs::data_dir() {
        paths.push(data.join("applications"));
    }

    if let Ok(xdg) = std::env::var("XDG_DATA_DIRS") {
        paths.extend(
            xdg.split(':')
                .filter(|d| !d.is_empty())
                .map(|d| Path::new(d).join("applications")),
        );
    }

    // Flatpak and Snap locations
    paths.push(PathBuf::from("/var/lib/flatpak/exports/share/applications"));
    paths.push(PathBuf::from("/var/lib/snapd/desktop/applications"));
    paths.dedup();
    paths
}
