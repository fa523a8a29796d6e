//! EnvironmentProbe — locate a tool binary on a search path.

use std::path::{Path, PathBuf};

use serde::Serialize;

#[cfg(windows)]
const EXECUTABLE_SUFFIXES: &[&str] = &["", ".exe", ".cmd", ".bat"];
#[cfg(not(windows))]
const EXECUTABLE_SUFFIXES: &[&str] = &[""];

/// A resolved tool binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeHit {
    pub path: PathBuf,
    /// Installation root: the directory above the one holding the binary.
    pub installation_root: Option<PathBuf>,
}

/// Resolves tool names against an ordered list of directories.
///
/// Knows nothing about isolated environments; callers decide which
/// directories to search first.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentProbe {
    search_path: Vec<PathBuf>,
}

impl EnvironmentProbe {
    /// Probe over the process `PATH`.
    pub fn from_env() -> Self {
        let search_path = std::env::var_os("PATH")
            .map(|paths| std::env::split_paths(&paths).collect())
            .unwrap_or_default();
        Self { search_path }
    }

    pub fn with_search_path(search_path: Vec<PathBuf>) -> Self {
        Self { search_path }
    }

    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    /// Locate `tool` on this probe's search path.
    pub fn locate(&self, tool: &str) -> Option<ProbeHit> {
        self.locate_in(tool, &self.search_path)
    }

    /// Locate `tool` in `dirs`, first hit wins.
    ///
    /// A tool given as a path (containing a separator) is checked as-is.
    pub fn locate_in(&self, tool: &str, dirs: &[PathBuf]) -> Option<ProbeHit> {
        if tool.is_empty() {
            return None;
        }
        let as_path = Path::new(tool);
        if as_path.components().count() > 1 {
            return is_executable(as_path).then(|| hit(as_path.to_path_buf()));
        }

        dirs.iter().find_map(|dir| {
            EXECUTABLE_SUFFIXES.iter().find_map(|suffix| {
                let candidate = dir.join(format!("{tool}{suffix}"));
                is_executable(&candidate).then(|| hit(candidate))
            })
        })
    }
}

fn hit(path: PathBuf) -> ProbeHit {
    let installation_root = path
        .parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf);
    ProbeHit {
        path,
        installation_root,
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
