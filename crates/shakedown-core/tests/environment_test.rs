//! Tests for isolated-environment detection and tool availability.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use shakedown_core::environment::*;

/// In-memory marker source that counts every read.
#[derive(Default)]
struct FakeMarkers {
    vars: HashMap<String, String>,
    files: HashMap<PathBuf, std::io::ErrorKind>,
    present_files: Vec<PathBuf>,
    reads: Arc<AtomicUsize>,
}

impl MarkerSource for FakeMarkers {
    fn env_var(&self, name: &str) -> Option<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.vars.get(name).cloned()
    }

    fn read_marker(&self, path: &Path) -> std::io::Result<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.present_files.iter().any(|p| p == path) {
            return Ok(());
        }
        let kind = self
            .files
            .get(path)
            .copied()
            .unwrap_or(std::io::ErrorKind::NotFound);
        Err(std::io::Error::from(kind))
    }
}

/// Verdict wrapper counting how often the cached state is consulted.
struct CountingVerdict<'a> {
    inner: &'a VenvManager,
    calls: AtomicUsize,
}

impl EnvironmentVerdict for CountingVerdict<'_> {
    fn environment(&self) -> &EnvironmentState {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.environment()
    }
}

fn markers() -> Vec<EnvironmentMarker> {
    vec![
        EnvironmentMarker::EnvVar("VIRTUAL_ENV".into()),
        EnvironmentMarker::EnvVar("CONDA_PREFIX".into()),
        EnvironmentMarker::File(PathBuf::from("/project/.venv/pyvenv.cfg")),
    ]
}

#[test]
fn test_absent_markers_yield_false() {
    let manager = VenvManager::new(markers(), Box::new(FakeMarkers::default()));
    assert!(!manager.is_in_virtual_environment());
    assert!(manager.state().root_path().is_none());
    assert!(manager.state().source().is_none());
    assert_eq!(manager.state().detected_by(), DetectedBy::VenvManager);
}

#[test]
fn test_first_positive_marker_wins() {
    let mut fake = FakeMarkers::default();
    fake.vars.insert("CONDA_PREFIX".into(), "/opt/conda".into());
    fake.present_files.push(PathBuf::from("/project/.venv/pyvenv.cfg"));
    let manager = VenvManager::new(markers(), Box::new(fake));

    assert!(manager.is_in_virtual_environment());
    assert_eq!(manager.state().root_path(), Some(Path::new("/opt/conda")));
    assert_eq!(
        manager.state().source(),
        Some(&EnvironmentMarker::EnvVar("CONDA_PREFIX".into()))
    );
}

#[test]
fn test_empty_env_marker_is_negative() {
    let mut fake = FakeMarkers::default();
    fake.vars.insert("VIRTUAL_ENV".into(), "   ".into());
    let manager = VenvManager::new(markers(), Box::new(fake));
    assert!(!manager.is_in_virtual_environment());
}

#[test]
fn test_marker_file_root_is_parent_dir() {
    let mut fake = FakeMarkers::default();
    fake.present_files.push(PathBuf::from("/project/.venv/pyvenv.cfg"));
    let manager = VenvManager::new(markers(), Box::new(fake));

    assert!(manager.is_in_virtual_environment());
    assert_eq!(manager.state().root_path(), Some(Path::new("/project/.venv")));
}

#[test]
fn test_unreadable_marker_is_inconclusive_not_fatal() {
    let mut fake = FakeMarkers::default();
    fake.files.insert(
        PathBuf::from("/project/.venv/pyvenv.cfg"),
        std::io::ErrorKind::PermissionDenied,
    );
    let manager = VenvManager::new(markers(), Box::new(fake));

    assert!(!manager.is_in_virtual_environment());
    assert_eq!(manager.state().warnings().len(), 1);
    assert!(manager.state().warnings()[0].contains("pyvenv.cfg"));
}

#[test]
fn test_repeated_calls_compute_once() {
    let reads = Arc::new(AtomicUsize::new(0));
    let mut fake = FakeMarkers {
        reads: Arc::clone(&reads),
        ..Default::default()
    };
    fake.vars.insert("VIRTUAL_ENV".into(), "/home/dev/.venv".into());
    let manager = VenvManager::new(markers(), Box::new(fake));

    let first = manager.state().clone();
    for _ in 0..100 {
        assert!(manager.is_in_virtual_environment());
        assert_eq!(manager.state(), &first);
        assert_eq!(manager.state().source(), first.source());
    }
    assert_eq!(reads.load(Ordering::SeqCst), 1, "markers read exactly once");
}

#[test]
fn test_checker_reads_verdict_once_and_never_probes_markers() {
    let reads = Arc::new(AtomicUsize::new(0));
    let fake = FakeMarkers {
        reads: Arc::clone(&reads),
        ..Default::default()
    };
    let manager = VenvManager::new(markers(), Box::new(fake));
    manager.state();
    let reads_after_detection = reads.load(Ordering::SeqCst);

    let verdict = CountingVerdict {
        inner: &manager,
        calls: AtomicUsize::new(0),
    };
    let checker = ToolAvailabilityChecker::new(&verdict, EnvironmentProbe::with_search_path(vec![]));

    for (i, tool) in ["ruff", "shellcheck", "eslint"].iter().enumerate() {
        let availability = checker.check_tool(tool);
        assert!(!availability.resolvable);
        assert_eq!(verdict.calls.load(Ordering::SeqCst), i + 1);
    }
    assert_eq!(reads.load(Ordering::SeqCst), reads_after_detection);
}

#[test]
fn test_unresolvable_tool_is_not_an_error() {
    let manager = VenvManager::new(vec![], Box::new(FakeMarkers::default()));
    let checker = ToolAvailabilityChecker::new(&manager, EnvironmentProbe::with_search_path(vec![]));
    let table = checker.build_table(["definitely-not-a-tool"]);
    assert_eq!(table.len(), 1);
    assert_eq!(table.unavailable(), vec!["definitely-not-a-tool"]);
    assert_eq!(
        table.get("definitely-not-a-tool"),
        Some(&ToolAvailability::unavailable())
    );
}

#[test]
fn test_marker_spec_parsing() {
    let root = Path::new("/repo");
    assert_eq!(
        EnvironmentMarker::parse("env:VIRTUAL_ENV", root),
        Some(EnvironmentMarker::EnvVar("VIRTUAL_ENV".into()))
    );
    assert_eq!(
        EnvironmentMarker::parse("file:.venv/pyvenv.cfg", root),
        Some(EnvironmentMarker::File(PathBuf::from("/repo/.venv/pyvenv.cfg")))
    );
    assert_eq!(EnvironmentMarker::parse("env:", root), None);
    assert_eq!(EnvironmentMarker::parse("registry:foo", root), None);
}

/// The cached state serializes with its source marker for reports.
#[test]
fn test_state_serializes_source_marker() {
    let mut fake = FakeMarkers::default();
    fake.vars.insert("VIRTUAL_ENV".into(), "/srv/venv".into());
    let manager = VenvManager::new(markers(), Box::new(fake));

    let value = serde_json::to_value(manager.state()).unwrap();
    assert_eq!(value["in_virtual_env"], true);
    assert_eq!(value["root_path"], "/srv/venv");
    assert_eq!(value["detected_by"], "venv_manager");
    assert_eq!(value["source"]["kind"], "env_var");
    assert_eq!(value["source"]["value"], "VIRTUAL_ENV");
    assert!(value["warnings"].as_array().unwrap().is_empty());
}

#[cfg(unix)]
mod unix {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn install_tool(dir: &Path, name: &str) -> PathBuf {
        std::fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_venv_binary_preferred_over_system_path() {
        let tmp = tempfile::TempDir::new().unwrap();
        let venv_root = tmp.path().join("venv");
        let system_bin = tmp.path().join("usr/bin");
        let venv_tool = install_tool(&venv_root.join("bin"), "ruff");
        install_tool(&system_bin, "ruff");

        let mut fake = FakeMarkers::default();
        fake.vars
            .insert("VIRTUAL_ENV".into(), venv_root.display().to_string());
        let manager = VenvManager::new(markers(), Box::new(fake));
        let checker =
            ToolAvailabilityChecker::new(&manager, EnvironmentProbe::with_search_path(vec![system_bin]));

        let availability = checker.check_tool("ruff");
        assert!(availability.resolvable);
        assert!(availability.uses_venv);
        assert_eq!(availability.path, Some(venv_tool));
    }

    #[test]
    fn test_system_binary_used_outside_venv() {
        let tmp = tempfile::TempDir::new().unwrap();
        let system_bin = tmp.path().join("usr/bin");
        let system_tool = install_tool(&system_bin, "shellcheck");

        let manager = VenvManager::new(markers(), Box::new(FakeMarkers::default()));
        let checker =
            ToolAvailabilityChecker::new(&manager, EnvironmentProbe::with_search_path(vec![system_bin]));

        let availability = checker.check_tool("shellcheck");
        assert!(availability.resolvable);
        assert!(!availability.uses_venv);
        assert_eq!(availability.path, Some(system_tool));
    }

    #[test]
    fn test_non_executable_file_is_not_resolvable() {
        let tmp = tempfile::TempDir::new().unwrap();
        let bin = tmp.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let path = bin.join("stylelint");
        std::fs::write(&path, "not executable").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let probe = EnvironmentProbe::with_search_path(vec![bin]);
        assert!(probe.locate("stylelint").is_none());
    }

    #[test]
    fn test_probe_reports_installation_root() {
        let tmp = tempfile::TempDir::new().unwrap();
        let bin = tmp.path().join("toolchain/bin");
        install_tool(&bin, "yamllint");

        let probe = EnvironmentProbe::with_search_path(vec![bin]);
        let hit = probe.locate("yamllint").unwrap();
        assert_eq!(hit.installation_root, Some(tmp.path().join("toolchain")));
    }
}
