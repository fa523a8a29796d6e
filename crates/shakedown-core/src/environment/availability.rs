//! ToolAvailabilityChecker — per-tool availability built on the cached
//! environment verdict.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use super::probe::EnvironmentProbe;
use super::venv_manager::EnvironmentVerdict;

#[cfg(windows)]
const VENV_BIN_DIR: &str = "Scripts";
#[cfg(not(windows))]
const VENV_BIN_DIR: &str = "bin";

/// Whether one tool can be run, and from where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolAvailability {
    pub resolvable: bool,
    pub path: Option<PathBuf>,
    pub uses_venv: bool,
}

impl ToolAvailability {
    pub fn unavailable() -> Self {
        Self {
            resolvable: false,
            path: None,
            uses_venv: false,
        }
    }
}

/// Tool name → availability, built once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ToolAvailabilityTable {
    tools: BTreeMap<String, ToolAvailability>,
}

impl ToolAvailabilityTable {
    pub fn get(&self, tool: &str) -> Option<&ToolAvailability> {
        self.tools.get(tool)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ToolAvailability)> {
        self.tools.iter().map(|(name, a)| (name.as_str(), a))
    }

    /// Names of tools that could not be resolved.
    pub fn unavailable(&self) -> Vec<&str> {
        self.tools
            .iter()
            .filter(|(_, a)| !a.resolvable)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Resolves tools, preferring the isolated environment when one is active.
///
/// Contract: environment membership comes from the [`EnvironmentVerdict`]
/// only, read once per `check_tool` call. This type never reads markers or
/// environment variables that signal an isolated environment.
pub struct ToolAvailabilityChecker<'a> {
    verdict: &'a dyn EnvironmentVerdict,
    probe: EnvironmentProbe,
}

impl<'a> ToolAvailabilityChecker<'a> {
    pub fn new(verdict: &'a dyn EnvironmentVerdict, probe: EnvironmentProbe) -> Self {
        Self { verdict, probe }
    }

    /// Availability of one tool. An unresolvable tool is a normal outcome.
    pub fn check_tool(&self, name: &str) -> ToolAvailability {
        let environment = self.verdict.environment();
        let venv_root = environment
            .in_virtual_env()
            .then(|| environment.root_path())
            .flatten();

        if let Some(root) = venv_root {
            let venv_bin = [root.join(VENV_BIN_DIR)];
            if let Some(hit) = self.probe.locate_in(name, &venv_bin) {
                return ToolAvailability {
                    resolvable: true,
                    path: Some(hit.path),
                    uses_venv: true,
                };
            }
        }

        match self.probe.locate(name) {
            Some(hit) => {
                let uses_venv = venv_root.is_some_and(|root| hit.path.starts_with(root));
                ToolAvailability {
                    resolvable: true,
                    path: Some(hit.path),
                    uses_venv,
                }
            }
            None => {
                tracing::debug!(tool = name, "tool not resolvable");
                ToolAvailability::unavailable()
            }
        }
    }

    pub fn build_table<I, S>(&self, names: I) -> ToolAvailabilityTable
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tools = names
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                (name.to_string(), self.check_tool(name))
            })
            .collect();
        ToolAvailabilityTable { tools }
    }
}
