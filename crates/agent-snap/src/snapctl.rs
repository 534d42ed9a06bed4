//! Package-manager collaborator
//!
//! [`SnapManager`] is the seam between the installer and snapd. [`SnapCli`]
//! drives the real `snap` command; `fakes::MemorySnapManager` stands in for
//! it in tests.

use serde::{Deserialize, Serialize};
use std::process::{Command, Output};
use tracing::debug;

use crate::error::SnapctlError;
use crate::revision::Revision;

/// Result type for package-manager operations
pub type SnapctlResult<T> = std::result::Result<T, SnapctlError>;

/// State of a snap as installed on the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledSnap {
    /// Store revision (`x1`-style for sideloaded snaps)
    pub revision: String,
    /// Installed with classic confinement
    pub classic: bool,
    /// Refreshes are held
    pub held: bool,
}

/// Reference to a named snap, with its state at lookup time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapHandle {
    pub name: String,
    /// `None` when the snap is not installed
    pub installed: Option<InstalledSnap>,
}

impl SnapHandle {
    pub fn absent(name: &str) -> Self {
        SnapHandle {
            name: name.to_string(),
            installed: None,
        }
    }

    /// True when installed at exactly `revision` with the given confinement.
    pub fn is_at(&self, revision: Revision, classic: bool) -> bool {
        self.installed
            .as_ref()
            .is_some_and(|s| s.revision == revision.to_string() && s.classic == classic)
    }
}

/// Operations the installer needs from a package manager.
///
/// Implementations block until the package manager has finished; errors are
/// passed to the caller untouched.
pub trait SnapManager {
    /// Obtain a handle for the named snap.
    fn lookup(&self, name: &str) -> SnapctlResult<SnapHandle>;

    /// Install or refresh the snap to exactly `revision` and confinement.
    fn ensure_present(
        &self,
        handle: &SnapHandle,
        revision: Revision,
        classic: bool,
    ) -> SnapctlResult<()>;

    /// Hold the snap against automatic refreshes.
    fn hold(&self, handle: &SnapHandle) -> SnapctlResult<()>;
}

/// `snap` CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapCliConfig {
    /// Program to execute for snap commands
    pub program: String,
}

impl Default for SnapCliConfig {
    fn default() -> Self {
        SnapCliConfig {
            program: std::env::var("AGENT_SNAP_PROGRAM").unwrap_or_else(|_| "snap".to_string()),
        }
    }
}

impl SnapCliConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific `snap` executable
    pub fn new(program: &str) -> Self {
        SnapCliConfig {
            program: program.to_string(),
        }
    }
}

/// [`SnapManager`] backed by the `snap` command line client
#[derive(Debug, Clone)]
pub struct SnapCli {
    config: SnapCliConfig,
}

impl SnapCli {
    pub fn new(config: SnapCliConfig) -> Self {
        SnapCli { config }
    }

    /// Create client from environment variables
    pub fn from_env() -> Self {
        Self::new(SnapCliConfig::from_env())
    }

    pub fn program(&self) -> &str {
        &self.config.program
    }

    /// `snap --version` output, first line
    pub fn version(&self) -> SnapctlResult<String> {
        let out = self.run(&["--version".to_string()])?;
        if !out.status.success() {
            return Err(self.command_failed(&["--version".to_string()], &out));
        }
        let stdout = String::from_utf8_lossy(&out.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }

    fn run(&self, args: &[String]) -> SnapctlResult<Output> {
        debug!("Running {} {}", self.config.program, args.join(" "));
        Command::new(&self.config.program)
            .args(args)
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => SnapctlError::SnapdUnavailable {
                    program: self.config.program.clone(),
                },
                _ => SnapctlError::Io(e),
            })
    }

    fn run_checked(&self, args: &[String]) -> SnapctlResult<()> {
        let out = self.run(args)?;
        if out.status.success() {
            Ok(())
        } else {
            Err(self.command_failed(args, &out))
        }
    }

    fn command_failed(&self, args: &[String], out: &Output) -> SnapctlError {
        SnapctlError::CommandFailed {
            command: format!("{} {}", self.config.program, args.join(" ")),
            stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        }
    }
}

impl SnapManager for SnapCli {
    fn lookup(&self, name: &str) -> SnapctlResult<SnapHandle> {
        let args = list_args(name);
        let out = self.run(&args)?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            if stderr.contains("no matching snaps installed") {
                debug!("{} is not installed", name);
                return Ok(SnapHandle::absent(name));
            }
            return Err(self.command_failed(&args, &out));
        }

        let installed = parse_snap_list(name, &String::from_utf8_lossy(&out.stdout))?;
        Ok(SnapHandle {
            name: name.to_string(),
            installed,
        })
    }

    fn ensure_present(
        &self,
        handle: &SnapHandle,
        revision: Revision,
        classic: bool,
    ) -> SnapctlResult<()> {
        let args = ensure_args(handle, revision, classic);
        self.run_checked(&args).map_err(|e| match e {
            SnapctlError::CommandFailed { ref stderr, .. }
                if stderr.contains("not found") && handle.installed.is_none() =>
            {
                SnapctlError::NotFound(handle.name.clone())
            }
            other => other,
        })
    }

    fn hold(&self, handle: &SnapHandle) -> SnapctlResult<()> {
        self.run_checked(&hold_args(&handle.name))
    }
}

fn list_args(name: &str) -> Vec<String> {
    vec![
        "list".to_string(),
        "--unicode=never".to_string(),
        name.to_string(),
    ]
}

/// Arguments for bringing a snap to `revision`: install when absent,
/// refresh otherwise.
fn ensure_args(handle: &SnapHandle, revision: Revision, classic: bool) -> Vec<String> {
    let verb = if handle.installed.is_some() {
        "refresh"
    } else {
        "install"
    };
    let mut args = vec![
        verb.to_string(),
        handle.name.clone(),
        format!("--revision={}", revision),
    ];
    if classic {
        args.push("--classic".to_string());
    }
    args
}

/// Indefinite hold on automatic refreshes
fn hold_args(name: &str) -> Vec<String> {
    vec!["refresh".to_string(), "--hold".to_string(), name.to_string()]
}

/// Parse `snap list` output for the row naming `name`.
///
/// Columns: Name Version Rev Tracking Publisher Notes. Notes is `-` or a
/// comma separated list such as `classic,held`.
fn parse_snap_list(name: &str, stdout: &str) -> SnapctlResult<Option<InstalledSnap>> {
    let mut lines = stdout.lines().filter(|l| !l.trim().is_empty());

    let header = lines
        .next()
        .ok_or_else(|| SnapctlError::Parse("empty output".to_string()))?;
    if !header.starts_with("Name") {
        return Err(SnapctlError::Parse(format!("missing header: {header}")));
    }

    for line in lines {
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.first() != Some(&name) {
            continue;
        }
        if cols.len() < 6 {
            return Err(SnapctlError::Parse(format!("short row: {line}")));
        }
        let notes: Vec<&str> = cols[5].split(',').collect();
        return Ok(Some(InstalledSnap {
            revision: cols[2].to_string(),
            classic: notes.contains(&"classic"),
            held: notes.contains(&"held"),
        }));
    }

    Ok(None)
}
