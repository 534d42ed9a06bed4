//! In-memory fake for the package manager (testing only)
//!
//! Provides `MemorySnapManager`, which satisfies the [`SnapManager`] contract
//! without touching snapd.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::error::SnapctlError;
use crate::revision::Revision;
use crate::snapctl::{InstalledSnap, SnapHandle, SnapManager, SnapctlResult};

/// A package-manager call observed by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapCall {
    Lookup {
        name: String,
    },
    Ensure {
        name: String,
        revision: String,
        classic: bool,
    },
    Hold {
        name: String,
    },
}

#[derive(Debug, Default)]
struct FakeState {
    store: HashSet<String>,
    installed: HashMap<String, InstalledSnap>,
    calls: Vec<SnapCall>,
    fail_ensure: Option<String>,
    fail_hold: Option<String>,
}

/// In-memory snapd backed by a store catalogue and an installed map.
#[derive(Debug, Default)]
pub struct MemorySnapManager {
    state: Mutex<FakeState>,
}

impl MemorySnapManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fake whose store publishes the given snap names.
    pub fn with_store<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fake = Self::new();
        fake.state
            .lock()
            .unwrap()
            .store
            .extend(names.into_iter().map(Into::into));
        fake
    }

    /// Pretend `name` is already installed.
    pub fn preinstall(&self, name: &str, snap: InstalledSnap) {
        let mut state = self.state.lock().unwrap();
        state.store.insert(name.to_string());
        state.installed.insert(name.to_string(), snap);
    }

    /// Make the next `ensure_present` fail with `CommandFailed(stderr)`.
    pub fn fail_next_ensure(&self, stderr: &str) {
        self.state.lock().unwrap().fail_ensure = Some(stderr.to_string());
    }

    /// Make the next `hold` fail with `CommandFailed(stderr)`.
    pub fn fail_next_hold(&self, stderr: &str) {
        self.state.lock().unwrap().fail_hold = Some(stderr.to_string());
    }

    pub fn installed(&self, name: &str) -> Option<InstalledSnap> {
        self.state.lock().unwrap().installed.get(name).cloned()
    }

    pub fn calls(&self) -> Vec<SnapCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Ensure calls recorded so far
    pub fn ensure_calls(&self) -> Vec<SnapCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, SnapCall::Ensure { .. }))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }
}

impl SnapManager for MemorySnapManager {
    fn lookup(&self, name: &str) -> SnapctlResult<SnapHandle> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(SnapCall::Lookup {
            name: name.to_string(),
        });

        if !state.store.contains(name) {
            return Err(SnapctlError::NotFound(name.to_string()));
        }
        Ok(SnapHandle {
            name: name.to_string(),
            installed: state.installed.get(name).cloned(),
        })
    }

    fn ensure_present(
        &self,
        handle: &SnapHandle,
        revision: Revision,
        classic: bool,
    ) -> SnapctlResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(SnapCall::Ensure {
            name: handle.name.clone(),
            revision: revision.to_string(),
            classic,
        });

        if let Some(stderr) = state.fail_ensure.take() {
            return Err(SnapctlError::CommandFailed {
                command: format!("snap install {} --revision={}", handle.name, revision),
                stderr,
            });
        }

        let held = state
            .installed
            .get(&handle.name)
            .is_some_and(|s| s.held);
        state.installed.insert(
            handle.name.clone(),
            InstalledSnap {
                revision: revision.to_string(),
                classic,
                held,
            },
        );
        Ok(())
    }

    fn hold(&self, handle: &SnapHandle) -> SnapctlResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(SnapCall::Hold {
            name: handle.name.clone(),
        });

        if let Some(stderr) = state.fail_hold.take() {
            return Err(SnapctlError::CommandFailed {
                command: format!("snap refresh --hold {}", handle.name),
                stderr,
            });
        }

        match state.installed.get_mut(&handle.name) {
            Some(snap) => {
                snap.held = true;
                Ok(())
            }
            None => Err(SnapctlError::CommandFailed {
                command: format!("snap refresh --hold {}", handle.name),
                stderr: format!("error: snap \"{}\" is not installed", handle.name),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_unknown_snap_is_not_found() {
        let fake = MemorySnapManager::new();
        let err = fake.lookup("grafana-agent").unwrap_err();
        assert!(matches!(err, SnapctlError::NotFound(name) if name == "grafana-agent"));
    }

    #[test]
    fn hold_before_install_fails() {
        let fake = MemorySnapManager::with_store(["grafana-agent"]);
        let handle = fake.lookup("grafana-agent").unwrap();
        assert!(fake.hold(&handle).is_err());
    }

    #[test]
    fn refresh_keeps_existing_hold() {
        let fake = MemorySnapManager::new();
        fake.preinstall(
            "grafana-agent",
            InstalledSnap {
                revision: "10".to_string(),
                classic: false,
                held: true,
            },
        );
        let handle = fake.lookup("grafana-agent").unwrap();
        fake.ensure_present(&handle, Revision(16), false).unwrap();

        let snap = fake.installed("grafana-agent").unwrap();
        assert_eq!(snap.revision, "16");
        assert!(snap.held);
    }

    #[test]
    fn injected_failure_fires_once() {
        let fake = MemorySnapManager::with_store(["grafana-agent"]);
        fake.fail_next_ensure("error: network down");
        let handle = fake.lookup("grafana-agent").unwrap();

        assert!(fake.ensure_present(&handle, Revision(16), false).is_err());
        assert!(fake.ensure_present(&handle, Revision(16), false).is_ok());
        assert_eq!(fake.ensure_calls().len(), 2);
    }
}
