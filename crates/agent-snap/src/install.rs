//! Install-and-pin of the grafana-agent snap
//!
//! [`plan_install`] turns (confinement, host architecture) into an
//! [`InstallIntent`]; [`install_snap`] converges the host onto it.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::arch::{self, Arch};
use crate::revision::{resolve_revision, Confinement, Revision, GRAFANA_AGENT_SNAP};
use crate::snapctl::SnapManager;
use crate::Result;

/// What should end up installed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallIntent {
    pub name: String,
    pub revision: Revision,
    pub classic: bool,
}

impl InstallIntent {
    pub fn confinement(&self) -> Confinement {
        Confinement::from_classic(self.classic)
    }
}

/// Result of a successful install-and-pin pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallOutcome {
    pub intent: InstallIntent,
    /// Revision installed before this pass, if any
    pub previous_revision: Option<String>,
    /// Whether an install or refresh was performed
    pub changed: bool,
}

/// Resolve the grafana-agent intent for a raw architecture string.
///
/// # TDD: test_strict_x86_64_plans_revision_16
pub fn plan_install(classic: bool, raw_arch: &str) -> Result<InstallIntent> {
    let arch = Arch::normalize(raw_arch);
    let revision = resolve_revision(classic, &arch)?;
    debug!(
        "Resolved {} revision {} for arch={} ({})",
        GRAFANA_AGENT_SNAP,
        revision,
        arch,
        Confinement::from_classic(classic)
    );

    Ok(InstallIntent {
        name: GRAFANA_AGENT_SNAP.to_string(),
        revision,
        classic,
    })
}

/// Install and hold a snap at exactly the intended revision.
///
/// Safe to call on every reconciliation pass: when the snap is already at the
/// revision and confinement, only the hold is reasserted.
pub fn install_snap<M: SnapManager + ?Sized>(
    manager: &M,
    intent: &InstallIntent,
) -> Result<InstallOutcome> {
    info!(
        "Ensuring {} snap is installed at revision={} with classic confinement={}",
        intent.name, intent.revision, intent.classic
    );

    let handle = manager.lookup(&intent.name)?;
    let previous_revision = handle.installed.as_ref().map(|s| s.revision.clone());

    let changed = if handle.is_at(intent.revision, intent.classic) {
        debug!("{} already at revision {}", intent.name, intent.revision);
        false
    } else {
        manager.ensure_present(&handle, intent.revision, intent.classic)?;
        true
    };

    manager.hold(&handle)?;

    Ok(InstallOutcome {
        intent: intent.clone(),
        previous_revision,
        changed,
    })
}

/// Look up the host architecture and install the matching grafana-agent revision.
pub fn install_grafana_agent<M: SnapManager + ?Sized>(
    manager: &M,
    classic: bool,
) -> Result<InstallOutcome> {
    install_grafana_agent_for_arch(manager, classic, &arch::raw_system_arch())
}

/// As [`install_grafana_agent`], for an explicitly supplied raw architecture.
pub fn install_grafana_agent_for_arch<M: SnapManager + ?Sized>(
    manager: &M,
    classic: bool,
    raw_arch: &str,
) -> Result<InstallOutcome> {
    let intent = plan_install(classic, raw_arch)?;
    install_snap(manager, &intent)
}
