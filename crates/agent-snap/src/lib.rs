//! agent-snap: pinned grafana-agent snap management
//!
//! Resolves which grafana-agent snap revision belongs on this machine and
//! installs it, held against automatic refreshes.
//!
//! ## Key Components
//!
//! - [`Arch`]: normalization of kernel architecture names
//! - [`resolve_revision`]: the (confinement, architecture) revision table
//! - [`SnapManager`]: package-manager seam, implemented by [`SnapCli`]
//! - [`install_grafana_agent`]: resolve + install + hold in one call

pub mod arch;
mod error;
pub mod fakes;
pub mod install;
pub mod revision;
pub mod snapctl;
pub mod telemetry;

pub use arch::{raw_system_arch, system_arch, Arch};
pub use error::{SnapError, SnapctlError};
pub use install::{
    install_grafana_agent, install_grafana_agent_for_arch, install_snap, plan_install,
    InstallIntent, InstallOutcome,
};
pub use revision::{
    resolve_revision, Confinement, Revision, GRAFANA_AGENT_REVISIONS, GRAFANA_AGENT_SNAP,
};
pub use snapctl::{
    InstalledSnap, SnapCli, SnapCliConfig, SnapHandle, SnapManager, SnapctlResult,
};
pub use telemetry::init_tracing;

/// Result type for agent-snap operations
pub type Result<T> = std::result::Result<T, SnapError>;
