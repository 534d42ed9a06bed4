//! Pinned grafana-agent revisions
//!
//! Each supported (confinement, architecture) pair maps to exactly one store
//! revision. Anything outside the table is an unsupported platform.

use serde::{Deserialize, Serialize};

use crate::arch::Arch;
use crate::error::SnapError;
use crate::Result;

/// Snap confinement mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confinement {
    Strict,
    Classic,
}

impl Confinement {
    pub fn from_classic(classic: bool) -> Self {
        if classic {
            Confinement::Classic
        } else {
            Confinement::Strict
        }
    }

    pub fn is_classic(self) -> bool {
        self == Confinement::Classic
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Confinement::Strict => "strict",
            Confinement::Classic => "classic",
        }
    }
}

impl std::fmt::Display for Confinement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Store revision of a snap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(pub u32);

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Name of the snap this crate manages
pub const GRAFANA_AGENT_SNAP: &str = "grafana-agent";

/// grafana-agent revision to install per (confinement, architecture)
pub const GRAFANA_AGENT_REVISIONS: &[(Confinement, Arch, Revision)] = &[
    (Confinement::Strict, Arch::Amd64, Revision(16)),
    (Confinement::Strict, Arch::Arm64, Revision(23)),
];

/// Look up the pinned grafana-agent revision.
///
/// Architectures match by name, so `Arch::Other("amd64")` finds the amd64 row.
/// Fails with [`SnapError::SpecNotFound`] for any pair without a table entry.
///
/// # TDD: test_classic_amd64_is_unsupported
pub fn resolve_revision(classic: bool, arch: &Arch) -> Result<Revision> {
    let confinement = Confinement::from_classic(classic);

    GRAFANA_AGENT_REVISIONS
        .iter()
        .find(|(c, a, _)| *c == confinement && a.as_str() == arch.as_str())
        .map(|(_, _, revision)| *revision)
        .ok_or_else(|| SnapError::SpecNotFound {
            arch: arch.to_string(),
            confinement,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_amd64_resolves_to_16() {
        let rev = resolve_revision(false, &Arch::Amd64).unwrap();
        assert_eq!(rev, Revision(16));
    }

    #[test]
    fn test_strict_arm64_resolves_to_23() {
        let rev = resolve_revision(false, &Arch::Arm64).unwrap();
        assert_eq!(rev, Revision(23));
    }

    #[test]
    fn test_every_table_entry_resolves_deterministically() {
        for (confinement, arch, expected) in GRAFANA_AGENT_REVISIONS {
            for _ in 0..3 {
                let rev = resolve_revision(confinement.is_classic(), arch).unwrap();
                assert_eq!(rev, *expected);
            }
        }
    }

    #[test]
    fn test_classic_amd64_is_unsupported() {
        let err = resolve_revision(true, &Arch::Amd64).unwrap_err();

        assert!(err.is_unsupported_platform());
        let msg = err.to_string();
        assert!(msg.contains("arch=amd64"), "{msg}");
        assert!(msg.contains("confinement=classic"), "{msg}");
    }

    #[test]
    fn test_unknown_arch_is_unsupported() {
        let err = resolve_revision(false, &Arch::normalize("riscv64")).unwrap_err();

        match err {
            SnapError::SpecNotFound { arch, confinement } => {
                assert_eq!(arch, "riscv64");
                assert_eq!(confinement, Confinement::Strict);
            }
            other => panic!("expected SpecNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_hand_built_arch_matches_table_by_name() {
        let rev = resolve_revision(false, &Arch::Other("amd64".to_string())).unwrap();
        assert_eq!(rev, Revision(16));

        let rev = resolve_revision(false, &Arch::Other("arm64".to_string())).unwrap();
        assert_eq!(rev, Revision(23));

        let err = resolve_revision(true, &Arch::Other("amd64".to_string())).unwrap_err();
        assert!(err.is_unsupported_platform());
    }

    #[test]
    fn test_table_has_no_duplicate_keys() {
        for (i, (c1, a1, _)) in GRAFANA_AGENT_REVISIONS.iter().enumerate() {
            for (c2, a2, _) in &GRAFANA_AGENT_REVISIONS[i + 1..] {
                assert!(!(c1 == c2 && a1 == a2), "duplicate entry {c1}/{a1}");
            }
        }
    }

    #[test]
    fn test_confinement_round_trip_through_flag() {
        assert_eq!(Confinement::from_classic(true), Confinement::Classic);
        assert_eq!(Confinement::from_classic(false), Confinement::Strict);
        assert!(Confinement::Classic.is_classic());
        assert_eq!(Confinement::Strict.to_string(), "strict");
    }
}
