//! Host architecture detection and normalization
//!
//! Snap revisions are published per Debian-style architecture name, while the
//! kernel reports its own spelling (`x86_64`, `aarch64`, ...). This module maps
//! one onto the other.

use serde::{Deserialize, Serialize};
use std::process::Command;
use tracing::{debug, warn};

/// Normalized CPU architecture
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Arch {
    Amd64,
    Arm64,
    /// Anything we do not map; carried through unchanged
    Other(String),
}

impl Arch {
    /// Normalize a raw architecture string as reported by the OS.
    ///
    /// Total: unknown values come back as [`Arch::Other`] holding the input.
    pub fn normalize(raw: &str) -> Self {
        match raw {
            "x86_64" | "amd64" => Arch::Amd64,
            "aarch64" | "arm64" | "armv8b" | "armv8l" => Arch::Arm64,
            other => Arch::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::Arm64 => "arm64",
            Arch::Other(raw) => raw,
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl From<String> for Arch {
    fn from(raw: String) -> Self {
        Arch::normalize(&raw)
    }
}

impl From<Arch> for String {
    fn from(arch: Arch) -> Self {
        arch.as_str().to_string()
    }
}

/// Raw machine architecture of the running host.
///
/// Reads `uname -m`; falls back to the compile-time target architecture when
/// `uname` is missing or prints nothing.
pub fn raw_system_arch() -> String {
    match Command::new("uname").arg("-m").output() {
        Ok(out) if out.status.success() => {
            let raw = String::from_utf8_lossy(&out.stdout).trim().to_string();
            if !raw.is_empty() {
                debug!("uname -m reported {}", raw);
                return raw;
            }
            warn!("uname -m printed nothing, using target architecture");
        }
        Ok(out) => warn!(
            "uname -m exited with {}, using target architecture",
            out.status
        ),
        Err(e) => warn!("Could not run uname: {}, using target architecture", e),
    }
    std::env::consts::ARCH.to_string()
}

/// Normalized architecture of the running host.
pub fn system_arch() -> Arch {
    Arch::normalize(&raw_system_arch())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_x86_aliases_normalize_to_amd64() {
        for raw in ["x86_64", "amd64"] {
            assert_eq!(Arch::normalize(raw), Arch::Amd64, "{raw}");
        }
    }

    #[test]
    fn test_arm_aliases_normalize_to_arm64() {
        for raw in ["aarch64", "arm64", "armv8b", "armv8l"] {
            assert_eq!(Arch::normalize(raw), Arch::Arm64, "{raw}");
        }
    }

    #[test]
    fn test_unknown_arch_passes_through() {
        for raw in ["riscv64", "s390x", "ppc64le", "armv7l", "", "X86_64"] {
            let arch = Arch::normalize(raw);
            assert_eq!(arch, Arch::Other(raw.to_string()));
            assert_eq!(arch.as_str(), raw);
        }
    }

    #[test]
    fn test_display_uses_normalized_name() {
        assert_eq!(Arch::normalize("aarch64").to_string(), "arm64");
        assert_eq!(Arch::normalize("x86_64").to_string(), "amd64");
    }

    #[test]
    fn test_system_arch_is_never_empty() {
        assert!(!raw_system_arch().is_empty());
        assert!(!system_arch().as_str().is_empty());
    }
}
