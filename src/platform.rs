//! Host platform classification.
//!
//! The platform is detected once at startup and threaded explicitly into the
//! orchestrator, which uses it to decide whether the dependency build gets a
//! native compile pass. Nothing else should query the OS ad hoc.

use anyhow::{bail, Result};
use std::fmt;

/// The host operating-system family, fixed for the duration of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    Linux,
    MacOs,
    Windows,
}

impl HostPlatform {
    /// Classify the host. Any OS outside the supported set is an
    /// unrecoverable precondition error.
    pub fn detect() -> Result<Self> {
        match std::env::consts::OS {
            "linux" => Ok(HostPlatform::Linux),
            "macos" => Ok(HostPlatform::MacOs),
            "windows" => Ok(HostPlatform::Windows),
            other => bail!("unsupported host platform: {other}"),
        }
    }

    pub fn is_linux(self) -> bool {
        self == HostPlatform::Linux
    }

    pub fn name(self) -> &'static str {
        match self {
            HostPlatform::Linux => "Linux",
            HostPlatform::MacOs => "macOS",
            HostPlatform::Windows => "Windows",
        }
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
