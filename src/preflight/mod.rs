//! Preflight checks for the bootstrap run.
//!
//! Validates that the host can actually carry the run BEFORE anything is
//! created or installed: required tools on PATH, and (advisory) whether the
//! package index is reachable for the script-dependency install.
//!
//! # Usage
//!
//! ```rust,ignore
//! use depstrap::platform::HostPlatform;
//! use depstrap::preflight;
//!
//! let platform = HostPlatform::detect()?;
//! preflight::ensure_dependencies(platform)?;
//! ```
//!
//! A missing tool is fatal and reported with an install suggestion; an
//! unreachable package index is only a warning, because the install stage
//! surfaces the authoritative network error if it comes to that.

mod host_tools;
mod network;

pub use host_tools::check_host_tools;
pub use network::check_network;

use crate::platform::HostPlatform;
use anyhow::{bail, Result};

/// Severity of a single host inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Ok,
    Warn,
    Fail,
}

/// Result of a single preflight check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the checked item (e.g. the tool name)
    pub name: String,
    pub status: CheckStatus,
    /// Human-readable message
    pub message: String,
    /// Optional suggestion for fixing the issue
    pub suggestion: Option<String>,
}

impl CheckResult {
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Ok,
            message: message.into(),
            suggestion: None,
        }
    }

    /// A non-fatal finding, reported but never failing the run.
    pub fn warn(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Warn,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn fail(
        name: impl Into<String>,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Fail,
            message: message.into(),
            suggestion: Some(suggestion.into()),
        }
    }

    pub fn passed(&self) -> bool {
        self.status != CheckStatus::Fail
    }
}

/// Collected results of all preflight checks.
#[derive(Debug, Default)]
pub struct PreflightReport {
    pub checks: Vec<CheckResult>,
}

impl PreflightReport {
    pub fn is_ok(&self) -> bool {
        self.checks.iter().all(CheckResult::passed)
    }

    /// All fatally failing checks.
    pub fn failures(&self) -> Vec<&CheckResult> {
        self.checks.iter().filter(|c| !c.passed()).collect()
    }

    pub fn print_summary(&self) {
        println!("=== Host environment ===\n");
        for check in &self.checks {
            let tag = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warn => "[WARN]",
                CheckStatus::Fail => "[FAIL]",
            };
            println!("{} {}: {}", tag, check.name, check.message);
            if let Some(suggestion) = &check.suggestion {
                println!("     Suggestion: {}", suggestion);
            }
        }
        println!();
    }
}

/// Run every preflight check for the given host.
pub fn run_checks(platform: HostPlatform) -> PreflightReport {
    let mut report = PreflightReport::default();
    report.checks.extend(check_host_tools(platform));
    report.checks.push(check_network());
    report
}

/// Verify the host has every required tool, printing a summary either way.
///
/// Fails fast with the missing tool names; there is no retry - a missing
/// system tool is an unrecoverable precondition.
pub fn ensure_dependencies(platform: HostPlatform) -> Result<()> {
    let report = run_checks(platform);
    report.print_summary();

    if !report.is_ok() {
        let missing: Vec<&str> = report.failures().iter().map(|c| c.name.as_str()).collect();
        bail!("missing required host tools: {}", missing.join(", "));
    }
    Ok(())
}
