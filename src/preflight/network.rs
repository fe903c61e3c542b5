//! Package index reachability check.
//!
//! The dependency-install stage needs to reach the Python package index.
//! This probe is advisory only: an unreachable index downgrades to a
//! warning, since pip reports the real error if the install actually fails.

use super::CheckResult;
use crate::process::{exists, Cmd};

const PACKAGE_INDEX_URL: &str = "https://pypi.org/simple/";

/// Probe the package index with a HEAD request.
pub fn check_network() -> CheckResult {
    // curl keeps this dependency-free; if it is missing we just skip the probe
    if !exists("curl") {
        return CheckResult::warn("network", "curl not found, skipping package index probe");
    }

    let result = Cmd::new("curl")
        .args([
            "--head",           // HEAD request only
            "--silent",         // No progress output
            "--fail",           // Fail on HTTP errors
            "--max-time", "10", // 10 second timeout
            PACKAGE_INDEX_URL,
        ])
        .allow_fail()
        .run();

    match result {
        Ok(result) if result.success() => CheckResult::pass(
            "network",
            format!("package index reachable ({})", index_host()),
        ),
        Ok(_) => CheckResult::warn(
            "network",
            format!(
                "package index unreachable ({}), dependency install may fail",
                index_host()
            ),
        ),
        Err(e) => CheckResult::warn("network", format!("failed to probe package index: {e:#}")),
    }
}

/// Just the host, for display.
fn index_host() -> &'static str {
    "pypi.org"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_host() {
        assert!(!index_host().is_empty());
    }

    #[test]
    fn test_check_network_never_fails_the_run() {
        let result = check_network();
        assert!(result.passed());
    }
}
