//! Host tool validation.
//!
//! Checks that the external tools this run will invoke are installed and
//! executable. The required set differs per platform: only Linux compiles
//! the fetched dependencies natively, so only Linux needs a C toolchain
//! here.

use super::CheckResult;
use crate::platform::HostPlatform;
use crate::process::which;

/// Required tools with their purpose and an install suggestion.
const LINUX_TOOLS: &[(&str, &str, &str)] = &[
    (
        "python3",
        "create the script environment",
        "sudo apt install python3 python3-venv",
    ),
    ("git", "fetch subproject sources", "sudo apt install git"),
    (
        "pkg-config",
        "locate system-provided libraries",
        "sudo apt install pkg-config",
    ),
    (
        "cc",
        "compile fetched dependencies",
        "sudo apt install build-essential",
    ),
];

const MACOS_TOOLS: &[(&str, &str, &str)] = &[
    (
        "python3",
        "create the script environment",
        "brew install python",
    ),
    ("git", "fetch subproject sources", "xcode-select --install"),
    (
        "pkg-config",
        "locate system-provided libraries",
        "brew install pkg-config",
    ),
];

const WINDOWS_TOOLS: &[(&str, &str, &str)] = &[
    (
        "python",
        "create the script environment",
        "winget install Python.Python.3.12",
    ),
    ("git", "fetch subproject sources", "winget install Git.Git"),
];

/// The tool table for a host platform.
pub fn required_tools(platform: HostPlatform) -> &'static [(&'static str, &'static str, &'static str)] {
    match platform {
        HostPlatform::Linux => LINUX_TOOLS,
        HostPlatform::MacOs => MACOS_TOOLS,
        HostPlatform::Windows => WINDOWS_TOOLS,
    }
}

/// Check that all required host tools are installed.
pub fn check_host_tools(platform: HostPlatform) -> Vec<CheckResult> {
    required_tools(platform)
        .iter()
        .map(|(tool, purpose, install)| check_tool(tool, purpose, install))
        .collect()
}

fn check_tool(tool: &str, purpose: &str, install_cmd: &str) -> CheckResult {
    match which(tool) {
        Some(path) => CheckResult::pass(
            tool,
            format!("found at {} (needed to {})", path.display(), purpose),
        ),
        None => CheckResult::fail(
            tool,
            format!("not found (needed to {})", purpose),
            install_cmd,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_platform_has_tools() {
        for platform in [
            HostPlatform::Linux,
            HostPlatform::MacOs,
            HostPlatform::Windows,
        ] {
            assert!(!required_tools(platform).is_empty());
        }
    }

    #[test]
    fn test_every_platform_requires_a_python() {
        assert!(required_tools(HostPlatform::Linux)
            .iter()
            .any(|(tool, _, _)| *tool == "python3"));
        assert!(required_tools(HostPlatform::MacOs)
            .iter()
            .any(|(tool, _, _)| *tool == "python3"));
        // The Windows installer registers `python`, not `python3`
        assert!(required_tools(HostPlatform::Windows)
            .iter()
            .any(|(tool, _, _)| *tool == "python"));
    }

    #[test]
    fn test_only_linux_requires_a_compiler() {
        assert!(required_tools(HostPlatform::Linux)
            .iter()
            .any(|(tool, _, _)| *tool == "cc"));
        assert!(!required_tools(HostPlatform::MacOs)
            .iter()
            .any(|(tool, _, _)| *tool == "cc"));
        assert!(!required_tools(HostPlatform::Windows)
            .iter()
            .any(|(tool, _, _)| *tool == "cc"));
    }

    #[test]
    fn test_check_host_tools_returns_one_result_per_tool() {
        let results = check_host_tools(HostPlatform::Linux);
        assert_eq!(results.len(), LINUX_TOOLS.len());
    }
}
