//! Meson driver for native dependency resolution.
//!
//! Meson installs the native dependencies so the primary build system can
//! find them; its own dependency graph stays a black box. This module only
//! translates policy into an invocation:
//!
//! - subprojects in the skip-system set become `--force-fallback-for=...`
//! - subprojects in the static set become `-D<name>:default_library=static`
//!
//! Policy names are validated eagerly against the `subprojects/*.wrap`
//! files so a typo fails here with a readable message instead of deep in
//! Meson's own output. Setup against an already-configured build directory
//! reconfigures it instead of failing.

use anyhow::{bail, Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::policy::DepPolicy;
use crate::process::Cmd;

/// Build directory consumed and reused across setup/compile/install.
pub const DEFAULT_BUILD_DIR: &str = "build";

/// The three operations the orchestrator drives, in order. `Meson` is the
/// production implementation; tests substitute recording drivers.
pub trait BuildConfigDriver {
    fn setup(&mut self, policy: &DepPolicy) -> Result<()>;
    fn compile(&mut self) -> Result<()>;
    fn install(&mut self) -> Result<()>;
}

/// Wrapper around one Meson build directory.
pub struct Meson {
    source_dir: PathBuf,
    build_dir: PathBuf,
    program: PathBuf,
}

impl Meson {
    /// `program` is the meson executable to invoke - normally the one pip
    /// installed into the venv, so constructing a driver presupposes a
    /// bootstrapped environment.
    pub fn new(
        source_dir: impl Into<PathBuf>,
        build_dir: impl Into<PathBuf>,
        program: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            build_dir: build_dir.into(),
            program: program.into(),
        }
    }

    /// A build directory that went through `meson setup` before.
    fn is_configured(&self) -> bool {
        self.build_dir.join("meson-private").join("coredata.dat").exists()
    }
}

impl BuildConfigDriver for Meson {
    fn setup(&mut self, policy: &DepPolicy) -> Result<()> {
        let known = known_subprojects(&self.source_dir)?;
        validate_subprojects(policy, &known)?;

        let reconfigure = self.is_configured();
        println!("=== Configuring dependency build ===");
        println!("  Build dir: {}", self.build_dir.display());
        if reconfigure {
            println!("  Reconfiguring existing build directory");
        }
        if !policy.skip_system.is_empty() {
            println!("  Forced fallback: {}", join_names(&policy.skip_system));
        }
        if !policy.static_libs.is_empty() {
            println!("  Static subprojects: {}", join_names(&policy.static_libs));
        }

        Cmd::new(self.program.clone())
            .args(setup_args(&self.build_dir, policy, reconfigure))
            .current_dir(&self.source_dir)
            .error_msg("Meson setup failed")
            .run_streamed()
    }

    fn compile(&mut self) -> Result<()> {
        println!("\n=== Compiling dependencies ===");
        Cmd::new(self.program.clone())
            .args(["compile", "-C"])
            .arg_path(&self.build_dir)
            .current_dir(&self.source_dir)
            .error_msg("Meson compile failed")
            .run_streamed()
    }

    fn install(&mut self) -> Result<()> {
        println!("\n=== Installing dependencies ===");
        Cmd::new(self.program.clone())
            .args(["install", "-C"])
            .arg_path(&self.build_dir)
            .current_dir(&self.source_dir)
            .error_msg("Meson install failed")
            .run_streamed()
    }
}

/// Build the `meson setup` argument list. Pure, for testing.
fn setup_args(build_dir: &Path, policy: &DepPolicy, reconfigure: bool) -> Vec<String> {
    let mut args = vec!["setup".to_string()];
    if reconfigure {
        args.push("--reconfigure".to_string());
    }
    if !policy.skip_system.is_empty() {
        args.push(format!(
            "--force-fallback-for={}",
            join_names(&policy.skip_system)
        ));
    }
    for name in &policy.static_libs {
        args.push(format!("-D{name}:default_library=static"));
    }
    args.push(build_dir.display().to_string());
    args
}

/// Subproject names Meson can resolve, read from `subprojects/*.wrap`.
pub fn known_subprojects(source_dir: &Path) -> Result<BTreeSet<String>> {
    let wrap_dir = source_dir.join("subprojects");
    let mut known = BTreeSet::new();
    if !wrap_dir.is_dir() {
        return Ok(known);
    }

    let entries = fs::read_dir(&wrap_dir)
        .with_context(|| format!("failed to read {}", wrap_dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        let is_wrap = path
            .extension()
            .map_or(false, |extension| extension == "wrap");
        if is_wrap {
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                known.insert(stem.to_string());
            }
        }
    }
    Ok(known)
}

/// Reject policy names with no matching wrap file, before Meson runs.
fn validate_subprojects(policy: &DepPolicy, known: &BTreeSet<String>) -> Result<()> {
    let unknown: Vec<&str> = policy
        .requested()
        .filter(|name| !known.contains(*name))
        .collect();
    if unknown.is_empty() {
        return Ok(());
    }
    bail!(
        "unknown subproject(s): {}\n\
         Each name needs a matching .wrap file under subprojects/",
        unknown.join(", ")
    );
}

fn join_names(names: &BTreeSet<String>) -> String {
    names
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn policy(skip: &[&str], statics: &[&str]) -> DepPolicy {
        DepPolicy::new(
            skip.iter().map(|s| s.to_string()).collect(),
            statics.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_setup_args_empty_policy() {
        let args = setup_args(Path::new("build"), &DepPolicy::default(), false);
        assert_eq!(args, vec!["setup", "build"]);
    }

    #[test]
    fn test_setup_args_policy_directives() {
        let args = setup_args(
            Path::new("build"),
            &policy(&["zlib"], &["zlib", "openssl"]),
            false,
        );
        assert_eq!(
            args,
            vec![
                "setup",
                "--force-fallback-for=zlib",
                "-Dopenssl:default_library=static",
                "-Dzlib:default_library=static",
                "build",
            ]
        );
    }

    #[test]
    fn test_setup_args_multiple_fallbacks_joined() {
        let args = setup_args(Path::new("build"), &policy(&["zlib", "openssl"], &[]), false);
        assert!(args.contains(&"--force-fallback-for=openssl,zlib".to_string()));
    }

    #[test]
    fn test_setup_args_reconfigure() {
        let args = setup_args(Path::new("build"), &DepPolicy::default(), true);
        assert_eq!(args, vec!["setup", "--reconfigure", "build"]);
    }

    #[test]
    fn test_known_subprojects_reads_wrap_stems() {
        let temp = tempdir().unwrap();
        let wrap_dir = temp.path().join("subprojects");
        fs::create_dir(&wrap_dir).unwrap();
        fs::write(wrap_dir.join("zlib.wrap"), "[wrap-file]\n").unwrap();
        fs::write(wrap_dir.join("openssl.wrap"), "[wrap-git]\n").unwrap();
        fs::write(wrap_dir.join("README.md"), "not a wrap\n").unwrap();

        let known = known_subprojects(temp.path()).unwrap();
        let names: Vec<&str> = known.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["openssl", "zlib"]);
    }

    #[test]
    fn test_known_subprojects_without_wrap_dir() {
        let temp = tempdir().unwrap();
        assert!(known_subprojects(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_validate_rejects_unknown_names() {
        let known: BTreeSet<String> = ["zlib".to_string()].into_iter().collect();
        let err = validate_subprojects(&policy(&["zlib", "libfoo"], &[]), &known).unwrap_err();
        assert!(err.to_string().contains("libfoo"));
        assert!(!err.to_string().contains("zlib,"));
    }

    #[test]
    fn test_validate_allows_overlapping_sets() {
        let known: BTreeSet<String> = ["zlib".to_string(), "openssl".to_string()]
            .into_iter()
            .collect();
        assert!(validate_subprojects(&policy(&["zlib"], &["zlib", "openssl"]), &known).is_ok());
    }

    #[test]
    fn test_is_configured_detects_coredata() {
        let temp = tempdir().unwrap();
        let meson = Meson::new(temp.path(), temp.path().join("build"), "meson");
        assert!(!meson.is_configured());

        let private = temp.path().join("build").join("meson-private");
        fs::create_dir_all(&private).unwrap();
        fs::write(private.join("coredata.dat"), b"").unwrap();
        assert!(meson.is_configured());
    }
}
