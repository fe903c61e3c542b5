//! Virtual-environment isolation for script dependencies.
//!
//! Meson and ninja are installed per-tool into a Python venv instead of the
//! host's global site-packages. The bootstrap is a guarded hand-off:
//!
//! 1. A pure predicate decides whether we are already inside the venv, by
//!    comparing the [`VENV_MARKER_ENV`] value (set only by our own re-exec)
//!    against the expected venv directory.
//! 2. If inside: no-op. The marker makes the re-exec non-recursive.
//! 3. If outside: create the venv (reused if it already exists - the venv
//!    persists across runs and is never torn down here), re-invoke the
//!    current executable with the venv on PATH, and exit with the child's
//!    status. The parent does nothing after the hand-off.
//!
//! Concurrent runs against the same venv are not supported.

use anyhow::{bail, Context, Result};
use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::process::Cmd;

/// Marker variable identifying the managed venv a process runs inside.
/// Set exclusively by [`ensure_in_venv`]'s re-exec, never inherited from
/// activation scripts (which is why `VIRTUAL_ENV` is not the marker).
pub const VENV_MARKER_ENV: &str = "DEPSTRAP_VENV";

/// Script dependencies installed into the venv, version-pinned.
pub const PINNED_REQUIREMENTS: &[&str] = &["meson==1.4.0", "ninja==1.11.1.1"];

/// Filesystem layout of the managed venv.
#[derive(Debug, Clone)]
pub struct VenvPaths {
    dir: PathBuf,
}

impl VenvPaths {
    /// Deterministic venv location for an entry point: a `.venv-<stem>`
    /// directory next to the executable, keyed by its file stem.
    pub fn for_entry_point(entry_point: &Path) -> Self {
        let stem = entry_point
            .file_stem()
            .and_then(OsStr::to_str)
            .unwrap_or("depstrap");
        let parent = entry_point.parent().unwrap_or_else(|| Path::new("."));
        Self {
            dir: parent.join(format!(".venv-{stem}")),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Executable directory inside the venv (`Scripts` on Windows).
    pub fn bin_dir(&self) -> PathBuf {
        if cfg!(windows) {
            self.dir.join("Scripts")
        } else {
            self.dir.join("bin")
        }
    }

    pub fn python(&self) -> PathBuf {
        self.bin_dir()
            .join(if cfg!(windows) { "python.exe" } else { "python" })
    }

    pub fn meson(&self) -> PathBuf {
        self.bin_dir()
            .join(if cfg!(windows) { "meson.exe" } else { "meson" })
    }

    pub fn exists(&self) -> bool {
        self.python().exists()
    }
}

/// Are we running inside the expected venv? Pure: the caller supplies the
/// marker value read from the process environment.
pub fn is_isolated(marker: Option<&OsStr>, expected_dir: &Path) -> bool {
    marker.map_or(false, |value| Path::new(value) == expected_dir)
}

/// What the bootstrapper has to do, decided before any side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapAction {
    AlreadyInside,
    CreateAndReenter,
}

/// Pure bootstrap decision. Outside the venv with creation disabled is a
/// configuration error.
pub fn plan_bootstrap(inside: bool, create_venv: bool) -> Result<BootstrapAction> {
    match (inside, create_venv) {
        (true, _) => Ok(BootstrapAction::AlreadyInside),
        (false, true) => Ok(BootstrapAction::CreateAndReenter),
        (false, false) => bail!(
            "not running inside the managed environment and venv creation is disabled"
        ),
    }
}

/// Ensure the rest of the run executes inside the managed venv.
///
/// Returns the venv layout when already inside. Otherwise creates the venv
/// and re-invokes the current executable inside it; that branch does not
/// return - the parent exits with the child's status.
pub fn ensure_in_venv(entry_point: &Path, create_venv: bool) -> Result<VenvPaths> {
    let venv = VenvPaths::for_entry_point(entry_point);
    let inside = is_isolated(env::var_os(VENV_MARKER_ENV).as_deref(), venv.dir());

    match plan_bootstrap(inside, create_venv)? {
        BootstrapAction::AlreadyInside => Ok(venv),
        BootstrapAction::CreateAndReenter => {
            create_venv_dir(&venv)?;
            reenter(&venv)
        }
    }
}

/// Install the pinned script dependencies with the venv's own pip.
pub fn install_requirements(venv: &VenvPaths) -> Result<()> {
    println!(
        "Installing script dependencies ({})...",
        PINNED_REQUIREMENTS.join(", ")
    );
    Cmd::new(venv.python())
        .args(["-m", "pip", "install", "--disable-pip-version-check"])
        .args(PINNED_REQUIREMENTS)
        .error_msg("Failed to install script dependencies")
        .run_streamed()
}

fn create_venv_dir(venv: &VenvPaths) -> Result<()> {
    if venv.exists() {
        println!("Virtual environment: {} (cached)", venv.dir().display());
        return Ok(());
    }

    println!("Creating virtual environment at {}", venv.dir().display());
    Cmd::new(host_python())
        .args(["-m", "venv"])
        .arg_path(venv.dir())
        .error_msg("Failed to create virtual environment")
        .run_streamed()
}

/// Interpreter used to create the venv; inside the venv we always use
/// [`VenvPaths::python`].
fn host_python() -> &'static str {
    if cfg!(windows) {
        "python"
    } else {
        "python3"
    }
}

/// One-shot hand-off: spawn the current executable with the venv active,
/// block until it finishes, exit with its status. The marker variable set
/// here is what makes the child take the no-op branch.
fn reenter(venv: &VenvPaths) -> Result<VenvPaths> {
    let exe = env::current_exe().context("failed to resolve the running executable")?;
    println!("Re-entering {} inside the virtual environment\n", exe.display());

    let status = Command::new(&exe)
        .args(env::args_os().skip(1))
        .env(VENV_MARKER_ENV, venv.dir())
        // For Python tooling that inspects the conventional variable
        .env("VIRTUAL_ENV", venv.dir())
        .env("PATH", prepend_path(&venv.bin_dir())?)
        .status()
        .with_context(|| format!("failed to re-enter `{}`", exe.display()))?;

    std::process::exit(status.code().unwrap_or(1));
}

fn prepend_path(dir: &Path) -> Result<std::ffi::OsString> {
    let mut parts = vec![dir.to_path_buf()];
    if let Some(existing) = env::var_os("PATH") {
        parts.extend(env::split_paths(&existing));
    }
    env::join_paths(parts).context("PATH contains an entry that cannot be joined")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_venv_location_is_deterministic() {
        let venv = VenvPaths::for_entry_point(Path::new("/opt/tools/depstrap"));
        assert_eq!(venv.dir(), Path::new("/opt/tools/.venv-depstrap"));

        // Same identity, same location
        let again = VenvPaths::for_entry_point(Path::new("/opt/tools/depstrap"));
        assert_eq!(venv.dir(), again.dir());
    }

    #[test]
    fn test_venv_layout() {
        let venv = VenvPaths::for_entry_point(Path::new("/opt/tools/depstrap"));
        if cfg!(windows) {
            assert!(venv.python().ends_with("Scripts/python.exe"));
        } else {
            assert!(venv.python().ends_with("bin/python"));
            assert!(venv.meson().ends_with("bin/meson"));
        }
    }

    #[test]
    fn test_is_isolated() {
        let expected = Path::new("/work/.venv-depstrap");
        assert!(!is_isolated(None, expected));
        assert!(!is_isolated(Some(OsStr::new("/elsewhere/.venv")), expected));
        assert!(is_isolated(
            Some(OsStr::new("/work/.venv-depstrap")),
            expected
        ));
    }

    #[test]
    fn test_plan_bootstrap() {
        assert_eq!(
            plan_bootstrap(true, true).unwrap(),
            BootstrapAction::AlreadyInside
        );
        assert_eq!(
            plan_bootstrap(true, false).unwrap(),
            BootstrapAction::AlreadyInside
        );
        assert_eq!(
            plan_bootstrap(false, true).unwrap(),
            BootstrapAction::CreateAndReenter
        );
        assert!(plan_bootstrap(false, false).is_err());
    }

    #[test]
    fn test_ensure_in_venv_is_a_noop_inside() {
        let temp = tempfile::tempdir().unwrap();
        let entry = temp.path().join("depstrap");
        let expected = VenvPaths::for_entry_point(&entry);

        env::set_var(VENV_MARKER_ENV, expected.dir());
        // Twice in a row: both calls no-op, nothing is created on disk
        let first = ensure_in_venv(&entry, true).unwrap();
        let second = ensure_in_venv(&entry, false).unwrap();
        env::remove_var(VENV_MARKER_ENV);

        assert_eq!(first.dir(), expected.dir());
        assert_eq!(second.dir(), expected.dir());
        assert!(!expected.dir().exists());
    }

    #[test]
    fn test_requirements_are_pinned() {
        for requirement in PINNED_REQUIREMENTS {
            assert!(requirement.contains("=="), "unpinned: {requirement}");
        }
    }
}
