//! Stage sequencing for one bootstrap run.
//!
//! Four ordered stages, forward progress or abort:
//!
//! ```text
//! ProbeEnvironment -> BootstrapIsolation -> InstallRequirements -> DriveBuildConfig
//! ```
//!
//! The ordering is load-bearing: Meson must come from a venv with the
//! pinned requirements installed, so the driver stage never starts before
//! isolation is confirmed. There are no recovery edges - the first failing
//! stage aborts the run and its error is what the process reports.

use anyhow::{Context, Result};
use std::env;

use crate::meson::{BuildConfigDriver, Meson, DEFAULT_BUILD_DIR};
use crate::platform::HostPlatform;
use crate::policy::DepPolicy;
use crate::preflight;
use crate::venv::{self, VenvPaths};

/// The four stages, in the only order `run` ever calls them.
pub trait Stages {
    fn probe_environment(&mut self) -> Result<()>;
    fn bootstrap_isolation(&mut self) -> Result<()>;
    fn install_requirements(&mut self) -> Result<()>;
    fn drive_build_config(&mut self, policy: &DepPolicy) -> Result<()>;
}

/// Sequence the stages. Any failure short-circuits the rest.
pub fn run<S: Stages>(stages: &mut S, policy: &DepPolicy) -> Result<()> {
    stages.probe_environment()?;
    stages.bootstrap_isolation()?;
    stages.install_requirements()?;
    stages.drive_build_config(policy)
}

/// Drive the build-configuration tool: setup always, compile only where the
/// host produces native artifacts the primary build can consume (Linux),
/// install always last. On macOS and Windows Meson only fetches the
/// dependency sources; compiling them is the primary build's problem.
pub fn drive<D: BuildConfigDriver>(
    driver: &mut D,
    platform: HostPlatform,
    policy: &DepPolicy,
) -> Result<()> {
    driver.setup(policy)?;
    if platform.is_linux() {
        driver.compile()?;
    }
    driver.install()
}

/// Production stages, wired to the real host.
///
/// Holds the venv handle produced by the bootstrap stage; the later stages
/// take it from there, which keeps the ordering visible in the types.
pub struct HostStages {
    platform: HostPlatform,
    venv: Option<VenvPaths>,
}

impl HostStages {
    pub fn new(platform: HostPlatform) -> Self {
        Self {
            platform,
            venv: None,
        }
    }

    fn venv(&self) -> Result<&VenvPaths> {
        self.venv
            .as_ref()
            .context("virtual environment not bootstrapped")
    }
}

impl Stages for HostStages {
    fn probe_environment(&mut self) -> Result<()> {
        println!("Bootstrapping build environment ({})\n", self.platform);
        preflight::ensure_dependencies(self.platform)
    }

    fn bootstrap_isolation(&mut self) -> Result<()> {
        let entry = env::current_exe().context("failed to resolve the running executable")?;
        // Either returns with the venv active, or re-execs and never returns
        self.venv = Some(venv::ensure_in_venv(&entry, true)?);
        Ok(())
    }

    fn install_requirements(&mut self) -> Result<()> {
        venv::install_requirements(self.venv()?)
    }

    fn drive_build_config(&mut self, policy: &DepPolicy) -> Result<()> {
        let meson_program = self.venv()?.meson();
        let source_dir = env::current_dir().context("failed to resolve the working directory")?;
        let build_dir = source_dir.join(DEFAULT_BUILD_DIR);
        let mut meson = Meson::new(source_dir, build_dir, meson_program);
        drive(&mut meson, self.platform, policy)?;

        println!("\n=== Dependencies ready ===");
        Ok(())
    }
}
