//! Build-environment bootstrap CLI.
//!
//! Prepares everything the primary build system expects to find: verifies
//! the host tools, provisions a Python venv with pinned meson/ninja, and
//! drives Meson to materialize the native dependencies. On macOS and
//! Windows the dependencies are only fetched; on Linux they are compiled
//! and installed.
//!
//! # Usage
//!
//! ```bash
//! # Use system copies of every dependency
//! depstrap
//!
//! # Fetch zlib instead of using the system copy, build zlib and
//! # openssl as static libraries
//! depstrap --dep-skip-system zlib --dep-static zlib openssl
//! ```
//!
//! The first invocation creates the venv next to the executable and
//! re-launches itself inside it; later invocations reuse the venv.

use anyhow::Result;
use clap::Parser;

use depstrap::orchestrator::{self, HostStages};
use depstrap::platform::HostPlatform;
use depstrap::policy::DepPolicy;
use depstrap::process::CommandFailure;

#[derive(Parser)]
#[command(name = "depstrap")]
#[command(version, about = "Bootstrap the build environment", long_about = None)]
struct Cli {
    /// Subprojects to fetch and build instead of using system copies
    #[arg(long, value_name = "SUBPROJECT", num_args = 1..)]
    dep_skip_system: Vec<String>,

    /// Subprojects to build as static libraries
    #[arg(long, value_name = "SUBPROJECT", num_args = 1..)]
    dep_static: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    let policy = DepPolicy::new(cli.dep_skip_system, cli.dep_static);

    if let Err(e) = run(&policy) {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }
}

fn run(policy: &DepPolicy) -> Result<()> {
    let platform = HostPlatform::detect()?;
    let mut stages = HostStages::new(platform);
    orchestrator::run(&mut stages, policy)
}

/// Forward the failing tool's exit status where one exists; plain errors
/// (missing tools, bad flags) exit 1.
fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<CommandFailure>()
        .and_then(|failure| failure.status.code())
        .unwrap_or(1)
}
