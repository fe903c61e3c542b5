//! Build-environment bootstrapper library.
//!
//! Sequences the stages that prepare a checkout for the primary build
//! system: host probing, venv isolation, script-dependency install, and a
//! Meson-driven native dependency install.

pub mod meson;
pub mod orchestrator;
pub mod platform;
pub mod policy;
pub mod preflight;
pub mod process;
pub mod venv;
