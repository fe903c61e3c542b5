//! Per-subproject dependency policy.
//!
//! Two sets of Meson subproject names, taken verbatim from the CLI flags:
//! `skip_system` forces a subproject to be fetched and built instead of
//! resolved from the host system; `static_libs` forces a static artifact.
//! A name may appear in both sets - the directives are independent and
//! Meson arbitrates any conflict. Absence from both means "system copy,
//! default linkage".

use std::collections::BTreeSet;

/// Immutable policy sets passed through to `meson setup`.
///
/// `BTreeSet` deduplicates repeated names and keeps iteration order
/// deterministic, so generated command lines are stable.
#[derive(Debug, Clone, Default)]
pub struct DepPolicy {
    pub skip_system: BTreeSet<String>,
    pub static_libs: BTreeSet<String>,
}

impl DepPolicy {
    pub fn new(skip_system: Vec<String>, static_libs: Vec<String>) -> Self {
        Self {
            skip_system: skip_system.into_iter().collect(),
            static_libs: static_libs.into_iter().collect(),
        }
    }

    /// Every subproject named by either set, deduplicated and sorted.
    pub fn requested(&self) -> impl Iterator<Item = &str> + '_ {
        self.skip_system.union(&self.static_libs).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.skip_system.is_empty() && self.static_libs.is_empty()
    }
}
