//! Naming policy deciding which directory entries are candidates.
//!
//! Three mutually exclusive regimes share one unconditional first step: names
//! ending in a backup/package-manager suffix are never run.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::types::DirectoryEntry;
use crate::error::RunPartsError;

/// Suffixes excluded in every mode.
pub const IGNORED_SUFFIXES: &[&str] = &[
    "~",
    ",",
    ".disabled",
    ".cfsaved",
    ".rpmsave",
    ".rpmorig",
    ".rpmnew",
    ".swp",
    ",v",
];

/// Additional suffixes excluded under `--lsbsysinit`.
pub const LSB_IGNORED_SUFFIXES: &[&str] = &[".dpkg-old", ".dpkg-dist", ".dpkg-new", ".dpkg-tmp"];

static LSB_ACCEPTED: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // LANANA-assigned LSB hierarchical
        Regex::new(r"^[a-z0-9]+$").unwrap(),
        // LANANA-assigned LSB reserved
        Regex::new(r"^_?([a-z0-9_.]+-)+[a-z0-9]+$").unwrap(),
        // Debian cron script namespace
        Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap(),
    ]
});

/// Which naming regime is active. At most one of LSB or custom can be set;
/// `Configuration::validate` guarantees it before a filter is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterMode {
    Default,
    LsbSysInit,
    Custom(String),
}

#[derive(Debug)]
enum Policy {
    Default,
    LsbSysInit,
    Custom(Regex),
}

/// Compiled naming policy.
#[derive(Debug)]
pub struct NamingFilter {
    policy: Policy,
}

impl NamingFilter {
    /// Build the filter, compiling a custom pattern up front so a malformed
    /// one fails before any directory is read.
    ///
    /// Custom patterns must match the whole file name.
    pub fn new(mode: &FilterMode) -> Result<Self, RunPartsError> {
        let policy = match mode {
            FilterMode::Default => Policy::Default,
            FilterMode::LsbSysInit => Policy::LsbSysInit,
            FilterMode::Custom(pattern) => Policy::Custom(compile_full_match(pattern)?),
        };
        Ok(Self { policy })
    }

    /// Decide whether a scanned entry is a candidate. Directories never are.
    pub fn include(&self, entry: &DirectoryEntry) -> bool {
        if entry.is_dir {
            return false;
        }
        self.include_name(&entry.name())
    }

    /// Name-only part of [`NamingFilter::include`].
    pub fn include_name(&self, name: &str) -> bool {
        if has_any_suffix(name, IGNORED_SUFFIXES) {
            return false;
        }
        match &self.policy {
            Policy::Default => true,
            Policy::LsbSysInit => {
                if has_any_suffix(name, LSB_IGNORED_SUFFIXES) {
                    return false;
                }
                LSB_ACCEPTED.iter().any(|re| re.is_match(name))
            }
            Policy::Custom(re) => re.is_match(name),
        }
    }
}

fn has_any_suffix(name: &str, suffixes: &[&str]) -> bool {
    suffixes.iter().any(|suffix| name.ends_with(suffix))
}

fn compile_full_match(pattern: &str) -> Result<Regex, RunPartsError> {
    let invalid = |source| RunPartsError::Filter {
        pattern: pattern.to_string(),
        source,
    };
    // Validate as written first: wrapping can make an unbalanced pattern
    // like `a)|(b` compile.
    Regex::new(pattern).map_err(invalid)?;
    Regex::new(&format!("^(?:{pattern})$")).map_err(invalid)
}
