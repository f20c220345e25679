//! Installation tree layout.
//!
//! ```text
//! <prefix>/software/<os>/          installation root
//!   x86_64/
//!     generic/
//!     intel/{haswell,skylake_avx512,...}/
//!     amd/{zen2,zen3,...}/
//!   aarch64/
//!     generic/
//!     neoverse_n1/
//! ```
//!
//! x86_64 targets live under a vendor directory, with `generic` as a sibling
//! of the vendors. Every other family is a flat list of targets.

use std::path::{Path, PathBuf};

use eessi_uarch::HostIdentity;
use serde::Serialize;

use crate::error::{ResolveError, Result};

/// Directory name of the vendor-neutral build of a family.
pub const GENERIC: &str = "generic";

/// The only family whose targets are grouped by vendor.
pub const X86_64: &str = "x86_64";

/// Name of the software layer directory for an operating system.
pub fn os_subdir(os: &str) -> Option<&'static str> {
    match os {
        "linux" => Some("linux"),
        "macos" => Some("macos"),
        _ => None,
    }
}

/// `<prefix>/software/<os>` for the given operating system.
pub fn software_layer(prefix: &Path, os: &str) -> Result<PathBuf> {
    let os_dir = os_subdir(os).ok_or_else(|| ResolveError::UnsupportedOs { os: os.to_string() })?;
    Ok(prefix.join("software").join(os_dir))
}

/// A target directory found in the installation tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Candidate {
    /// Leaf directory name.
    pub name: String,
    /// Vendor directory it was listed under, if any.
    pub vendor: Option<String>,
}

impl Candidate {
    pub fn is_generic(&self) -> bool {
        self.name == GENERIC
    }

    /// Path of this candidate relative to the installation root.
    pub fn subdir(&self, family: &str) -> String {
        match &self.vendor {
            Some(vendor) => format!("{family}/{vendor}/{}", self.name),
            None => format!("{family}/{}", self.name),
        }
    }
}

/// Targets available for the host's family (and vendor, on x86_64).
///
/// Sorted by name so that resolution never depends on directory order.
pub fn scan_candidates(root: &Path, host: &HostIdentity) -> Result<Vec<Candidate>> {
    let family_dir = root.join(&host.family);
    let mut candidates = Vec::new();

    if host.family == X86_64 {
        if let Some(vendor) = &host.vendor {
            for name in list_dirs(&family_dir.join(vendor))? {
                candidates.push(Candidate {
                    name,
                    vendor: Some(vendor.clone()),
                });
            }
        }
        if family_dir.join(GENERIC).is_dir() {
            candidates.push(Candidate {
                name: GENERIC.to_string(),
                vendor: None,
            });
        }
    } else {
        for name in list_dirs(&family_dir)? {
            candidates.push(Candidate { name, vendor: None });
        }
    }

    candidates.sort();
    log::debug!(
        "{} candidate(s) under {}: {}",
        candidates.len(),
        family_dir.display(),
        candidates
            .iter()
            .map(|c| c.subdir(&host.family))
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(candidates)
}

/// Names of the non-hidden subdirectories of `dir`; empty if `dir` does not exist.
fn list_dirs(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let listing_error = |source| ResolveError::Listing {
        path: dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(listing_error)? {
        let entry = entry.map_err(listing_error)?;
        if !entry.path().is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) if name.starts_with('.') => {}
            Ok(name) => names.push(name),
            Err(raw) => log::debug!("skipping non UTF-8 entry {raw:?} in {}", dir.display()),
        }
    }
    Ok(names)
}
