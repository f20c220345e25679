//! Microarchitecture model.
//!
//! A [`MicroarchEntry`] is one row of the catalog as written in TOML. A
//! [`Microarchitecture`] is the same node after the catalog has resolved its
//! ancestor closure and its full feature set.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Vendor string used for vendor-neutral targets (family roots, ISA levels).
pub const GENERIC_VENDOR: &str = "generic";

/// Maps a CPU vendor id to the vendor component of an installation path.
///
/// Only x86_64 vendors have a directory level of their own.
pub fn path_vendor(cpu_vendor: &str) -> Option<&'static str> {
    match cpu_vendor {
        "GenuineIntel" => Some("intel"),
        "AuthenticAMD" => Some("amd"),
        _ => None,
    }
}

/// A catalog row as stored in TOML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MicroarchEntry {
    /// Target name (e.g., "haswell", "neoverse_n1").
    pub name: String,
    /// CPU family (e.g., "x86_64", "aarch64").
    pub family: String,
    /// Vendor id as reported by the CPU, or "generic".
    pub vendor: String,
    /// Direct parents; binaries built for any of them run on this target.
    #[serde(default)]
    pub parents: Vec<String>,
    /// Features added on top of the parents.
    #[serde(default)]
    pub features: Vec<String>,
    /// Processor generation (POWER targets only).
    #[serde(default)]
    pub generation: u32,
}

/// A resolved catalog node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Microarchitecture {
    pub name: String,
    pub family: String,
    /// Raw vendor id ("GenuineIntel", "ARM", "generic", ...).
    pub cpu_vendor: String,
    pub parents: Vec<String>,
    /// Names of every transitive parent.
    pub ancestors: BTreeSet<String>,
    /// Full feature set, inherited features included.
    pub features: BTreeSet<String>,
    pub generation: u32,
}

impl Microarchitecture {
    /// Installation-tree vendor component (`intel`, `amd`), if any.
    pub fn vendor(&self) -> Option<&'static str> {
        path_vendor(&self.cpu_vendor)
    }

    /// Whether this is the root of its family.
    pub fn is_family_root(&self) -> bool {
        self.name == self.family
    }

    pub fn is_vendor_neutral(&self) -> bool {
        self.cpu_vendor == GENERIC_VENDOR
    }

    pub fn ancestor_count(&self) -> usize {
        self.ancestors.len()
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Whether `name` is one of this target's ancestors.
    pub fn has_ancestor(&self, name: &str) -> bool {
        self.ancestors.contains(name)
    }
}
