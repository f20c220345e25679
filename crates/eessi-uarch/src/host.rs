//! Host identity and detection.
//!
//! A [`HostDetector`] yields the `(family, vendor, name)` triple describing the
//! machine. [`CpuInfoDetector`] derives it from cpuinfo text and the catalog:
//! the host is the most specific catalog target whose vendor and feature set
//! the CPU satisfies.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::catalog::Catalog;
use crate::cpuinfo::{default_cpuinfo_path, native_family, read_cpuinfo, RawCpuInfo};
use crate::error::{Result, UarchError};
use crate::microarch::{path_vendor, Microarchitecture};
use crate::order::most_specific;

/// The `(family, vendor, name)` triple of a host CPU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostIdentity {
    pub family: String,
    /// Installation-tree vendor (`intel`, `amd`), if the family has one.
    pub vendor: Option<String>,
    pub name: String,
}

impl HostIdentity {
    pub fn new(family: impl Into<String>, vendor: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            vendor: vendor.map(str::to_string),
            name: name.into(),
        }
    }

    /// The host's own software subdirectory, e.g. `x86_64/intel/broadwell`.
    pub fn subdir(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for HostIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.vendor {
            Some(vendor) => write!(f, "{}/{}/{}", self.family, vendor, self.name),
            None => write!(f, "{}/{}", self.family, self.name),
        }
    }
}

/// Source of the host identity.
pub trait HostDetector {
    /// Identify the host CPU.
    fn detect(&self) -> Result<HostIdentity>;
}

/// A detector that always reports the same host.
#[derive(Debug, Clone)]
pub struct FixedHost(pub HostIdentity);

impl HostDetector for FixedHost {
    fn detect(&self) -> Result<HostIdentity> {
        Ok(self.0.clone())
    }
}

/// Detects the host from a cpuinfo file matched against the catalog.
#[derive(Debug, Clone)]
pub struct CpuInfoDetector<'c> {
    catalog: &'c Catalog,
    path: PathBuf,
    family: String,
}

impl<'c> CpuInfoDetector<'c> {
    /// Read `/proc/cpuinfo`, assuming the family of the running binary.
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            path: default_cpuinfo_path(),
            family: native_family().to_string(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = family.into();
        self
    }
}

impl HostDetector for CpuInfoDetector<'_> {
    fn detect(&self) -> Result<HostIdentity> {
        let raw = read_cpuinfo(&self.path, &self.family)?;
        let target = detect_microarchitecture(self.catalog, &raw)?;
        log::debug!(
            "host CPU: vendor {}, {} flags -> {}",
            raw.cpu_vendor,
            raw.flags.len(),
            target.name
        );
        Ok(HostIdentity::new(
            raw.family.as_str(),
            path_vendor(&raw.cpu_vendor),
            target.name.as_str(),
        ))
    }
}

/// Whether a CPU reporting `raw` can run code built for `target`.
pub fn satisfies(raw: &RawCpuInfo, target: &Microarchitecture) -> bool {
    target.family == raw.family
        && (target.is_vendor_neutral() || target.cpu_vendor == raw.cpu_vendor)
        && target.generation <= raw.generation
        && target.features.is_subset(&raw.flags)
}

/// The most specific catalog target `raw` satisfies.
///
/// The family root has no requirements, so any CPU of a cataloged family
/// matches at least that.
pub fn detect_microarchitecture<'c>(
    catalog: &'c Catalog,
    raw: &RawCpuInfo,
) -> Result<&'c Microarchitecture> {
    most_specific(
        catalog
            .family_members(&raw.family)
            .filter(|t| satisfies(raw, t)),
    )
    .ok_or_else(|| UarchError::UnsupportedFamily {
        family: raw.family.clone(),
    })
}
