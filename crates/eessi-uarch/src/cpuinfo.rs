//! Raw CPU identification from `/proc/cpuinfo`-style text.
//!
//! Only the first processor block is read; all cores are assumed identical.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{Result, UarchError};
use crate::microarch::GENERIC_VENDOR;

/// Default location of the CPU identification data on Linux.
pub const PROC_CPUINFO: &str = "/proc/cpuinfo";

/// Kernel flag spellings that differ from catalog feature names.
const FLAG_ALIASES: &[(&str, &str)] = &[("pni", "sse3"), ("sha_ni", "sha")];

/// What the host CPU reports about itself, before any catalog matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCpuInfo {
    pub family: String,
    /// Vendor id in catalog spelling ("GenuineIntel", "ARM", "IBM", ...).
    pub cpu_vendor: String,
    pub flags: BTreeSet<String>,
    /// Processor generation (POWER only, 0 elsewhere).
    pub generation: u32,
}

/// CPU family of the running binary, in catalog spelling.
pub fn native_family() -> &'static str {
    match std::env::consts::ARCH {
        "powerpc64" if cfg!(target_endian = "little") => "ppc64le",
        arch => arch,
    }
}

/// Maps an ARM `CPU implementer` code to a vendor name.
pub fn arm_implementer_vendor(code: &str) -> Option<&'static str> {
    let code = code.trim().trim_start_matches("0x").trim_start_matches("0X");
    let value = u32::from_str_radix(code, 16).ok()?;
    let vendor = match value {
        0x41 => "ARM",
        0x42 => "Broadcom",
        0x43 => "Cavium",
        0x46 => "Fujitsu",
        0x48 => "HiSilicon",
        0x4e => "NVIDIA",
        0x50 => "APM",
        0x51 => "Qualcomm",
        0x61 => "Apple",
        _ => return None,
    };
    Some(vendor)
}

/// Read and parse a cpuinfo file.
pub fn read_cpuinfo(path: &Path, family: &str) -> Result<RawCpuInfo> {
    let text = std::fs::read_to_string(path)?;
    parse_cpuinfo(&text, family).map_err(|detail| UarchError::CpuInfo {
        path: path.to_path_buf(),
        detail,
    })
}

/// Parse cpuinfo text for a CPU of the given family.
pub fn parse_cpuinfo(text: &str, family: &str) -> std::result::Result<RawCpuInfo, String> {
    let fields = first_block(text);
    let field = |key: &str| {
        fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    };

    let (cpu_vendor, flags, generation) = match family {
        "x86_64" => {
            let vendor = field("vendor_id").ok_or("no 'vendor_id' line")?;
            let flags = field("flags").ok_or("no 'flags' line")?;
            (vendor.to_string(), split_flags(flags), 0)
        }
        "aarch64" => {
            let vendor = field("CPU implementer")
                .and_then(arm_implementer_vendor)
                .unwrap_or(GENERIC_VENDOR);
            let flags = field("Features").ok_or("no 'Features' line")?;
            (vendor.to_string(), split_flags(flags), 0)
        }
        "ppc64le" => {
            let cpu = field("cpu").ok_or("no 'cpu' line")?;
            let generation = power_generation(cpu)
                .ok_or_else(|| format!("unrecognized POWER processor '{cpu}'"))?;
            ("IBM".to_string(), BTreeSet::new(), generation)
        }
        _ => {
            let flags = field("flags").or_else(|| field("Features")).unwrap_or("");
            (GENERIC_VENDOR.to_string(), split_flags(flags), 0)
        }
    };

    Ok(RawCpuInfo {
        family: family.to_string(),
        cpu_vendor,
        flags,
        generation,
    })
}

/// Key/value pairs of the first processor block.
fn first_block(text: &str) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if fields.is_empty() {
                continue;
            }
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            fields.push((key.trim().to_string(), value.trim().to_string()));
        }
    }
    fields
}

fn split_flags(flags: &str) -> BTreeSet<String> {
    flags
        .split_whitespace()
        .map(|flag| {
            FLAG_ALIASES
                .iter()
                .find(|(kernel, _)| *kernel == flag)
                .map_or(flag, |(_, canonical)| *canonical)
                .to_string()
        })
        .collect()
}

/// `POWER9 (raw), altivec supported` -> 9
fn power_generation(cpu: &str) -> Option<u32> {
    let rest = cpu.trim().strip_prefix("POWER")?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Where [`read_cpuinfo`] looks by default.
pub fn default_cpuinfo_path() -> PathBuf {
    PathBuf::from(PROC_CPUINFO)
}
