//! Error types for catalog and host detection operations.

use std::path::PathBuf;

use crate::parse::ValidationIssue;

/// Errors that can occur while loading the catalog or identifying the host.
#[derive(Debug, thiserror::Error)]
pub enum UarchError {
    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error reading a catalog or cpuinfo file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog file not found.
    #[error("catalog file not found: {}", path.display())]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// The catalog failed structural validation.
    #[error("invalid microarchitecture catalog: {}", format_issues(issues))]
    Validation {
        /// Every problem found, in catalog order.
        issues: Vec<ValidationIssue>,
    },

    /// Name not present in the catalog.
    #[error("unknown microarchitecture \"{name}\"")]
    UnknownTarget {
        /// The name that was looked up.
        name: String,
    },

    /// The catalog has no entries for the host's CPU family.
    #[error("unsupported CPU family \"{family}\"")]
    UnsupportedFamily {
        /// Family name as detected or configured.
        family: String,
    },

    /// The cpuinfo source could not be interpreted.
    #[error("cannot read CPU identification from {}: {detail}", path.display())]
    CpuInfo {
        /// Where the cpuinfo data came from.
        path: PathBuf,
        /// What was missing or malformed.
        detail: String,
    },
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for catalog and host operations.
pub type Result<T> = std::result::Result<T, UarchError>;
