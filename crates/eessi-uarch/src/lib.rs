//! CPU microarchitecture catalog and host identification for EESSI.
//!
//! The catalog is a DAG per CPU family: each target lists the targets whose
//! binaries it can run, rooted at a vendor-neutral node named after the
//! family (`x86_64`, `aarch64`, `ppc64le`).
//!
//! - **Catalog:** embedded TOML table, validated and closed over ancestors
//! - **Ordering:** partial-order comparison and specificity ranking
//! - **Host:** cpuinfo parsing and matching against the catalog

pub mod catalog;
pub mod cpuinfo;
pub mod error;
pub mod host;
pub mod microarch;
pub mod order;
pub mod parse;

pub use catalog::Catalog;
pub use error::{Result, UarchError};
pub use host::{CpuInfoDetector, FixedHost, HostDetector, HostIdentity};
pub use microarch::{MicroarchEntry, Microarchitecture};
