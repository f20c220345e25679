//! Software subdirectory resolution for EESSI installation trees.
//!
//! Given an installation root and the host CPU, picks the subdirectory built
//! for the most specific microarchitecture the host can run.
//!
//! - **Layout:** where targets live under `<prefix>/software/<os>`
//! - **Resolution:** filtering and ranking the available targets

pub mod error;
pub mod layout;
pub mod resolution;

pub use error::{ResolveError, Result};
pub use layout::{scan_candidates, software_layer, Candidate};
pub use resolution::{Resolution, Resolver, Selection};
