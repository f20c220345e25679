//! Resolver error types.

use std::path::PathBuf;

use eessi_uarch::UarchError;

/// Errors that end a resolution.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The installation root, or its directory for the host's CPU family, is missing.
    #[error("Specified prefix \"{}\" does not exist!", path.display())]
    InstallationRootNotFound { path: PathBuf },

    /// The detected host has no catalog entry, so nothing can be compared to it.
    #[error("Host CPU microarchitecture \"{name}\" is not known")]
    UnknownHostTarget { name: String },

    /// Nothing installed runs on the host, not even a generic build.
    #[error("No compatible targets found for {host}")]
    NoCompatibleTarget { host: String },

    /// The operating system has no software layer in the prefix layout.
    #[error("unsupported operating system \"{os}\"")]
    UnsupportedOs { os: String },

    /// Failure listing a directory of the installation tree.
    #[error("cannot list {}: {source}", path.display())]
    Listing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Host detection or catalog failure.
    #[error(transparent)]
    Uarch(#[from] UarchError),
}

/// Result type alias for resolver operations.
pub type Result<T> = std::result::Result<T, ResolveError>;
