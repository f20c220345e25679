//! Selection of the best software subdirectory for a host.
//!
//! Only targets the host can run are eligible: the host's own target or one
//! of its catalog ancestors. Among those, the most specific wins. `generic`
//! is the fallback when no named target qualifies.

use std::path::Path;

use eessi_uarch::order::{is_compatible, specificity_cmp};
use eessi_uarch::{Catalog, HostDetector, HostIdentity, Microarchitecture};
use serde::Serialize;

use crate::error::{ResolveError, Result};
use crate::layout::{scan_candidates, Candidate, GENERIC};

/// How the resulting subdirectory was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Selection {
    /// Taken verbatim from the override.
    Override,
    /// `generic` was asked for explicitly.
    GenericRequested,
    /// Best compatible named target.
    Matched,
    /// No named target was compatible; `generic` was available.
    GenericFallback,
}

/// Outcome of a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Subdirectory relative to the installation root, e.g. `x86_64/intel/haswell`.
    pub subdir: String,
    pub selection: Selection,
    /// Host identity; absent when the override bypassed detection.
    pub host: Option<HostIdentity>,
    /// Every candidate found in the installation tree.
    pub candidates: Vec<String>,
    /// Candidates dropped because the catalog does not know them.
    pub ignored: Vec<String>,
}

impl Resolution {
    /// A resolution that returns `subdir` verbatim, with no detection or listing.
    pub fn overridden(subdir: impl Into<String>) -> Self {
        Self::new(subdir.into(), Selection::Override, None)
    }

    fn new(subdir: String, selection: Selection, host: Option<HostIdentity>) -> Self {
        Self {
            subdir,
            selection,
            host,
            candidates: Vec::new(),
            ignored: Vec::new(),
        }
    }
}

/// Resolves software subdirectories against a catalog and a host detector.
pub struct Resolver<'a> {
    catalog: &'a Catalog,
    detector: &'a dyn HostDetector,
    override_subdir: Option<String>,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a Catalog, detector: &'a dyn HostDetector) -> Self {
        Self {
            catalog,
            detector,
            override_subdir: None,
        }
    }

    /// Subdirectory to return verbatim instead of resolving. Empty means unset.
    pub fn with_override(mut self, subdir: Option<String>) -> Self {
        self.override_subdir = subdir.filter(|s| !s.is_empty());
        self
    }

    /// Pick the best subdirectory of `root` for the host.
    ///
    /// With `generic`, returns `<family>/generic` without looking at the
    /// available targets.
    pub fn resolve(&self, root: &Path, generic: bool) -> Result<Resolution> {
        if let Some(subdir) = &self.override_subdir {
            log::info!("using override {subdir}");
            return Ok(Resolution::overridden(subdir.as_str()));
        }

        if !root.is_dir() {
            return Err(ResolveError::InstallationRootNotFound {
                path: root.to_path_buf(),
            });
        }

        let host = self.detector.detect()?;
        log::info!("host CPU is {host}");

        let family_dir = root.join(&host.family);
        if !family_dir.is_dir() {
            return Err(ResolveError::InstallationRootNotFound { path: family_dir });
        }

        if generic {
            let subdir = format!("{}/{GENERIC}", host.family);
            return Ok(Resolution::new(subdir, Selection::GenericRequested, Some(host)));
        }

        let candidates = scan_candidates(root, &host)?;
        if candidates.is_empty() {
            return Err(ResolveError::NoCompatibleTarget {
                host: host.subdir(),
            });
        }

        let mut generic_candidate: Option<&Candidate> = None;
        let mut named: Vec<(&Candidate, &Microarchitecture)> = Vec::new();
        let mut ignored = Vec::new();
        for candidate in &candidates {
            if candidate.is_generic() {
                generic_candidate.get_or_insert(candidate);
                continue;
            }
            match self.catalog.get(&candidate.name) {
                Some(uarch) => named.push((candidate, uarch)),
                None => {
                    log::warn!("Ignoring unknown target \"{}\"", candidate.name);
                    ignored.push(candidate.name.clone());
                }
            }
        }

        let host_uarch =
            self.catalog
                .get(&host.name)
                .ok_or_else(|| ResolveError::UnknownHostTarget {
                    name: host.name.clone(),
                })?;

        let best = named
            .iter()
            .filter(|(_, uarch)| is_compatible(uarch, host_uarch))
            .max_by(|(_, a), (_, b)| specificity_cmp(a, b));

        let (subdir, selection) = match (best, generic_candidate) {
            (Some((candidate, uarch)), _) => {
                log::debug!(
                    "selected {} ({} ancestors, {} features)",
                    uarch.name,
                    uarch.ancestor_count(),
                    uarch.feature_count()
                );
                (candidate.subdir(&host.family), Selection::Matched)
            }
            (None, Some(generic)) => {
                log::debug!("no named target runs on {}, using generic", host.name);
                (generic.subdir(&host.family), Selection::GenericFallback)
            }
            (None, None) => {
                return Err(ResolveError::NoCompatibleTarget {
                    host: host.subdir(),
                })
            }
        };

        let candidates = candidates.iter().map(|c| c.subdir(&host.family)).collect();
        Ok(Resolution {
            subdir,
            selection,
            host: Some(host),
            candidates,
            ignored,
        })
    }
}
