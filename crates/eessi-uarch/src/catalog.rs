//! The microarchitecture catalog.
//!
//! Built from validated [`MicroarchEntry`] rows: each node gets its transitive
//! ancestor set and its full (inherited) feature set once, at load time. The
//! catalog is immutable afterwards.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::OnceLock;

use crate::error::{Result, UarchError};
use crate::microarch::{MicroarchEntry, Microarchitecture};
use crate::parse::{load_catalog_toml, parse_catalog_toml, validate_entries, BUILTIN_CATALOG_TOML};

static BUILTIN: OnceLock<Catalog> = OnceLock::new();

/// Read-only table of known microarchitectures.
#[derive(Debug, Clone)]
pub struct Catalog {
    targets: Vec<Microarchitecture>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// The catalog compiled into this crate, parsed on first use.
    pub fn builtin() -> Result<&'static Catalog> {
        if let Some(catalog) = BUILTIN.get() {
            return Ok(catalog);
        }
        let catalog = Self::from_toml_str(BUILTIN_CATALOG_TOML)?;
        Ok(BUILTIN.get_or_init(|| catalog))
    }

    /// Parse and validate a catalog from TOML text.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        Self::from_entries(parse_catalog_toml(toml_str)?)
    }

    /// Load a catalog from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let entries = load_catalog_toml(path)?;
        log::debug!("loaded {} catalog entries from {}", entries.len(), path.display());
        Self::from_entries(entries)
    }

    /// Validate entries and compute ancestor closures and feature sets.
    pub fn from_entries(entries: Vec<MicroarchEntry>) -> Result<Self> {
        validate_entries(&entries).map_err(|issues| UarchError::Validation { issues })?;

        let by_name: HashMap<&str, &MicroarchEntry> =
            entries.iter().map(|e| (e.name.as_str(), e)).collect();
        let mut memo: HashMap<String, Closure> = HashMap::new();
        for entry in &entries {
            closure_of(entry, &by_name, &mut memo);
        }

        let mut targets = Vec::with_capacity(entries.len());
        let mut index = HashMap::with_capacity(entries.len());
        for entry in &entries {
            let closure = memo.remove(&entry.name).unwrap_or_default();
            index.insert(entry.name.clone(), targets.len());
            targets.push(Microarchitecture {
                name: entry.name.clone(),
                family: entry.family.clone(),
                cpu_vendor: entry.vendor.clone(),
                parents: entry.parents.clone(),
                ancestors: closure.ancestors,
                features: closure.features,
                generation: entry.generation,
            });
        }

        Ok(Self { targets, index })
    }

    /// Look up a microarchitecture by name.
    pub fn lookup(&self, name: &str) -> Result<&Microarchitecture> {
        self.get(name).ok_or_else(|| UarchError::UnknownTarget {
            name: name.to_string(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&Microarchitecture> {
        self.index.get(name).map(|&i| &self.targets[i])
    }

    /// Every transitive ancestor of `name`, ordered from least to most specific.
    pub fn ancestors_of(&self, name: &str) -> Result<Vec<&Microarchitecture>> {
        let target = self.lookup(name)?;
        let mut ancestors: Vec<&Microarchitecture> = target
            .ancestors
            .iter()
            .filter_map(|a| self.get(a))
            .collect();
        ancestors.sort_by(|a, b| {
            (a.ancestor_count(), a.feature_count(), &a.name).cmp(&(
                b.ancestor_count(),
                b.feature_count(),
                &b.name,
            ))
        });
        Ok(ancestors)
    }

    /// All targets belonging to `family`, in catalog order.
    pub fn family_members(&self, family: &str) -> impl Iterator<Item = &Microarchitecture> + '_ {
        let family = family.to_string();
        self.targets.iter().filter(move |t| t.family == family)
    }

    /// The root node of `family`.
    pub fn family_root(&self, family: &str) -> Option<&Microarchitecture> {
        self.get(family).filter(|t| t.is_family_root())
    }

    /// Distinct family names, sorted.
    pub fn families(&self) -> Vec<&str> {
        let families: BTreeSet<&str> = self.targets.iter().map(|t| t.family.as_str()).collect();
        families.into_iter().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Microarchitecture> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
struct Closure {
    ancestors: BTreeSet<String>,
    features: BTreeSet<String>,
}

/// Memoized ancestor/feature closure. Entries must already be validated acyclic.
fn closure_of(
    entry: &MicroarchEntry,
    by_name: &HashMap<&str, &MicroarchEntry>,
    memo: &mut HashMap<String, Closure>,
) -> Closure {
    if let Some(done) = memo.get(&entry.name) {
        return done.clone();
    }
    let mut closure = Closure {
        ancestors: BTreeSet::new(),
        features: entry.features.iter().cloned().collect(),
    };
    for parent_name in &entry.parents {
        let Some(parent) = by_name.get(parent_name.as_str()) else {
            continue;
        };
        let inherited = closure_of(parent, by_name, memo);
        closure.ancestors.insert(parent_name.clone());
        closure.ancestors.extend(inherited.ancestors);
        closure.features.extend(inherited.features);
    }
    memo.insert(entry.name.clone(), closure.clone());
    closure
}
