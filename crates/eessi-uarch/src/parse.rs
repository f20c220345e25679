//! TOML parsing and validation for microarchitecture catalogs.
//!
//! A catalog file is a list of `[[microarchitecture]]` tables. The built-in
//! catalog ships inside the crate; an alternative one can be loaded from disk.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, UarchError};
use crate::microarch::{MicroarchEntry, GENERIC_VENDOR};

/// Raw catalog text compiled into the crate.
pub const BUILTIN_CATALOG_TOML: &str = include_str!("../data/microarchitectures.toml");

/// A validation issue found in a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Name of the offending entry.
    pub entry: String,
    /// Human-readable description.
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(rename = "microarchitecture", default)]
    entries: Vec<MicroarchEntry>,
}

/// Load catalog entries from a TOML file.
pub fn load_catalog_toml(path: &Path) -> Result<Vec<MicroarchEntry>> {
    if !path.exists() {
        return Err(UarchError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    parse_catalog_toml(&content)
}

/// Parse catalog entries from a TOML string.
pub fn parse_catalog_toml(toml_str: &str) -> Result<Vec<MicroarchEntry>> {
    let file: CatalogFile = toml::from_str(toml_str)?;
    Ok(file.entries)
}

/// Validate catalog entries for structural correctness.
///
/// Returns `Ok(())` if the entries form one acyclic graph per family, each
/// rooted at an entry named after the family.
pub fn validate_entries(entries: &[MicroarchEntry]) -> std::result::Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    let mut by_name: HashMap<&str, &MicroarchEntry> = HashMap::new();

    // 1. Names are unique
    for entry in entries {
        if by_name.insert(entry.name.as_str(), entry).is_some() {
            issues.push(issue(entry, format!("duplicate microarchitecture '{}'", entry.name)));
        }
    }

    for entry in entries {
        let is_root = entry.name == entry.family;

        // 2. Family roots have no parents and no vendor
        if is_root {
            if !entry.parents.is_empty() {
                issues.push(issue(
                    entry,
                    format!("family root '{}' must not have parents", entry.name),
                ));
            }
            if entry.vendor != GENERIC_VENDOR {
                issues.push(issue(
                    entry,
                    format!(
                        "family root '{}' has vendor '{}', expected '{GENERIC_VENDOR}'",
                        entry.name, entry.vendor
                    ),
                ));
            }
        } else if entry.parents.is_empty() {
            // 3. Everything else hangs off something
            issues.push(issue(
                entry,
                format!("'{}' has no parents and is not a family root", entry.name),
            ));
        }

        // 4. Parents exist and share the family
        for parent in &entry.parents {
            match by_name.get(parent.as_str()) {
                None => issues.push(issue(
                    entry,
                    format!("'{}' references unknown parent '{parent}'", entry.name),
                )),
                Some(p) if p.family != entry.family => issues.push(issue(
                    entry,
                    format!(
                        "'{}' ({}) has parent '{parent}' from family {}",
                        entry.name, entry.family, p.family
                    ),
                )),
                Some(_) => {}
            }
        }
    }

    // 5. Every family has its root
    let families: HashSet<&str> = entries.iter().map(|e| e.family.as_str()).collect();
    let mut missing: Vec<&str> = families
        .into_iter()
        .filter(|f| by_name.get(f).map_or(true, |e| e.family != *f))
        .collect();
    missing.sort_unstable();
    for family in missing {
        issues.push(ValidationIssue {
            entry: family.to_string(),
            message: format!("family '{family}' has no root entry named '{family}'"),
        });
    }

    // 6. No cycles
    for name in find_cycles(entries) {
        issues.push(ValidationIssue {
            message: format!("parent cycle through '{name}'"),
            entry: name,
        });
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

fn issue(entry: &MicroarchEntry, message: String) -> ValidationIssue {
    ValidationIssue {
        entry: entry.name.clone(),
        message,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Names of entries at which a back edge closes a cycle.
fn find_cycles(entries: &[MicroarchEntry]) -> Vec<String> {
    let parents: BTreeMap<&str, &[String]> = entries
        .iter()
        .map(|e| (e.name.as_str(), e.parents.as_slice()))
        .collect();
    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut cycles = Vec::new();

    for &start in parents.keys() {
        if marks.contains_key(start) {
            continue;
        }
        // Iterative DFS: (node, index of next parent to visit)
        let mut stack: Vec<(&str, usize)> = vec![(start, 0)];
        marks.insert(start, Mark::Visiting);
        while let Some((node, next)) = stack.pop() {
            let node_parents = parents.get(node).copied().unwrap_or(&[]);
            if next < node_parents.len() {
                stack.push((node, next + 1));
                let parent = node_parents[next].as_str();
                if !parents.contains_key(parent) {
                    continue;
                }
                match marks.get(parent) {
                    Some(Mark::Visiting) => cycles.push(parent.to_string()),
                    Some(Mark::Done) => {}
                    None => {
                        marks.insert(parent, Mark::Visiting);
                        stack.push((parent, 0));
                    }
                }
            } else {
                marks.insert(node, Mark::Done);
            }
        }
    }
    cycles
}
