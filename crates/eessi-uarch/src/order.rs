//! Compatibility ordering between microarchitectures.
//!
//! `a <= b` holds when `a` is `b` or one of `b`'s ancestors, i.e. binaries
//! built for `a` run on `b`. Nodes on different branches are incomparable.

use std::cmp::Ordering;

use crate::microarch::Microarchitecture;

/// Partial-order comparison. `None` when the two targets are incomparable.
pub fn compare(a: &Microarchitecture, b: &Microarchitecture) -> Option<Ordering> {
    if a.name == b.name {
        Some(Ordering::Equal)
    } else if b.has_ancestor(&a.name) {
        Some(Ordering::Less)
    } else if a.has_ancestor(&b.name) {
        Some(Ordering::Greater)
    } else {
        None
    }
}

/// Whether software built for `candidate` runs on `host`.
pub fn is_compatible(candidate: &Microarchitecture, host: &Microarchitecture) -> bool {
    matches!(
        compare(candidate, host),
        Some(Ordering::Less | Ordering::Equal)
    )
}

/// Total order used to rank targets by specificity.
///
/// An ancestor always has strictly fewer ancestors than its descendants, so
/// this extends the partial order. Equal counts fall back to the name, with
/// the lexicographically smaller name ranked higher.
pub fn specificity_cmp(a: &Microarchitecture, b: &Microarchitecture) -> Ordering {
    a.ancestor_count()
        .cmp(&b.ancestor_count())
        .then_with(|| a.feature_count().cmp(&b.feature_count()))
        .then_with(|| b.name.cmp(&a.name))
}

/// The most specific target of `targets`, if any.
pub fn most_specific<'a, I>(targets: I) -> Option<&'a Microarchitecture>
where
    I: IntoIterator<Item = &'a Microarchitecture>,
{
    targets.into_iter().max_by(|a, b| specificity_cmp(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn get(name: &str) -> &'static Microarchitecture {
        Catalog::builtin().unwrap().lookup(name).unwrap()
    }

    #[test]
    fn ancestors_compare_less() {
        assert_eq!(compare(get("nehalem"), get("broadwell")), Some(Ordering::Less));
        assert_eq!(compare(get("broadwell"), get("nehalem")), Some(Ordering::Greater));
        assert_eq!(compare(get("broadwell"), get("broadwell")), Some(Ordering::Equal));
    }

    #[test]
    fn branches_are_incomparable() {
        assert_eq!(compare(get("zen2"), get("broadwell")), None);
        assert_eq!(compare(get("cooperlake"), get("icelake")), None);
        assert_eq!(compare(get("mic_knl"), get("skylake")), None);
        assert_eq!(compare(get("neoverse_v1"), get("neoverse_v2")), None);
        assert_eq!(compare(get("a64fx"), get("broadwell")), None);
    }

    #[test]
    fn compatibility_follows_ancestry() {
        let host = get("broadwell");
        assert!(is_compatible(get("broadwell"), host));
        assert!(is_compatible(get("ivybridge"), host));
        assert!(is_compatible(get("x86_64_v3"), host));
        assert!(is_compatible(get("x86_64"), host));
        assert!(!is_compatible(get("skylake"), host));
        assert!(!is_compatible(get("cascadelake"), host));
        assert!(!is_compatible(get("zen"), host));
        assert!(!is_compatible(get("x86_64_v4"), host));
    }

    #[test]
    fn icelake_runs_skylake_avx512_builds() {
        let host = get("icelake");
        for name in ["cascadelake", "skylake_avx512", "cannonlake", "skylake"] {
            assert!(is_compatible(get(name), host), "{name}");
        }
        assert!(!is_compatible(get("cooperlake"), host));
        assert!(is_compatible(get("cascadelake"), get("sapphirerapids")));
    }

    #[test]
    fn neoverse_v2_and_n2_descend_from_n1_only() {
        for host in ["neoverse_v2", "neoverse_n2"] {
            assert!(is_compatible(get("neoverse_n1"), get(host)), "{host}");
            assert!(is_compatible(get("armv9.0a"), get(host)), "{host}");
            assert!(!is_compatible(get("neoverse_v1"), get(host)), "{host}");
        }
        assert!(!is_compatible(get("x86_64_v4"), get("cannonlake")));
    }

    #[test]
    fn most_specific_prefers_deeper_targets() {
        let picked = most_specific([get("nehalem"), get("ivybridge"), get("sandybridge")]).unwrap();
        assert_eq!(picked.name, "ivybridge");
        let picked = most_specific([get("x86_64_v3"), get("ivybridge")]).unwrap();
        assert_eq!(picked.name, "ivybridge");
        assert!(most_specific(std::iter::empty()).is_none());
    }

    #[test]
    fn specificity_extends_partial_order() {
        let catalog = Catalog::builtin().unwrap();
        for a in catalog.iter() {
            for b in catalog.iter() {
                if compare(a, b) == Some(Ordering::Less) {
                    assert_eq!(specificity_cmp(a, b), Ordering::Less, "{} vs {}", a.name, b.name);
                }
            }
        }
    }

    #[test]
    fn ties_break_on_name() {
        let mut a = get("zen2").clone();
        let mut b = a.clone();
        a.name = "alpha".into();
        b.name = "beta".into();
        assert_eq!(most_specific([&a, &b]).unwrap().name, "alpha");
        assert_eq!(most_specific([&b, &a]).unwrap().name, "alpha");
    }
}
