//! Unit-level dependency tracking for incremental builds.

use std::collections::{BTreeSet, HashSet};

use indexmap::{IndexMap, IndexSet};

/// What one compilation unit provides and what it needs, by internal name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct UnitDeps {
    pub(crate) provides: Vec<String>,
    /// Types mentioned by the unit's classes, minus its own.
    pub(crate) references: BTreeSet<String>,
    /// Types whose compile-time constants the unit inlined.
    pub(crate) constant_refs: Vec<String>,
}

impl UnitDeps {
    fn depends_on_any(&self, names: &HashSet<String>) -> bool {
        self.references.iter().any(|name| names.contains(name))
            || self.constant_refs.iter().any(|name| names.contains(name))
    }
}

/// Units that must be rebuilt because a type they use changed, directly or
/// through another invalidated unit. `changed` grows with the names the
/// invalidated units provide. Units in `exclude` are already being rebuilt.
pub(crate) fn invalidate<'a>(
    units: impl IntoIterator<Item = (&'a str, &'a UnitDeps)> + Clone,
    changed: &mut HashSet<String>,
    exclude: &IndexSet<String>,
) -> IndexSet<String> {
    let mut invalidated = IndexSet::new();
    loop {
        let mut progress = false;
        for (name, deps) in units.clone() {
            if exclude.contains(name) || invalidated.contains(name) {
                continue;
            }
            if deps.depends_on_any(changed) {
                invalidated.insert(name.to_string());
                changed.extend(deps.provides.iter().cloned());
                progress = true;
            }
        }
        if !progress {
            return invalidated;
        }
    }
}

/// Marks candidates invalid until every remaining one only references
/// types that are provided by a valid candidate or by `is_published`.
///
/// `invalid` maps unit names to the reason they were dropped; newly dropped
/// units are appended to it.
pub(crate) fn prune_unavailable(
    candidates: &IndexMap<String, UnitDeps>,
    invalid: &mut IndexMap<String, String>,
    is_published: impl Fn(&str) -> bool,
) {
    loop {
        let provided: HashSet<&str> = candidates
            .iter()
            .filter(|(name, _)| !invalid.contains_key(name.as_str()))
            .flat_map(|(_, deps)| deps.provides.iter().map(String::as_str))
            .collect();

        let broken = candidates
            .iter()
            .filter(|(name, _)| !invalid.contains_key(name.as_str()))
            .find_map(|(name, deps)| {
                deps.references
                    .iter()
                    .find(|reference| {
                        !provided.contains(reference.as_str()) && !is_published(reference)
                    })
                    .map(|missing| (name.clone(), missing.clone()))
            });

        match broken {
            Some((name, missing)) => {
                let reason = format!("references unavailable type {}", missing.replace('/', "."));
                invalid.insert(name, reason);
            }
            None => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn deps(provides: &[&str], references: &[&str]) -> UnitDeps {
        UnitDeps {
            provides: provides.iter().map(|name| name.to_string()).collect(),
            references: references.iter().map(|name| name.to_string()).collect(),
            constant_refs: Vec::new(),
        }
    }

    #[test]
    fn invalidation_follows_references_and_constants_transitively() {
        let mut units = IndexMap::new();
        units.insert("a.Base".to_string(), deps(&["a/Base"], &["java/lang/Object"]));
        units.insert("a.Derived".to_string(), deps(&["a/Derived"], &["a/Base"]));
        units.insert("a.User".to_string(), deps(&["a/User"], &["a/Derived"]));
        let mut constants = deps(&["a/Constants"], &[]);
        constants.constant_refs.push("a/Base".to_string());
        units.insert("a.Constants".to_string(), constants);
        units.insert("a.Other".to_string(), deps(&["a/Other"], &["java/lang/Object"]));

        let mut changed: HashSet<String> = ["a/Base".to_string()].into_iter().collect();
        let exclude: IndexSet<String> = ["a.Base".to_string()].into_iter().collect();
        let invalidated = invalidate(
            units.iter().map(|(name, deps)| (name.as_str(), deps)),
            &mut changed,
            &exclude,
        );

        let mut names: Vec<_> = invalidated.into_iter().collect();
        names.sort();
        assert_eq!(names, vec!["a.Constants", "a.Derived", "a.User"]);
        assert!(changed.contains("a/User"));
    }

    #[test]
    fn pruning_is_transitive_but_spares_unrelated_units() {
        let mut candidates = IndexMap::new();
        candidates.insert("p.Good".to_string(), deps(&["p/Good"], &["p/WillGoBad"]));
        candidates.insert("p.WillGoBad".to_string(), deps(&["p/WillGoBad"], &[]));
        candidates.insert("p.AnotherGood".to_string(), deps(&["p/AnotherGood"], &["p/Unmodified"]));

        let mut invalid = IndexMap::new();
        invalid.insert("p.WillGoBad".to_string(), "syntax error".to_string());
        prune_unavailable(&candidates, &mut invalid, |name| name == "p/Unmodified");

        assert_eq!(
            invalid.get("p.Good").map(String::as_str),
            Some("references unavailable type p.WillGoBad")
        );
        assert!(!invalid.contains_key("p.AnotherGood"));
    }
}
