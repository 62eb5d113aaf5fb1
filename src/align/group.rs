//! Grouping runs by a name separator

use std::collections::BTreeMap;

/// Group a run belongs to: the part of `name` before the first occurrence
/// of `key`.
///
/// Without a key (or with an empty one) every run is its own group, and a
/// name that does not contain the key keeps its full name.
#[must_use]
pub fn group_name<'a>(name: &'a str, key: Option<&str>) -> &'a str {
    match key {
        Some(key) if !key.is_empty() => name.find(key).map_or(name, |idx| &name[..idx]),
        _ => name,
    }
}

/// Partition `items` by [`group_name`], keeping member names.
///
/// Groups are ordered by name and members keep the order of `items`, so
/// the result is deterministic for a `BTreeMap` input. Every group has at
/// least one member.
pub fn group_by_key<'a, T>(
    items: impl IntoIterator<Item = (&'a str, T)>,
    key: Option<&str>,
) -> BTreeMap<String, Vec<(&'a str, T)>> {
    let mut groups: BTreeMap<String, Vec<(&'a str, T)>> = BTreeMap::new();
    for (name, item) in items {
        groups
            .entry(group_name(name, key).to_string())
            .or_default()
            .push((name, item));
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_name_splits_on_first_occurrence() {
        assert_eq!(group_name("exp/lr0.1_seed1_seed", Some("_seed")), "exp/lr0.1");
        assert_eq!(group_name("exp/lr0.1/rank3", Some("/rank")), "exp/lr0.1");
    }

    #[test]
    fn test_group_name_without_key_is_identity() {
        assert_eq!(group_name("exp/a", None), "exp/a");
        assert_eq!(group_name("exp/a", Some("")), "exp/a");
        assert_eq!(group_name("exp/a", Some("/seed")), "exp/a");
    }

    #[test]
    fn test_group_by_key_collects_members() {
        let runs = [("a/seed0", 1), ("a/seed1", 2), ("b/seed0", 3)];
        let groups = group_by_key(runs.iter().map(|(n, v)| (*n, *v)), Some("/seed"));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["a"], vec![("a/seed0", 1), ("a/seed1", 2)]);
        assert_eq!(groups["b"], vec![("b/seed0", 3)]);
    }

    #[test]
    fn test_group_by_key_singletons_without_key() {
        let runs = [("a/seed0", ()), ("a/seed1", ())];
        let groups = group_by_key(runs.iter().map(|(n, v)| (*n, *v)), None);
        assert_eq!(groups.len(), 2);
        assert!(groups.values().all(|members| members.len() == 1));
    }
}
