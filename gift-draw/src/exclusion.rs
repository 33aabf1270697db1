use crate::roster::Roster;
use std::collections::{BTreeMap, BTreeSet};

/// Per-giver set of recipients that giver must not draw.
///
/// Keyed by every roster name up front, so a lookup miss means the name is not on the
/// roster at all.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    map: BTreeMap<String, BTreeSet<String>>,
}

impl ExclusionSet {
    pub fn for_roster(roster: &Roster) -> Self {
        Self::for_names(roster.participants.iter().map(|p| p.name.as_str()))
    }

    pub fn for_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let map = names
            .into_iter()
            .map(|n| (n.to_string(), BTreeSet::new()))
            .collect();
        Self { map }
    }

    pub fn knows(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Returns `false` if the pair was already excluded or the giver is unknown.
    pub fn insert(&mut self, giver: &str, recipient: &str) -> bool {
        match self.map.get_mut(giver) {
            Some(set) => set.insert(recipient.to_string()),
            None => false,
        }
    }

    pub fn insert_mutual(&mut self, a: &str, b: &str) {
        self.insert(a, b);
        self.insert(b, a);
    }

    pub fn is_excluded(&self, giver: &str, recipient: &str) -> bool {
        self.map
            .get(giver)
            .is_some_and(|set| set.contains(recipient))
    }

    pub fn excluded_for(&self, giver: &str) -> Option<&BTreeSet<String>> {
        self.map.get(giver)
    }

    /// Adds the roster's spouse or family exclusions.
    pub fn apply_static_rules(&mut self, roster: &Roster) {
        for (a, b) in roster.static_pairs() {
            self.insert_mutual(a, b);
        }
    }

    /// Number of excluded (giver, recipient) pairs.
    pub fn pair_count(&self) -> usize {
        self.map.values().map(BTreeSet::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_reports_new_pairs_only() {
        let mut ex = ExclusionSet::for_names(["A", "B"]);
        assert!(ex.insert("A", "B"));
        assert!(!ex.insert("A", "B"));
        assert!(!ex.insert("Z", "B"));
        assert!(ex.is_excluded("A", "B"));
        assert!(!ex.is_excluded("B", "A"));
        assert_eq!(ex.pair_count(), 1);
    }

    #[test]
    fn adult_spouses_are_mutually_excluded() {
        let roster = Roster::adult();
        let mut ex = ExclusionSet::for_roster(&roster);
        ex.apply_static_rules(&roster);

        for pair in roster.participants.chunks_exact(2) {
            assert!(ex.is_excluded(&pair[0].name, &pair[1].name));
            assert!(ex.is_excluded(&pair[1].name, &pair[0].name));
        }
        assert!(!ex.is_excluded("Marian", "Dave"));
        assert_eq!(ex.pair_count(), 16);
    }

    #[test]
    fn junior_family_members_are_mutually_excluded() {
        let roster = Roster::junior();
        let mut ex = ExclusionSet::for_roster(&roster);
        ex.apply_static_rules(&roster);

        for a in &roster.participants {
            for b in &roster.participants {
                let same = a.name != b.name && a.family == b.family;
                assert_eq!(ex.is_excluded(&a.name, &b.name), same, "{} -> {}", a.name, b.name);
            }
        }
        assert!(ex.excluded_for("Lucy").unwrap().is_empty());
    }
}
