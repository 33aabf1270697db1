use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("roster '{0}' has no participants")]
    Empty(String),
    #[error("participant name {0:?} is empty or contains whitespace")]
    InvalidName(String),
    #[error("participant '{0}' appears more than once")]
    DuplicateName(String),
    #[error("wildcard '{0}' is not on the roster")]
    UnknownWildcard(String),
    #[error("failed to read roster file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse roster file {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// How the roster itself rules out matches, before any history is consulted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaticRule {
    /// Spouses sit next to each other: (0,1), (2,3), ...
    AdjacentPairs,
    /// Participants sharing a family tag never draw each other.
    FamilyGroups,
    None,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<u32>,
}

impl Participant {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            family: None,
        }
    }

    pub fn in_family(name: &str, family: u32) -> Self {
        Self {
            name: name.to_string(),
            family: Some(family),
        }
    }
}

/// Participant exempt from receiving a gift while single mode is on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wildcard {
    pub name: String,
    /// Environment variable that switches single mode on.
    pub env_var: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Roster {
    pub label: String,
    /// Result files are named `<file_stem>_<YYYY>.txt`.
    pub file_stem: String,
    pub rule: StaticRule,
    pub participants: Vec<Participant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wildcard: Option<Wildcard>,
}

impl Roster {
    pub fn new(
        label: &str,
        file_stem: &str,
        rule: StaticRule,
        participants: Vec<Participant>,
        wildcard: Option<Wildcard>,
    ) -> Result<Self, RosterError> {
        let roster = Self {
            label: label.to_string(),
            file_stem: file_stem.to_string(),
            rule,
            participants,
            wildcard,
        };
        roster.validate()?;
        Ok(roster)
    }

    /// Adult exchange. Names are arranged so that spouses are adjacent.
    pub fn adult() -> Self {
        let names = [
            "Jim", "Marian", "Dave", "Kim", "Lisa", "Mike", "Matt", "Heidi", "Mark", "Amanda",
            "Rose", "Jason", "Julie", "Ryan", "Gina", "Gman",
        ];
        Self {
            label: "adult".to_string(),
            file_stem: "dowling_xmas".to_string(),
            rule: StaticRule::AdjacentPairs,
            participants: names.iter().map(|n| Participant::new(n)).collect(),
            wildcard: Some(Wildcard {
                name: "Gman".to_string(),
                env_var: "GINA_IS_SINGLE".to_string(),
            }),
        }
    }

    /// Junior exchange, grouped by family.
    pub fn junior() -> Self {
        let families: [(u32, &[&str]); 7] = [
            (1, &["Kenzie", "Avery", "Alyssa"]),
            (2, &["Josie", "Zeke", "Luke", "Gabe", "Isaac"]),
            (3, &["Cole", "Gabby"]),
            (4, &["Aidan", "Merrick", "Xander", "Marshall"]),
            (5, &["Abbey", "Jacob", "Gracie", "Lane", "Zack"]),
            (6, &["Cash", "Jack", "Henry"]),
            (7, &["Lucy"]),
        ];
        let participants = families
            .iter()
            .flat_map(|(family, names)| {
                names
                    .iter()
                    .map(move |n| Participant::in_family(n, *family))
            })
            .collect();
        Self {
            label: "junior".to_string(),
            file_stem: "jr_dowling_xmas".to_string(),
            rule: StaticRule::FamilyGroups,
            participants,
            wildcard: None,
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self, RosterError> {
        let text = std::fs::read_to_string(path).map_err(|source| RosterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let roster: Roster = serde_json::from_str(&text).map_err(|source| RosterError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        roster.validate()?;
        Ok(roster)
    }

    pub fn validate(&self) -> Result<(), RosterError> {
        if self.participants.is_empty() {
            return Err(RosterError::Empty(self.label.clone()));
        }
        let mut seen = HashSet::new();
        for p in &self.participants {
            if p.name.is_empty() || p.name.chars().any(char::is_whitespace) {
                return Err(RosterError::InvalidName(p.name.clone()));
            }
            if !seen.insert(p.name.as_str()) {
                return Err(RosterError::DuplicateName(p.name.clone()));
            }
        }
        if let Some(wc) = &self.wildcard {
            if !seen.contains(wc.name.as_str()) {
                return Err(RosterError::UnknownWildcard(wc.name.clone()));
            }
        }
        Ok(())
    }

    pub fn names(&self) -> Vec<String> {
        self.participants.iter().map(|p| p.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn wildcard_name(&self) -> Option<&str> {
        self.wildcard.as_ref().map(|w| w.name.as_str())
    }

    pub fn file_name(&self, year: i32) -> String {
        format!("{}_{:04}.txt", self.file_stem, year)
    }

    pub fn file_path(&self, dir: &Path, year: i32) -> PathBuf {
        dir.join(self.file_name(year))
    }

    /// Unordered pairs ruled out by [`StaticRule`], each listed once.
    pub fn static_pairs(&self) -> Vec<(&str, &str)> {
        match self.rule {
            StaticRule::AdjacentPairs => self
                .participants
                .chunks_exact(2)
                .map(|pair| (pair[0].name.as_str(), pair[1].name.as_str()))
                .collect(),
            StaticRule::FamilyGroups => {
                let mut pairs = Vec::new();
                for (i, a) in self.participants.iter().enumerate() {
                    for b in &self.participants[i + 1..] {
                        if a.family.is_some() && a.family == b.family {
                            pairs.push((a.name.as_str(), b.name.as_str()));
                        }
                    }
                }
                pairs
            }
            StaticRule::None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_rosters_are_valid() {
        Roster::adult().validate().unwrap();
        Roster::junior().validate().unwrap();
        assert_eq!(Roster::adult().len(), 16);
        assert_eq!(Roster::junior().len(), 23);
    }

    #[test]
    fn adult_pairs_are_adjacent() {
        let roster = Roster::adult();
        let pairs = roster.static_pairs();
        assert_eq!(pairs.len(), 8);
        assert_eq!(pairs[0], ("Jim", "Marian"));
        assert_eq!(pairs[7], ("Gina", "Gman"));
    }

    #[test]
    fn odd_participant_stays_unpaired() {
        let roster = Roster::new(
            "odd",
            "odd",
            StaticRule::AdjacentPairs,
            vec![Participant::new("A"), Participant::new("B"), Participant::new("C")],
            None,
        )
        .unwrap();
        assert_eq!(roster.static_pairs(), vec![("A", "B")]);
    }

    #[test]
    fn junior_pairs_follow_families() {
        let roster = Roster::junior();
        let pairs = roster.static_pairs();
        // C(3,2)+C(5,2)+C(2,2)+C(4,2)+C(5,2)+C(3,2)+0
        assert_eq!(pairs.len(), 3 + 10 + 1 + 6 + 10 + 3);
        assert!(pairs.contains(&("Cole", "Gabby")));
        assert!(!pairs.iter().any(|(a, b)| *a == "Lucy" || *b == "Lucy"));
    }

    #[test]
    fn file_name_embeds_four_digit_year() {
        assert_eq!(Roster::adult().file_name(2024), "dowling_xmas_2024.txt");
        assert_eq!(Roster::junior().file_name(2024), "jr_dowling_xmas_2024.txt");
    }

    #[test]
    fn rejects_bad_rosters() {
        let dup = Roster::new(
            "dup",
            "dup",
            StaticRule::None,
            vec![Participant::new("A"), Participant::new("A")],
            None,
        );
        assert!(matches!(dup, Err(RosterError::DuplicateName(n)) if n == "A"));

        let spaced = Roster::new(
            "sp",
            "sp",
            StaticRule::None,
            vec![Participant::new("Mary Ann")],
            None,
        );
        assert!(matches!(spaced, Err(RosterError::InvalidName(_))));

        let empty = Roster::new("e", "e", StaticRule::None, vec![], None);
        assert!(matches!(empty, Err(RosterError::Empty(_))));

        let wc = Roster::new(
            "wc",
            "wc",
            StaticRule::None,
            vec![Participant::new("A"), Participant::new("B")],
            Some(Wildcard {
                name: "Z".to_string(),
                env_var: "Z_SINGLE".to_string(),
            }),
        );
        assert!(matches!(wc, Err(RosterError::UnknownWildcard(_))));
    }

    #[test]
    fn loads_roster_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.json");
        std::fs::write(
            &path,
            r#"{
                "label": "office",
                "file_stem": "office_swap",
                "rule": "family_groups",
                "participants": [
                    {"name": "Ann", "family": 1},
                    {"name": "Bob", "family": 1},
                    {"name": "Cy"}
                ]
            }"#,
        )
        .unwrap();

        let roster = Roster::from_json_file(&path).unwrap();
        assert_eq!(roster.names(), vec!["Ann", "Bob", "Cy"]);
        assert_eq!(roster.rule, StaticRule::FamilyGroups);
        assert!(roster.wildcard.is_none());
        assert_eq!(roster.static_pairs(), vec![("Ann", "Bob")]);
    }

    #[test]
    fn json_roster_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.json");
        std::fs::write(
            &path,
            r#"{"label":"x","file_stem":"x","rule":"none","participants":[{"name":"A"},{"name":"A"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            Roster::from_json_file(&path),
            Err(RosterError::DuplicateName(_))
        ));
    }
}
