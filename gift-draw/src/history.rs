//! Prior-year result files and the exclusion history built from them.
//!
//! Each line of a result file reads `<giver> \thas \t<recipient>`. Lines are split on tabs,
//! trimmed, and checked field by field.

use crate::driver::MIN_YEAR;
use crate::exclusion::ExclusionSet;
use crate::roster::Roster;
use std::collections::HashSet;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

pub const VERB: &str = "has";

/// Default number of prior years that feed the exclusion history.
pub const DEFAULT_HISTORY_DEPTH: u32 = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub giver: String,
    pub recipient: String,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum LineError {
    #[error("expected 3 tab-separated fields, found {0}")]
    FieldCount(usize),
    #[error("expected 'has' between names, found {0:?}")]
    MissingVerb(String),
    #[error("empty name")]
    EmptyName,
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid file format in {path} at line {line_no}: {reason}")]
    Format {
        path: PathBuf,
        line_no: usize,
        #[source]
        reason: LineError,
    },
}

/// What one year's file contributed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub year: i32,
    pub path: PathBuf,
    /// Pairs newly added to the exclusion set.
    pub applied: usize,
    /// Lines naming someone who is not on the roster.
    pub unknown: usize,
    /// Pairs that were already excluded.
    pub duplicates: usize,
}

pub fn parse_line(line: &str) -> Result<HistoryEntry, LineError> {
    let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
    if fields.len() != 3 {
        return Err(LineError::FieldCount(fields.len()));
    }
    if fields[1] != VERB {
        return Err(LineError::MissingVerb(fields[1].to_string()));
    }
    if fields[0].is_empty() || fields[2].is_empty() {
        return Err(LineError::EmptyName);
    }
    Ok(HistoryEntry {
        giver: fields[0].to_string(),
        recipient: fields[2].to_string(),
    })
}

/// Reads the result file for `year` into `exclusions`.
///
/// Returns `Ok(None)` when the file does not exist. A malformed line aborts the load, but
/// pairs applied from the lines before it stay in `exclusions`.
pub fn load_year(
    dir: &Path,
    roster: &Roster,
    year: i32,
    exclusions: &mut ExclusionSet,
) -> Result<Option<LoadReport>, HistoryError> {
    let path = roster.file_path(dir, year);
    let file = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(HistoryError::Io { path, source }),
    };

    info!(year, path = %path.display(), "found previous year's selections");

    let mut report = LoadReport {
        year,
        path: path.clone(),
        ..LoadReport::default()
    };
    let mut seen_in_file = HashSet::new();

    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| HistoryError::Io {
            path: path.clone(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let entry = parse_line(&line).map_err(|reason| HistoryError::Format {
            path: path.clone(),
            line_no: idx + 1,
            reason,
        })?;

        if !exclusions.knows(&entry.giver) {
            warn!(year, name = %entry.giver, "unknown name");
            report.unknown += 1;
            continue;
        }
        if !exclusions.knows(&entry.recipient) {
            warn!(year, name = %entry.recipient, "unknown name");
            report.unknown += 1;
            continue;
        }

        if !seen_in_file.insert((entry.giver.clone(), entry.recipient.clone())) {
            warn!(
                year,
                "unexpected: {} had {} twice", entry.giver, entry.recipient
            );
            report.duplicates += 1;
            continue;
        }

        if exclusions.insert(&entry.giver, &entry.recipient) {
            report.applied += 1;
        } else {
            debug!(year, "{} already excluded from {}", entry.giver, entry.recipient);
            report.duplicates += 1;
        }
    }

    Ok(Some(report))
}

/// Builds the exclusion set for `year` from the `depth` years before it plus the roster's
/// static rules.
///
/// Years before the first draw are never looked up. A year that fails to load is logged and
/// skipped.
pub fn init_history(
    dir: &Path,
    roster: &Roster,
    year: i32,
    depth: u32,
) -> (ExclusionSet, Vec<LoadReport>) {
    let mut exclusions = ExclusionSet::for_roster(roster);
    let mut reports = Vec::new();

    let back = i32::try_from(depth).unwrap_or(i32::MAX);
    let oldest = year.saturating_sub(back).max(MIN_YEAR);
    for prior in (oldest..year).rev() {
        match load_year(dir, roster, prior, &mut exclusions) {
            Ok(Some(report)) => reports.push(report),
            Ok(None) => debug!(year = prior, "no selections on file"),
            Err(e) => error!(year = prior, "skipping year: {e:#}"),
        }
    }

    exclusions.apply_static_rules(roster);
    (exclusions, reports)
}
