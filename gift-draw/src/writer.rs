use crate::history::VERB;
use crate::matcher::Assignment;
use crate::roster::Roster;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("could not open file: {path}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed writing {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed writing selections to the console")]
    Console(#[source] std::io::Error),
}

pub fn format_line(giver: &str, recipient: &str) -> String {
    format!("{giver} \t{VERB} \t{recipient}")
}

/// One line per participant, in roster order.
///
/// In single mode the wildcard is left out. A participant missing from the assignment is
/// logged and skipped.
pub fn render_lines(roster: &Roster, assignment: &Assignment, single: bool) -> Vec<String> {
    let wildcard = if single { roster.wildcard_name() } else { None };
    let mut lines = Vec::with_capacity(roster.len());
    for p in &roster.participants {
        if Some(p.name.as_str()) == wildcard {
            continue;
        }
        match assignment.recipient_of(&p.name) {
            Some(recipient) => lines.push(format_line(&p.name, recipient)),
            None => error!(name = %p.name, "could not find a pick"),
        }
    }
    lines
}

/// Writes the year's selections to `<dir>/<file_stem>_<YYYY>.txt` and echoes them to
/// `console`.
pub fn write_year(
    dir: &Path,
    roster: &Roster,
    year: i32,
    assignment: &Assignment,
    single: bool,
    console: &mut dyn Write,
) -> Result<PathBuf, WriteError> {
    let path = roster.file_path(dir, year);
    let file = File::create(&path).map_err(|source| WriteError::Create {
        path: path.clone(),
        source,
    })?;
    let mut out = BufWriter::new(file);

    let lines = render_lines(roster, assignment, single);
    writeln!(console).map_err(WriteError::Console)?;
    for line in &lines {
        writeln!(console, "{line}").map_err(WriteError::Console)?;
        writeln!(out, "{line}").map_err(|source| WriteError::Write {
            path: path.clone(),
            source,
        })?;
    }
    out.flush().map_err(|source| WriteError::Write {
        path: path.clone(),
        source,
    })?;

    info!(path = %path.display(), entries = lines.len(), "selections saved");
    Ok(path)
}
