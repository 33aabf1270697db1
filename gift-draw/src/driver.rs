use crate::history::{self, DEFAULT_HISTORY_DEPTH};
use crate::matcher::{DrawOutcome, MatchError, MatchParams, Matcher, DEFAULT_MAX_DRAWS};
use crate::roster::Roster;
use crate::writer::{self, WriteError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

/// The first year a draw was ever held.
pub const MIN_YEAR: i32 = 2002;

#[derive(Debug, thiserror::Error)]
pub enum DrawError {
    #[error("invalid year: {0} (must be 2002 or later)")]
    InvalidYear(i32),
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error(transparent)]
    Write(#[from] WriteError),
}

impl DrawError {
    pub fn exit_code(&self) -> i32 {
        match self {
            DrawError::InvalidYear(_) => -2,
            DrawError::Match(_) => -3,
            DrawError::Write(_) => -1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DrawConfig {
    pub year: i32,
    /// Where prior results are read from and this year's result is written.
    pub dir: PathBuf,
    pub history_depth: u32,
    pub single: bool,
    pub max_draws: usize,
    pub max_restarts: Option<u64>,
    pub seed: Option<u64>,
}

impl DrawConfig {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            dir: PathBuf::from("."),
            history_depth: DEFAULT_HISTORY_DEPTH,
            single: false,
            max_draws: DEFAULT_MAX_DRAWS,
            max_restarts: None,
            seed: None,
        }
    }
}

pub fn validate_year(year: i32) -> Result<i32, DrawError> {
    if year < MIN_YEAR {
        return Err(DrawError::InvalidYear(year));
    }
    Ok(year)
}

/// Interprets a single-mode toggle value. Any value turns it on except the usual
/// spellings of "off".
pub fn toggle_enabled(value: Option<&str>) -> bool {
    match value {
        None => false,
        Some(v) => !matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "" | "0" | "false" | "no" | "off"
        ),
    }
}

pub struct DrawReport {
    pub outcome: DrawOutcome,
    pub path: PathBuf,
}

/// Runs one year's draw: history, matching, then writing.
pub fn run(
    roster: &Roster,
    config: &DrawConfig,
    console: &mut dyn Write,
) -> Result<DrawReport, DrawError> {
    let year = validate_year(config.year)?;

    let (exclusions, reports) =
        history::init_history(&config.dir, roster, year, config.history_depth);
    info!(
        roster = %roster.label,
        years_loaded = reports.len(),
        excluded_pairs = exclusions.pair_count(),
        "history ready"
    );

    let single = config.single && roster.wildcard.is_some();
    if config.single && !single {
        warn!(roster = %roster.label, "single mode requested but the roster has no wildcard");
    }

    let names = roster.names();
    let params = MatchParams {
        max_draws: config.max_draws,
        max_restarts: config.max_restarts,
    };
    let mut matcher = Matcher::new(&names, &exclusions, params);
    if single {
        if let Some(wildcard) = roster.wildcard_name() {
            matcher = matcher.with_wildcard(wildcard);
        }
    }
    matcher.warn_infeasible();

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let outcome = matcher.run(&mut rng)?;
    info!(restarts = outcome.restarts, "selections made");

    let path = writer::write_year(
        &config.dir,
        roster,
        year,
        &outcome.assignment,
        single,
        console,
    )?;

    Ok(DrawReport { outcome, path })
}
