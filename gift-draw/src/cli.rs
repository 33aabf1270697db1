use crate::driver::{self, DrawConfig, DrawError};
use crate::history::DEFAULT_HISTORY_DEPTH;
use crate::matcher::DEFAULT_MAX_DRAWS;
use crate::roster::Roster;
use anyhow::{Context, Result};
use chrono::Datelike;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Draws this year's gift exchange, avoiding recent and family matches",
    long_about = None
)]
pub struct Args {
    /// Year to draw for (defaults to the current year)
    #[arg(allow_negative_numbers = true)]
    pub year: Option<i32>,

    /// Directory holding previous results and receiving this year's
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Number of previous years whose picks may not repeat
    #[arg(long, default_value_t = DEFAULT_HISTORY_DEPTH)]
    pub history_depth: u32,

    /// Draws per person before starting the whole draw over
    #[arg(long, default_value_t = DEFAULT_MAX_DRAWS, value_parser = parse_max_draws)]
    pub max_draws: usize,

    /// Give up after this many restarts (default: never)
    #[arg(long)]
    pub max_restarts: Option<u64>,

    /// Optional random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Load the roster from a JSON file instead of the built-in one
    #[arg(long)]
    pub roster_file: Option<PathBuf>,

    /// Verbose output level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

fn parse_max_draws(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn current_year() -> i32 {
    chrono::Local::now().year()
}

fn single_mode(roster: &Roster) -> bool {
    let Some(wildcard) = &roster.wildcard else {
        return false;
    };
    let value = std::env::var(&wildcard.env_var).ok();
    let single = driver::toggle_enabled(value.as_deref());
    if single {
        info!(wildcard = %wildcard.name, "{} is set, running in single mode", wildcard.env_var);
    }
    single
}

fn execute(args: Args, default_roster: fn() -> Roster) -> Result<()> {
    let roster = match &args.roster_file {
        Some(path) => Roster::from_json_file(path)
            .with_context(|| format!("failed to load roster from {}", path.display()))?,
        None => default_roster(),
    };

    let year = match args.year {
        Some(year) => year,
        None => {
            let year = current_year();
            println!("Making selections for year: {year}");
            year
        }
    };

    let config = DrawConfig {
        year,
        dir: args.dir,
        history_depth: args.history_depth,
        single: single_mode(&roster),
        max_draws: args.max_draws,
        max_restarts: args.max_restarts,
        seed: args.seed,
    };

    let mut stdout = std::io::stdout().lock();
    let report = driver::run(&roster, &config, &mut stdout)?;
    info!(path = %report.path.display(), "done");
    Ok(())
}

/// Entry point shared by the binaries; returns the process exit code.
pub fn run_cli(default_roster: fn() -> Roster) -> i32 {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.verbose);

    match execute(args, default_roster) {
        Ok(()) => 0,
        Err(e) => match e.downcast_ref::<DrawError>() {
            Some(DrawError::InvalidYear(year)) => {
                let program = std::env::args().next().unwrap_or_else(|| "xmas".to_string());
                eprintln!("Invalid year: {year}");
                eprintln!("Format: \t{program} <year>");
                -2
            }
            Some(draw_error) => {
                error!("{draw_error:#}");
                eprintln!("Error: {e:#}");
                draw_error.exit_code()
            }
            None => {
                eprintln!("Error: {e:#}");
                -1
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_is_optional_positional() {
        let args = Args::try_parse_from(["xmas"]).unwrap();
        assert_eq!(args.year, None);
        assert_eq!(args.history_depth, 3);
        assert_eq!(args.max_draws, 4);

        let args = Args::try_parse_from(["xmas", "2024", "--dir", "out", "-vv"]).unwrap();
        assert_eq!(args.year, Some(2024));
        assert_eq!(args.dir, PathBuf::from("out"));
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn non_numeric_year_is_rejected() {
        assert!(Args::try_parse_from(["xmas", "next"]).is_err());
    }

    #[test]
    fn zero_max_draws_is_rejected() {
        assert!(Args::try_parse_from(["xmas", "2024", "--max-draws", "0"]).is_err());
        assert!(Args::try_parse_from(["xmas", "2024", "--max-draws", "-1"]).is_err());
        let args = Args::try_parse_from(["xmas", "2024", "--max-draws", "1"]).unwrap();
        assert_eq!(args.max_draws, 1);
    }

    #[test]
    fn huge_history_depth_still_draws() {
        let dir = tempfile::tempdir().unwrap();
        let depth = u32::MAX.to_string();
        let args = Args::try_parse_from([
            "xmas",
            "2024",
            "--dir",
            dir.path().to_str().unwrap(),
            "--history-depth",
            depth.as_str(),
            "--seed",
            "5",
        ])
        .unwrap();
        execute(args, Roster::junior).unwrap();
        assert!(dir.path().join("jr_dowling_xmas_2024.txt").exists());
    }

    #[test]
    fn old_year_maps_to_usage_exit_code() {
        let args = Args::try_parse_from(["xmas", "2001"]).unwrap();
        let err = execute(args, Roster::adult).unwrap_err();
        assert_eq!(err.downcast_ref::<DrawError>().map(DrawError::exit_code), Some(-2));
    }

    #[test]
    fn missing_roster_file_is_fatal() {
        let args = Args::try_parse_from([
            "xmas",
            "2024",
            "--roster-file",
            "/nonexistent/roster.json",
        ])
        .unwrap();
        let err = execute(args, Roster::adult).unwrap_err();
        assert!(err.downcast_ref::<DrawError>().is_none());
        assert!(format!("{err:#}").contains("failed to load roster"));
    }
}
