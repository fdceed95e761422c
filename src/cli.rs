use clap::{ArgAction, Parser, ValueHint};
use std::path::PathBuf;

use crate::region::BoundaryKind;
use crate::source::{DEFAULT_BASE_URL, DEFAULT_PROJECT_DIR, DEFAULT_YEAR};

/// Clip TIGER roads and counties to a state, city or county boundary.
///
/// Values not given as flags are asked for interactively.
#[derive(Parser, Debug)]
#[command(name = "tigerclip", version, about)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only report warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Project folder holding downloads/ and clipped/
    #[arg(long, default_value = DEFAULT_PROJECT_DIR, value_hint = ValueHint::DirPath)]
    pub project: PathBuf,

    /// TIGER vintage to download
    #[arg(long, default_value_t = DEFAULT_YEAR)]
    pub year: u16,

    /// Root URL of the TIGER archive
    #[arg(long, default_value = DEFAULT_BASE_URL, value_hint = ValueHint::Url)]
    pub base_url: String,

    /// Boundary kind: state, city or fips (or 1/2/3)
    #[arg(long)]
    pub kind: Option<BoundaryKind>,

    /// State name/code, city name, or 5-digit county FIPS, depending on --kind
    #[arg(long)]
    pub value: Option<String>,

    /// State (name or code) of the city, with --kind city
    #[arg(long)]
    pub state: Option<String>,
}

impl Cli {
    /// Log directive for this crate derived from -v/-q.
    pub fn log_level(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "warn",
            (false, 0) => "info",
            (false, 1) => "debug",
            (false, _) => "trace",
        }
    }
}
