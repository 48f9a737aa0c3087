//! Command-line arguments.

use crate::config::Mode;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Draw classified kinship pairs, social rank, SL and harem/nest groups as a
/// geographic network.
#[derive(Debug, Parser)]
#[command(name = "kinmap")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, env = "KINMAP_CONFIG")]
    pub config: PathBuf,

    /// SVG file to write, overriding render.output
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Classification mode, overriding classification.mode
    #[arg(short, long, value_enum)]
    pub mode: Option<CliMode>,

    /// Print per-category counts to stdout
    #[arg(long)]
    pub summary: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliMode {
    /// Classify the kinship table with the rule table
    Threshold,
    /// Merge pre-labeled degree tables by priority
    Legacy,
}

impl From<CliMode> for Mode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Threshold => Mode::Threshold,
            CliMode::Legacy => Mode::Legacy,
        }
    }
}

impl Cli {
    /// Log filter used when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_overrides() {
        let cli = Cli::parse_from(["kinmap", "-c", "run.toml", "--mode", "legacy", "-o", "out.svg", "-vv"]);
        assert_eq!(cli.config, PathBuf::from("run.toml"));
        assert_eq!(Mode::from(cli.mode.unwrap()), Mode::Legacy);
        assert_eq!(cli.output, Some(PathBuf::from("out.svg")));
        assert_eq!(cli.log_level(), "trace");
        assert!(!cli.summary);
    }
}
