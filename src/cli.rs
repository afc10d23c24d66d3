//! Command line options for the headless binary. Anything not given here comes from
//! the configuration layers.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Stop after this many ticks instead of running until a quit is requested.
    #[arg(short, long, value_name = "COUNT")]
    pub ticks: Option<u64>,
    /// TOML configuration file, replacing `forest-survival.toml`.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Seed for the spawn randomness; overrides `gameplay.seed`.
    #[arg(short, long)]
    pub seed: Option<u64>,
    /// Run ticks back to back instead of pacing them in real time.
    #[arg(long)]
    pub fast: bool,
    /// Let the autopilot start a new run after a game over.
    #[arg(long)]
    pub restart: bool,
}
