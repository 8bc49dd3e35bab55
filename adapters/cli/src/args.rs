//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Generates a dungeon, populates it and runs the simulation headlessly.
#[derive(Debug, Parser)]
#[command(name = "delve", version, about)]
pub(crate) struct Args {
    /// Seed for the dungeon, the population and every behaviour.
    #[arg(long, default_value_t = 0)]
    pub(crate) seed: u64,

    /// TOML file overriding any subset of the default tuning.
    #[arg(long, value_name = "PATH")]
    pub(crate) config: Option<PathBuf>,

    /// Number of fixed-interval ticks to simulate.
    #[arg(long, default_value_t = 600)]
    pub(crate) ticks: u64,

    /// Grid width in tiles; derived from the viewport tuning when omitted.
    #[arg(long)]
    pub(crate) width: Option<u32>,

    /// Grid height in tiles; derived from the viewport tuning when omitted.
    #[arg(long)]
    pub(crate) height: Option<u32>,

    /// Print a frame every N ticks; 0 prints only the final frame.
    #[arg(long, default_value_t = 0)]
    pub(crate) render_every: u64,

    /// Columns and rows of the window drawn around the player; 0 draws the whole grid.
    #[arg(long, default_value_t = 48)]
    pub(crate) view: u32,

    /// Swing at enemies whenever one is in reach.
    #[arg(long)]
    pub(crate) auto_attack: bool,

    /// Walk the player along the shortest route to the exit.
    #[arg(long)]
    pub(crate) autopilot: bool,
}
