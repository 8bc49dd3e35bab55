#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that generates a dungeon and simulates it headlessly.

mod args;
mod session;

use std::{fs, io, path::Path};

use anyhow::{Context, Result};
use clap::Parser;
use delve_core::config::Tuning;
use delve_rendering::{status_line, AsciiBackend, RenderingBackend};
use tracing_subscriber::EnvFilter;

use crate::{
    args::Args,
    session::{Pilot, Session, Summary},
};

/// Entry point for the Delve command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let tuning = load_tuning(args.config.as_deref())?;
    let (default_width, default_height) = tuning.grid.dimensions();
    let width = args.width.unwrap_or(default_width);
    let height = args.height.unwrap_or(default_height);
    let pilot = Pilot {
        auto_attack: args.auto_attack,
        autopilot: args.autopilot,
    };

    let mut session = Session::new(tuning, args.seed, width, height, pilot)?;
    let backend = AsciiBackend::new(io::stdout());
    let mut backend = if args.view == 0 {
        backend
    } else {
        backend.with_viewport(args.view, args.view / 2)
    };

    for tick in 1..=args.ticks {
        session.step();
        if args.render_every > 0 && tick % args.render_every == 0 {
            let scene = session.scene();
            backend.present(scene)?;
            println!("{}", status_line(scene));
        }
        if session.is_over() {
            break;
        }
    }

    let scene = session.scene();
    backend.present(scene)?;
    println!("{}", status_line(scene));
    print_summary(&session.summary());
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn load_tuning(path: Option<&Path>) -> Result<Tuning> {
    let Some(path) = path else {
        return Ok(Tuning::default());
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read tuning file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("failed to parse tuning file {}", path.display()))
}

fn print_summary(summary: &Summary) {
    println!("ticks: {}", summary.ticks);
    println!("player health: {}", summary.player_health);
    println!("kills: {} (experience {})", summary.kills, summary.experience);
    println!("reached exit: {}", summary.reached_exit);
    println!("live enemies: {}", summary.live_enemies);
    for (archetype, count) in &summary.census {
        println!("  {}: {count}", archetype.name());
    }
}
