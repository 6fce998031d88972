//! Console frontend for the Spindle interactive-fiction engine.

mod commands;
mod console;
mod demo;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "spindle",
    about = "Spindle, a turn-driven interactive fiction engine",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the bundled story
    Play {
        /// Savegame file
        #[arg(short, long, default_value = "lockhouse.save")]
        save: PathBuf,

        /// RNG seed for a reproducible world
        #[arg(long)]
        seed: Option<u64>,

        /// Run in real-time (timer) mode instead of command-driven mode
        #[arg(short, long)]
        timer: bool,
    },

    /// Show information about the bundled story
    Info,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Play { save, seed, timer } => commands::play::run(save, seed, timer),
        Commands::Info => commands::info::run(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
