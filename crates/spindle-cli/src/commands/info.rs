use colored::Colorize;

use spindle_engine::{Story, TickMethod};

use crate::demo::LockhouseStory;

pub fn run() -> Result<(), String> {
    let config = LockhouseStory::new(false).config();

    println!("  {} {}", "Story:".bold(), config.name);
    println!("  {} {}", "Author:".bold(), config.author);
    println!("  {} {}", "Version:".bold(), config.version);
    let mode = match config.tick_method {
        TickMethod::Command => "command-driven",
        TickMethod::Timer => "real-time",
    };
    println!("  {} {}", "Mode:".bold(), mode);
    println!(
        "  {} {}",
        "Savegames:".bold(),
        if config.savegames_enabled {
            "enabled"
        } else {
            "disabled"
        }
    );
    Ok(())
}
