//! Subcommand implementations.

pub mod info;
pub mod play;
