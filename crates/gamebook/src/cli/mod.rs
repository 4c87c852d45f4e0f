//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the gamebook binary.

mod check;
mod commands;
mod play;

pub use check::check_story;
pub use commands::{Cli, Commands, PlayArgs};
pub use play::play_story;
