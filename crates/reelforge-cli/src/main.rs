//! # reelforge CLI
//!
//! Command-line interface for Reelforge, a local-first media discovery engine.
//!
//! This binary provides human-friendly access to `reelforge-core`'s §6 operation surface.
//! Run `reelforge --help` for usage information.

mod cli;
mod presets;
pub mod ui;

use std::process::ExitCode;

fn main() -> ExitCode {
    cli::run()
}
