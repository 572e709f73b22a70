//! Shared test utilities for `reelforge-cli` integration tests.

use assert_cmd::Command;

/// Get a `Command` for the `reelforge` binary.
///
/// # Panics
///
/// Panics if the binary cannot be found. This should not happen in a properly configured
/// test environment.
pub fn reelforge_cmd() -> Command {
    Command::cargo_bin("reelforge").expect("reelforge binary should exist")
}
