//! CLI command logic
//!
//! Argument handling and terminal output for the `approx-stress` binary. The
//! stress loop itself lives in the library; these functions translate its
//! outcomes into stdout text and process exit codes.

pub mod judge;
pub mod run;

use anyhow::Context;
use approx_stress::ansi_colors::Palette;
use approx_stress::StressConfig;
use std::path::Path;
use std::process::ExitCode;

// ============================================================================
// Exit Codes
// ============================================================================

/// A counterexample was found (or `judge` rejected the pair)
pub const EXIT_COUNTEREXAMPLE: u8 = 1;

/// The harness itself failed: bad config, generator failure, spawn error
pub const EXIT_HARNESS_ERROR: u8 = 2;

// ============================================================================
// Init Command
// ============================================================================

/// Write a default configuration file to `path`
pub fn cmd_init(path: &Path, force: bool) -> anyhow::Result<ExitCode> {
    write_default_config(path, force)?;
    let palette = Palette::for_stdout();
    println!("{} Wrote {}", palette.success("✓"), path.display());
    Ok(ExitCode::SUCCESS)
}

fn write_default_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    StressConfig::default()
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))
}
