//! Counterexample reports
//!
//! Renders a failing iteration so it can be replayed outside the harness: the
//! failing verdict with its evidence, the full test case text, and the
//! generator command line that recreates it.

use crate::ansi_colors::Palette;
use crate::controller::Counterexample;
use crate::error::{HarnessError, Result};
use crate::oracle;
use crate::runner::ExecutionResult;
use crate::verdict::{Role, Verdict};
use std::path::Path;

/// Report output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON for CI tooling
    Json,
}

/// Render a counterexample in the requested format
pub fn render(found: &Counterexample, format: ReportFormat, palette: Palette) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(to_text(found, palette)),
        ReportFormat::Json => to_json(found),
    }
}

/// Generate JSON report
pub fn to_json(found: &Counterexample) -> Result<String> {
    Ok(serde_json::to_string_pretty(found)?)
}

/// Generate plain text report
pub fn to_text(found: &Counterexample, palette: Palette) -> String {
    let mut text = String::new();

    match &found.verdict {
        Verdict::Ok => {}
        Verdict::RuntimeError { which } => {
            for role in which.roles() {
                let (label, result) = program(found, *role);
                text.push_str(&palette.failure(&format!("RE {label}")));
                text.push_str(&format!(" ({})\n", result.outcome));
                push_stderr(&mut text, result, palette);
            }
        }
        Verdict::ToleranceViolation {
            reference,
            candidate,
            tolerance,
        } => {
            text.push_str(&palette.failure("WA"));
            text.push('\n');
            text.push_str(&palette.heading("Correct answer:"));
            text.push_str(&format!("\n{reference}\n"));
            text.push_str(&palette.heading("Output:"));
            text.push_str(&format!("\n{candidate}\n"));
            text.push_str(&format!(
                "Tolerance: {} (ceiling {})\n",
                tolerance,
                oracle::ceiling(*reference, tolerance)
            ));
        }
        Verdict::ParseError { which, raw } => {
            let (label, _) = program(found, *which);
            text.push_str(&palette.failure(&format!("PE {label}")));
            text.push_str(" (output is not a single integer)\n");
            text.push_str(&palette.heading("Output:"));
            text.push('\n');
            text.push_str(raw);
            if !raw.ends_with('\n') {
                text.push('\n');
            }
        }
    }

    text.push_str(&palette.heading("Input:"));
    text.push('\n');
    text.push_str(&found.case.text);
    if !found.case.text.ends_with('\n') {
        text.push('\n');
    }

    text.push_str(&palette.detail(&format!(
        "Iteration: {}  Seed: {}\nReproduce: {}",
        found.iteration(),
        found.seed,
        found.reproduce
    )));
    text.push('\n');

    text
}

/// Write the failing test case text to `path`
pub fn save_input(found: &Counterexample, path: &Path) -> Result<()> {
    std::fs::write(path, &found.case.text).map_err(|e| HarnessError::io(path, e))
}

fn program(found: &Counterexample, role: Role) -> (&str, &ExecutionResult) {
    match role {
        Role::Reference => (found.reference_program.as_str(), &found.reference),
        Role::Candidate => (found.candidate_program.as_str(), &found.candidate),
    }
}

fn push_stderr(text: &mut String, result: &ExecutionResult, palette: Palette) {
    let stderr = result.stderr.trim_end();
    if stderr.is_empty() {
        return;
    }
    text.push_str(&palette.warning("stderr:"));
    text.push('\n');
    text.push_str(stderr);
    text.push('\n');
}
