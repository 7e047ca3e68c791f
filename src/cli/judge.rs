//! `judge` command: apply the tolerance oracle to a single answer pair

use super::EXIT_COUNTEREXAMPLE;
use anyhow::Context;
use approx_stress::ansi_colors::Palette;
use approx_stress::oracle::{self, Tolerance};
use std::process::ExitCode;

/// Judge `candidate` against `reference` and print the decision
pub fn cmd_judge(reference: i64, candidate: i64, tolerance: &str) -> anyhow::Result<ExitCode> {
    let tolerance: Tolerance = tolerance
        .parse()
        .with_context(|| format!("cannot use '{tolerance}' as a tolerance"))?;

    let (accepted, line) = judge_line(reference, candidate, &tolerance, Palette::for_stdout());
    println!("{line}");

    Ok(if accepted {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_COUNTEREXAMPLE)
    })
}

/// Decision plus a one-line explanation
pub fn judge_line(
    reference: i64,
    candidate: i64,
    tolerance: &Tolerance,
    palette: Palette,
) -> (bool, String) {
    let accepted = oracle::accepts(reference, candidate, tolerance);
    let ceiling = oracle::ceiling(reference, tolerance);
    let line = if accepted {
        format!(
            "{} {candidate} <= {reference} * (1 + {tolerance}) = {ceiling}",
            palette.success("ACCEPT")
        )
    } else {
        format!(
            "{} {candidate} > {reference} * (1 + {tolerance}) = {ceiling}",
            palette.failure("REJECT")
        )
    };
    (accepted, line)
}
