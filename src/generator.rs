//! Test case generation
//!
//! The generator is invoked as
//! `<generator> [fixed args] <iteration> n=.. max_weight=.. cost=.. [extra] precision=..`
//! and its stdout is taken verbatim as the test case. The iteration index is
//! the generator's seed, so the same arguments reproduce the same case.

use crate::config::GenerationParams;
use crate::error::{HarnessError, Result};
use crate::oracle::Tolerance;
use crate::runner::{Executor, ProgramSpec};
use serde::Serialize;
use tracing::{debug, warn};

/// One generated test case
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCase {
    pub iteration: u64,
    pub tolerance: Tolerance,
    /// Arguments passed after the generator's fixed arguments
    pub generator_args: Vec<String>,
    pub text: String,
}

impl TestCase {
    /// Command line that regenerates this case
    pub fn reproduce_command(&self, generator: &ProgramSpec) -> String {
        generator.command_line(&self.generator_args)
    }
}

/// Per-iteration generator arguments
pub fn generator_args(
    iteration: u64,
    params: &GenerationParams,
    tolerance: &Tolerance,
) -> Vec<String> {
    let mut args = vec![iteration.to_string()];
    args.extend(params.to_args());
    args.push(format!("precision={}", tolerance.precision_arg()));
    args
}

/// Run the generator for one iteration.
///
/// A generator that does not exit cleanly is a harness fault, never a
/// counterexample.
pub fn generate<E: Executor + ?Sized>(
    executor: &mut E,
    generator: &ProgramSpec,
    iteration: u64,
    params: &GenerationParams,
    tolerance: Tolerance,
) -> Result<TestCase> {
    let args = generator_args(iteration, params, &tolerance);
    let result = executor.execute(generator, &args, None)?;

    if !result.is_success() {
        warn!(
            "Generator {} failed on iteration {}: {}",
            generator.label(),
            iteration,
            result.outcome
        );
        return Err(HarnessError::GeneratorFailed {
            iteration,
            outcome: result.outcome,
            stderr: result.stderr.trim().to_string(),
        });
    }

    debug!(
        "Generated case {} ({} bytes, tolerance {})",
        iteration,
        result.stdout.len(),
        tolerance
    );

    Ok(TestCase {
        iteration,
        tolerance,
        generator_args: args,
        text: result.stdout,
    })
}
