//! Randomized differential stress testing with an approximate oracle.
//!
//! A generator produces a test case per iteration, a trusted reference and a
//! candidate program both answer it with a single integer, and the candidate
//! is rejected when its answer overshoots `reference * (1 + tolerance)` for a
//! tolerance drawn fresh each iteration. The loop stops at the first
//! counterexample and reports everything needed to replay it.
//!
//! ```no_run
//! use approx_stress::{LoopController, RunOutcome, StressConfig};
//!
//! let config = StressConfig::load(std::path::Path::new("stress.toml"))?;
//! let mut controller = LoopController::new(config)?;
//! if let RunOutcome::Counterexample(found) = controller.run()? {
//!     eprintln!("iteration {} failed: {}", found.iteration(), found.verdict.code());
//! }
//! # Ok::<(), approx_stress::HarnessError>(())
//! ```

pub mod ansi_colors;
pub mod config;
pub mod controller;
pub mod error;
pub mod generator;
pub mod oracle;
pub mod report;
pub mod runner;
pub mod verdict;

// Re-export key types for convenience
pub use config::{GenerationParams, StressConfig};
pub use controller::{ControllerState, Counterexample, IterationReport, LoopController, RunOutcome};
pub use error::{HarnessError, Result};
pub use generator::TestCase;
pub use oracle::{accepts, Ratio, Tolerance, ToleranceBound, ToleranceMode};
pub use report::ReportFormat;
pub use runner::{ExecutionResult, Executor, ExitOutcome, ProcessRunner, ProgramSpec};
pub use verdict::{Culprit, Role, Verdict};
