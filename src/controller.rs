//! Stress loop controller
//!
//! Drives iterations until the first counterexample or until the iteration
//! budget is spent. Each iteration samples a tolerance, generates a case,
//! runs the reference and then the candidate on it, and scores the pair.

use crate::config::StressConfig;
use crate::error::Result;
use crate::generator::{self, TestCase};
use crate::oracle::Tolerance;
use crate::runner::{ExecutionResult, Executor, ProcessRunner};
use crate::verdict::{self, Verdict};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Everything needed to reproduce and explain a failing iteration
#[derive(Debug, Clone, Serialize)]
pub struct Counterexample {
    /// Seed of the tolerance sampler for the whole run
    pub seed: u64,
    pub verdict: Verdict,
    pub case: TestCase,
    /// Generator command line that recreates `case.text`
    pub reproduce: String,
    pub reference_program: String,
    pub candidate_program: String,
    pub reference: ExecutionResult,
    pub candidate: ExecutionResult,
}

impl Counterexample {
    pub fn iteration(&self) -> u64 {
        self.case.iteration
    }
}

/// Result of one completed iteration
#[derive(Debug, Clone, PartialEq)]
pub struct IterationReport {
    pub iteration: u64,
    pub tolerance: Tolerance,
    pub verdict: Verdict,
}

/// Controller state machine
#[derive(Debug, Clone)]
pub enum ControllerState {
    /// Next iteration to run
    Running { iteration: u64 },
    /// Stopped on the first non-`Ok` verdict
    Halted(Box<Counterexample>),
    /// Budget spent with every iteration `Ok`
    Exhausted { iterations: u64 },
}

/// How a run ended
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Passed { iterations: u64 },
    Counterexample(Box<Counterexample>),
}

/// Sequential stress loop over an [`Executor`]
pub struct LoopController<E: Executor = ProcessRunner> {
    config: StressConfig,
    executor: E,
    seed: u64,
    rng: StdRng,
    state: ControllerState,
    completed: u64,
}

impl LoopController<ProcessRunner> {
    /// Controller running real subprocesses
    pub fn new(config: StressConfig) -> Result<Self> {
        config.validate()?;
        let runner = match &config.scratch_dir {
            Some(parent) => ProcessRunner::in_dir(parent, config.timeout())?,
            None => ProcessRunner::new(config.timeout())?,
        };
        Self::with_executor(config, runner)
    }
}

impl<E: Executor> LoopController<E> {
    pub fn with_executor(config: StressConfig, executor: E) -> Result<Self> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        Ok(Self {
            state: ControllerState::Running {
                iteration: config.start_iteration,
            },
            rng: StdRng::seed_from_u64(seed),
            seed,
            config,
            executor,
            completed: 0,
        })
    }

    pub fn config(&self) -> &StressConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Iterations completed so far, including a halting one
    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Run one iteration. `None` once the controller has halted or exhausted
    /// its budget.
    pub fn step(&mut self) -> Result<Option<IterationReport>> {
        let iteration = match self.state {
            ControllerState::Running { iteration } => iteration,
            _ => return Ok(None),
        };

        if iteration >= self.config.end_iteration() {
            info!("All {} iterations passed", self.completed);
            self.state = ControllerState::Exhausted {
                iterations: self.completed,
            };
            return Ok(None);
        }

        let tolerance = Tolerance::sample(&mut self.rng, self.config.tolerance_mode);
        let case = generator::generate(
            &mut self.executor,
            &self.config.generator,
            iteration,
            &self.config.params,
            tolerance,
        )?;

        let reference = self
            .executor
            .execute(&self.config.reference, &[], Some(&case.text))?;
        let candidate = self
            .executor
            .execute(&self.config.candidate, &[], Some(&case.text))?;

        let verdict = verdict::evaluate(&reference, &candidate, &tolerance);
        self.completed += 1;

        let report = IterationReport {
            iteration,
            tolerance,
            verdict: verdict.clone(),
        };

        if verdict.is_ok() {
            debug!("Iteration {} OK (tolerance {})", iteration, tolerance);
            self.state = ControllerState::Running {
                iteration: iteration + 1,
            };
        } else {
            warn!("Iteration {} halted the run: {}", iteration, verdict.code());
            self.state = ControllerState::Halted(Box::new(Counterexample {
                seed: self.seed,
                verdict,
                reproduce: case.reproduce_command(&self.config.generator),
                reference_program: self.config.reference.label(),
                candidate_program: self.config.candidate.label(),
                case,
                reference,
                candidate,
            }));
        }

        Ok(Some(report))
    }

    /// Run to completion, calling `on_pass` after every passing iteration
    pub fn run_with<F>(&mut self, mut on_pass: F) -> Result<RunOutcome>
    where
        F: FnMut(&IterationReport),
    {
        info!(
            "Stress run over iterations {}..{} (seed {}, tolerance {})",
            self.config.start_iteration,
            self.config.end_iteration(),
            self.seed,
            self.config.tolerance_mode
        );

        while let Some(report) = self.step()? {
            if report.verdict.is_ok() {
                on_pass(&report);
            }
        }

        Ok(match &self.state {
            ControllerState::Halted(found) => RunOutcome::Counterexample(found.clone()),
            _ => RunOutcome::Passed {
                iterations: self.completed,
            },
        })
    }

    pub fn run(&mut self) -> Result<RunOutcome> {
        self.run_with(|_| {})
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
