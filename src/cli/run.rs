//! `run` command: drive the stress loop from the terminal

use super::EXIT_COUNTEREXAMPLE;
use anyhow::Context;
use approx_stress::ansi_colors::Palette;
use approx_stress::config::DEFAULT_CONFIG_FILENAME;
use approx_stress::{report, LoopController, ProgramSpec, ReportFormat, RunOutcome, StressConfig, ToleranceMode};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Options for a stress run. Flags override values from the config file.
#[derive(Debug, clap::Args)]
pub struct RunArgs {
    /// Configuration file (defaults to ./stress.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Test generator program
    #[arg(long)]
    pub generator: Option<PathBuf>,

    /// Trusted reference solution
    #[arg(long)]
    pub reference: Option<PathBuf>,

    /// Candidate solution under test
    #[arg(long)]
    pub candidate: Option<PathBuf>,

    /// Number of iterations to run
    #[arg(long)]
    pub iterations: Option<u64>,

    /// First iteration index
    #[arg(long)]
    pub start: Option<u64>,

    /// Generator parameter `n`
    #[arg(long = "n", value_name = "N")]
    pub n: Option<u64>,

    /// Generator parameter `max_weight`
    #[arg(long)]
    pub max_weight: Option<u64>,

    /// Generator parameter `cost`
    #[arg(long)]
    pub cost: Option<u64>,

    /// Extra generator parameter (repeatable)
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Seed for tolerance sampling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Per-program wall-clock limit in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// How tolerances are sampled and compared
    #[arg(long, value_enum)]
    pub tolerance_mode: Option<ToleranceMode>,

    /// Counterexample report format
    #[arg(long, value_enum, default_value = "text")]
    pub format: ReportFormat,

    /// Write the failing test case to this file
    #[arg(long)]
    pub save_input: Option<PathBuf>,

    /// Suppress per-iteration progress lines
    #[arg(short, long)]
    pub quiet: bool,
}

/// Run the stress loop and report the outcome
pub fn cmd_run(args: RunArgs) -> anyhow::Result<ExitCode> {
    let config = resolve_config(&args)?;
    let mut controller =
        LoopController::new(config).context("failed to set up stress run")?;

    let palette = Palette::for_stdout();
    let show_progress = !args.quiet && args.format == ReportFormat::Text;
    let stdout = std::io::stdout();

    let outcome = controller.run_with(|passed| {
        if show_progress {
            let mut out = stdout.lock();
            // A closed stdout should not abort the run
            let _ = writeln!(out, "{}", palette.success(&format!("OK {}", passed.iteration)));
        }
    })?;

    match outcome {
        RunOutcome::Passed { .. } => Ok(ExitCode::SUCCESS),
        RunOutcome::Counterexample(found) => {
            let rendered = report::render(&found, args.format, palette)?;
            print!("{rendered}");
            if args.format == ReportFormat::Json {
                println!();
            }
            if let Some(path) = &args.save_input {
                report::save_input(&found, path)?;
                eprintln!("Failing input written to {}", path.display());
            }
            Ok(ExitCode::from(EXIT_COUNTEREXAMPLE))
        }
    }
}

/// Merge the config file (if any) with command-line overrides
pub fn resolve_config(args: &RunArgs) -> anyhow::Result<StressConfig> {
    let mut config = match &args.config {
        Some(path) => load(path)?,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILENAME);
            if default_path.exists() {
                load(default_path)?
            } else {
                StressConfig::default()
            }
        }
    };

    if let Some(path) = &args.generator {
        config.generator = ProgramSpec::new(path);
    }
    if let Some(path) = &args.reference {
        config.reference = ProgramSpec::new(path);
    }
    if let Some(path) = &args.candidate {
        config.candidate = ProgramSpec::new(path);
    }
    if let Some(iterations) = args.iterations {
        config.max_iterations = iterations;
    }
    if let Some(start) = args.start {
        config.start_iteration = start;
    }
    if let Some(n) = args.n {
        config.params.n = n;
    }
    if let Some(max_weight) = args.max_weight {
        config.params.max_weight = max_weight;
    }
    if let Some(cost) = args.cost {
        config.params.cost = cost;
    }
    for assignment in &args.params {
        config
            .params
            .set(assignment)
            .with_context(|| format!("bad --param '{assignment}'"))?;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.timeout_ms.is_some() {
        config.timeout_ms = args.timeout_ms;
    }
    if let Some(mode) = args.tolerance_mode {
        config.tolerance_mode = mode;
    }

    Ok(config)
}

fn load(path: &Path) -> anyhow::Result<StressConfig> {
    StressConfig::load(path).with_context(|| format!("failed to load {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: RunArgs,
    }

    fn parse(argv: &[&str]) -> RunArgs {
        let mut full = vec!["run"];
        full.extend_from_slice(argv);
        Harness::try_parse_from(full).unwrap().args
    }

    fn write_config(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    // ========================================================================
    // Flag Parsing
    // ========================================================================

    #[test]
    fn test_defaults_parse() {
        let args = parse(&[]);
        assert!(args.config.is_none());
        assert_eq!(args.format, ReportFormat::Text);
        assert!(!args.quiet);
        assert!(args.params.is_empty());
    }

    #[test]
    fn test_repeated_params_and_modes() {
        let args = parse(&[
            "--param",
            "density=0.3",
            "--param",
            "shape=tree",
            "--tolerance-mode",
            "rational",
            "--format",
            "json",
        ]);
        assert_eq!(args.params, vec!["density=0.3", "shape=tree"]);
        assert_eq!(args.tolerance_mode, Some(ToleranceMode::Rational));
        assert_eq!(args.format, ReportFormat::Json);
    }

    // ========================================================================
    // Config Resolution
    // ========================================================================

    #[test]
    fn test_flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "max_iterations = 50\nseed = 1\n\n[candidate]\npath = \"./old\"\nargs = [\"--fast\"]\n",
        );
        let args = parse(&[
            "--config",
            path.to_str().unwrap(),
            "--candidate",
            "./new",
            "--iterations",
            "7",
            "--n",
            "12",
            "--timeout-ms",
            "250",
        ]);

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.max_iterations, 7);
        assert_eq!(config.seed, Some(1));
        assert_eq!(config.candidate, ProgramSpec::new("./new"));
        assert_eq!(config.params.n, 12);
        assert_eq!(config.timeout_ms, Some(250));
    }

    #[test]
    fn test_config_values_survive_without_flags() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "start_iteration = 40\n\n[params]\ncost = 99\n");
        let args = parse(&["--config", path.to_str().unwrap()]);

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.start_iteration, 40);
        assert_eq!(config.params.cost, 99);
        assert_eq!(config.params.n, 100);
    }

    #[test]
    fn test_extra_param_lands_in_params() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "");
        let args = parse(&["--config", path.to_str().unwrap(), "--param", "density=0.3"]);

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.params.extra.get("density").map(String::as_str), Some("0.3"));
    }

    #[test]
    fn test_precision_param_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "");
        let args = parse(&["--config", path.to_str().unwrap(), "--param", "precision=0.1"]);

        let err = resolve_config(&args).unwrap_err();
        assert!(err.to_string().contains("precision=0.1"));
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let args = parse(&["--config", "/nonexistent/stress.toml"]);
        let err = resolve_config(&args).unwrap_err();
        assert!(err.to_string().contains("failed to load"));
    }
}
