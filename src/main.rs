mod cli;

use approx_stress::config::DEFAULT_CONFIG_FILENAME;
use clap::{Parser, Subcommand};
use cli::run::RunArgs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "approx-stress")]
#[command(version, about = "Stress-test a candidate program against a reference under a tolerance oracle", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the stress loop until a counterexample or the iteration budget
    ///
    /// Examples:
    ///   approx-stress run
    ///   approx-stress run --config stress.toml --iterations 5000
    ///   approx-stress run --candidate ./fast --param density=0.3 --timeout-ms 2000
    Run(RunArgs),

    /// Write a default configuration file
    Init {
        /// Destination path
        #[arg(default_value = DEFAULT_CONFIG_FILENAME)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Check one answer pair against a tolerance (`0.25` or `1/4`)
    #[command(allow_negative_numbers = true)]
    Judge {
        /// Reference answer
        reference: i64,

        /// Candidate answer
        candidate: i64,

        /// Allowed relative overshoot in [0, 1)
        tolerance: String,
    },
}

fn init_tracing(verbose: bool, debug: bool) {
    let filter_layer = if debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else if verbose {
        tracing_subscriber::EnvFilter::new("info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.debug);

    info!("approx-stress v{}", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Commands::Run(args) => cli::run::cmd_run(args),
        Commands::Init { path, force } => cli::cmd_init(&path, force),
        Commands::Judge {
            reference,
            candidate,
            tolerance,
        } => cli::judge::cmd_judge(reference, candidate, &tolerance),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(cli::EXIT_HARNESS_ERROR)
        }
    }
}
