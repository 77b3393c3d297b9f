//! levelcheck CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "levelcheck",
    version,
    about = "Adaptive mini-game placement with fuzzy grade inference"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Infer a learner's grade from recorded mini-game results
    Evaluate {
        /// Path to the .toml test plan
        #[arg(long)]
        plan: PathBuf,

        /// JSON file of attempts per game type
        #[arg(long)]
        results: PathBuf,

        /// Shift membership triangles by the plan's game difficulty
        #[arg(long)]
        dynamic: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Directory to save the JSON report in
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show per-game difficulty and per-axis membership triangles
    Difficulty {
        /// Path to the .toml test plan
        #[arg(long)]
        plan: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Walk the plan's decision flow with a sequence of outcomes
    Flow {
        /// Path to the .toml test plan
        #[arg(long)]
        plan: PathBuf,

        /// Pass/fail outcomes in play order (e.g. "true,false,true")
        #[arg(long)]
        outcomes: String,

        /// What a node does once its retries are used up: terminate, advance
        #[arg(long)]
        exhaustion: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate test plan TOML files
    Validate {
        /// Path to test plan file or directory
        #[arg(long)]
        plan: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example test plan
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("levelcheck=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Evaluate {
            plan,
            results,
            dynamic,
            format,
            output,
            config,
        } => commands::evaluate::execute(plan, results, dynamic, format, output, config),
        Commands::Difficulty { plan, config } => commands::difficulty::execute(plan, config),
        Commands::Flow {
            plan,
            outcomes,
            exhaustion,
            config,
        } => commands::flow::execute(plan, outcomes, exhaustion, config),
        Commands::Validate { plan, config } => commands::validate::execute(plan, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
