//! graphwalk: command shell for the in-memory property graph.
//!
//! Usage:
//!   `graphwalk repl --load office.json`
//!   `graphwalk run setup.gw --save office.json`
//!   `graphwalk demo`

mod command;
mod load;
mod repl;
mod session;
mod settings;
mod status;
mod traverse;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::session::Session;
use crate::settings::{OutputFormat, Settings};

#[derive(Parser)]
#[command(name = "graphwalk", version, about = "In-memory property graph with pattern traversal")]
struct Cli {
    /// Log filter used when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "GRAPHWALK_LOG", default_value = "warn")]
    log_level: String,

    /// Maximum paths a TRAVERSE returns (0 = unlimited)
    #[arg(long, global = true, env = "GRAPHWALK_MAX_PATHS", default_value_t = 0)]
    max_paths: usize,

    /// Maximum hops in a TRAVERSE pattern
    #[arg(long, global = true, env = "GRAPHWALK_MAX_HOPS", default_value_t = 16)]
    max_hops: usize,

    /// Result format
    #[arg(long, global = true, env = "GRAPHWALK_OUTPUT", value_enum, default_value_t = OutputFormat::Pretty)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive shell
    Repl {
        /// Graph document to load first
        #[arg(long)]
        load: Option<PathBuf>,
    },

    /// Execute a command script, one command per line
    Run {
        script: PathBuf,

        /// Graph document to load before the script
        #[arg(long)]
        load: Option<PathBuf>,

        /// Export the graph here after the script
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Run the built-in Person/Company example
    Demo,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings {
        max_paths: cli.max_paths,
        max_hops: cli.max_hops,
        output: cli.output,
    }
    .validated()?;
    let mut session = Session::new(settings);

    match cli.command {
        Commands::Repl { load } => {
            if let Some(path) = load {
                session.load(&path)?;
            }
            repl::run(&mut session)
        }
        Commands::Run { script, load, save } => {
            if let Some(path) = load {
                session.load(&path)?;
            }
            let failures = repl::run_script(&mut session, &script)?;
            if let Some(path) = save {
                session.save(&path)?;
            }
            if failures > 0 {
                bail!("{} command(s) in {} failed", failures, script.display());
            }
            Ok(())
        }
        Commands::Demo => {
            let failures = repl::run_lines(
                &mut session,
                repl::DEMO.as_bytes(),
                &mut io::stdout().lock(),
                &mut io::stderr().lock(),
            )?;
            if failures > 0 {
                bail!("{} demo command(s) failed", failures);
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("graphwalk: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
