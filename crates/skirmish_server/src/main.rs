//! Headless skirmish server binary.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use skirmish_core::prelude::*;
use skirmish_server::{silent_dispatcher, GameRunner, JsonLinesConnection, Scenario};

#[derive(Parser)]
#[command(name = "skirmish_server", about = "Headless skirmish game server")]
struct Cli {
    /// Enable debug-level logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play a scenario, streaming the action feed as JSON lines.
    Run {
        /// Scenario file; the built-in meeting engagement when omitted.
        scenario: Option<PathBuf>,
        /// Pace turns against the wall clock.
        #[arg(long)]
        realtime: bool,
        /// Suppress the action feed; print only the summary.
        #[arg(long)]
        quiet: bool,
    },
    /// Play a scenario twice and check the replays match.
    Verify {
        /// Scenario file to verify.
        scenario: PathBuf,
    },
    /// Write the built-in scenario as a template to edit.
    Emit {
        /// Output path.
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Run {
            scenario,
            realtime,
            quiet,
        } => {
            let scenario = load_or_builtin(scenario.as_deref())?;
            let dispatcher = if quiet {
                silent_dispatcher()
            } else {
                ActionDispatcher::new(SessionRegistry::new(
                    Box::new(JsonLinesConnection::new(Side::Red, std::io::stdout())),
                    Box::new(JsonLinesConnection::new(Side::Blue, std::io::stdout())),
                ))
            };
            let runner = GameRunner::new(&scenario, dispatcher)?.with_realtime(realtime);
            let summary = runner.run_to_completion()?;
            println!(
                "outcome: {:?}, turns: {}, state: {:016x}",
                summary.outcome, summary.turns, summary.state_hash
            );
            Ok(())
        }
        Command::Verify { scenario } => {
            let scenario = Scenario::load(&scenario)?;
            let first = GameRunner::new(&scenario, silent_dispatcher())?.run_to_completion()?;
            let second = GameRunner::new(&scenario, silent_dispatcher())?.run_to_completion()?;
            if first == second {
                info!(
                    outcome = ?first.outcome,
                    turns = first.turns,
                    "replays match"
                );
                Ok(())
            } else {
                Err(format!("replays diverged: {first:?} vs {second:?}").into())
            }
        }
        Command::Emit { output } => {
            let scenario = Scenario::meeting_engagement();
            std::fs::write(&output, scenario.to_ron_string()?)?;
            info!(path = %output.display(), "scenario template written");
            Ok(())
        }
    }
}

fn load_or_builtin(path: Option<&std::path::Path>) -> Result<Scenario, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(Scenario::load(path)?),
        None => Ok(Scenario::meeting_engagement()),
    }
}
