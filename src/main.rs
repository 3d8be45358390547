//! Command-line entry point for the wizard agent.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::{ArgGroup, Parser};
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use wizard_agent::{Agent, AgentConfig, repl};

#[derive(Debug, Parser)]
#[command(
    name = "wizard-agent",
    version,
    about = "LLM agent with a safe calculator and Wizard World potion lookup"
)]
#[command(group(ArgGroup::new("mode").required(true)))]
struct Cli {
    /// Run a single query and print the answer.
    #[arg(short, long, group = "mode", value_name = "TEXT")]
    query: Option<String>,

    /// Start an interactive session.
    #[arg(long, group = "mode")]
    repl: bool,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wizard_agent={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> wizard_agent::Result<()> {
    let config = AgentConfig::from_env()?;
    let agent = Agent::from_config(&config)?;

    if let Some(query) = cli.query {
        let answer = agent.run(&query).await?;
        println!("{}", repl::format_answer(&answer));
        return Ok(());
    }

    println!(
        "wizard-agent ({}). Empty line, \"exit\", or Ctrl-D to leave.",
        agent.model_id()
    );

    let stdin = io::stdin().lock();
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    let agent = &agent;
    repl::run_loop(stdin, &mut stdout, &mut stderr, |query: String| async move {
        agent.run(&query).await
    })
    .await
}
