use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ghagent_cli::commands::{handle_agent_task_command, AgentTaskCommand, CommandError};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "ghagent")]
#[command(version = VERSION)]
#[command(about = "GitHub Copilot agent tasks from your terminal")]
#[command(long_about = r#"
ghagent drives GitHub Copilot coding agent tasks: create a task from a
problem statement, list the sessions working for you, and follow a
session's progress until its pull request is ready.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "agent-task",
        aliases = ["agent-tasks", "agent", "agents"],
        about = "Manage agent tasks (preview)"
    )]
    AgentTask {
        #[command(subcommand)]
        action: AgentTaskCommand,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::AgentTask { action } => handle_agent_task_command(action).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(CommandError::Silent) => ExitCode::FAILURE,
        Err(CommandError::Flag(message)) => {
            eprintln!("{message}");
            ExitCode::from(2)
        }
        Err(CommandError::Other(err)) => {
            eprintln!("{}: {}", "Error".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
