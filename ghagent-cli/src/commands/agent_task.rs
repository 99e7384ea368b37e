//! The `agent-task` command umbrella: the OAuth gate runs here, before
//! any subcommand touches the API.

use clap::Subcommand;
use ghagent_core::{require_oauth_token, CapiHttpClient, HostConfig, PollBackoff};

use super::{create, list, view, CommandError};
use crate::browser::SystemBrowser;
use crate::io::Io;
use crate::prompter::StdinPrompter;

#[derive(Subcommand, Debug)]
pub enum AgentTaskCommand {
    #[command(about = "List agent tasks")]
    List(list::ListArgs),

    #[command(about = "Create an agent task")]
    Create(create::CreateArgs),

    #[command(about = "View an agent task session")]
    View(view::ViewArgs),
}

pub async fn handle_agent_task_command(action: AgentTaskCommand) -> Result<(), CommandError> {
    let cfg = HostConfig::load().map_err(|e| CommandError::Other(e.into()))?;
    let token = require_oauth_token(&cfg).map_err(|e| CommandError::Other(e.into()))?;

    let client = CapiHttpClient::new(token.token);
    let mut io = Io::system();
    let prompter = StdinPrompter;
    let browser = SystemBrowser;

    match action {
        AgentTaskCommand::List(args) => list::run(&client, &mut io, &browser, args).await,
        AgentTaskCommand::Create(args) => {
            create::run(&client, &mut io, &prompter, args, PollBackoff::new()).await
        }
        AgentTaskCommand::View(args) => {
            view::run(&client, &mut io, &prompter, &browser, args).await
        }
    }
}
