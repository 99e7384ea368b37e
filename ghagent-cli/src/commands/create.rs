//! Create an agent task and wait for its pull request.

use std::io::{Read, Write};

use anyhow::anyhow;
use clap::Args;
use ghagent_core::{CapiClient, Job, PollBackoff, AGENTS_HOME_URL};

use super::CommandError;
use crate::editor;
use crate::io::Io;
use crate::prompter::Prompter;
use crate::repo::{self, Repo};

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(value_name = "TASK", help = "The task description")]
    pub task: Option<String>,

    #[arg(
        short = 'F',
        long = "from-file",
        value_name = "FILE",
        conflicts_with = "task",
        help = "Read task description from a file (use \"-\" to read from standard input)"
    )]
    pub from_file: Option<String>,

    #[arg(
        long,
        value_name = "BRANCH",
        help = "The base branch for the agent's pull request"
    )]
    pub base: Option<String>,

    #[arg(short = 'R', long, value_name = "[HOST/]OWNER/REPO")]
    pub repo: Option<String>,
}

pub async fn run(
    client: &dyn CapiClient,
    io: &mut Io,
    prompter: &dyn Prompter,
    args: CreateArgs,
    mut backoff: PollBackoff,
) -> Result<(), CommandError> {
    let repo = repo::resolve(args.repo.as_deref()).map_err(|_| {
        CommandError::Other(anyhow!(
            "a repository is required; re-run in a repository or supply one with --repo owner/name"
        ))
    })?;

    let problem_statement = resolve_problem_statement(&args, io)?;

    if io.can_prompt() && !prompter.confirm("Submit agent task?", true)? {
        writeln!(io.err, "Canceled.")?;
        return Err(CommandError::Silent);
    }

    io.status(&format!("Creating agent task in {repo}..."));
    let job = client
        .create_job(
            &repo.owner,
            &repo.name,
            &problem_statement,
            args.base.as_deref(),
        )
        .await?;

    // The create response rarely carries the pull request already, but
    // when it does there is nothing to poll for.
    if job.has_pull_request() {
        writeln!(io.out, "{}", agent_session_web_url(&repo, &job))?;
        return Ok(());
    }

    match poll_job_for_pull_request(client, io, &repo, &job.id, &mut backoff).await? {
        Some(ready) => writeln!(io.out, "{}", agent_session_web_url(&repo, &ready))?,
        None => writeln!(
            io.out,
            "job {} queued. View progress: {}",
            job.id, AGENTS_HOME_URL
        )?,
    }

    Ok(())
}

fn resolve_problem_statement(args: &CreateArgs, io: &Io) -> Result<String, CommandError> {
    let raw = if let Some(task) = &args.task {
        task.clone()
    } else if let Some(file) = &args.from_file {
        if file == "-" {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        } else {
            std::fs::read_to_string(file)
                .map_err(|e| CommandError::Other(anyhow!("could not read {file}: {e}")))?
        }
    } else if io.can_prompt() {
        editor::edit_markdown("")?
    } else {
        return Err(CommandError::flag("a task description is required"));
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CommandError::flag("a task description is required"));
    }
    Ok(trimmed.to_string())
}

/// Poll until the job reports a pull request, the backoff budget runs
/// out, or a fetch fails. Fetch failures are reported and end polling
/// in the fallback state rather than failing the command.
async fn poll_job_for_pull_request(
    client: &dyn CapiClient,
    io: &mut Io,
    repo: &Repo,
    job_id: &str,
    backoff: &mut PollBackoff,
) -> Result<Option<Job>, CommandError> {
    loop {
        match client.get_job(&repo.owner, &repo.name, job_id).await {
            Ok(job) if job.has_pull_request() => return Ok(Some(job)),
            Ok(_) => {}
            Err(err) => {
                writeln!(io.err, "warning: failed to get job status: {err}")?;
                return Ok(None);
            }
        }

        match backoff.next_delay() {
            Some(delay) => tokio::time::sleep(delay).await,
            None => return Ok(None),
        }
    }
}

fn agent_session_web_url(repo: &Repo, job: &Job) -> String {
    let number = job.pull_request.as_ref().map(|pr| pr.number).unwrap_or(0);
    if job.session_id.is_empty() {
        format!("https://github.com/{}/{}/pull/{}", repo.owner, repo.name, number)
    } else {
        format!(
            "https://github.com/{}/{}/pull/{}/agent-sessions/{}",
            repo.owner, repo.name, number, job.session_id
        )
    }
}
