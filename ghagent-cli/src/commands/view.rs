//! View an agent task session: summary, logs, or the browser.

use std::cell::Cell;
use std::io::Write;

use anyhow::anyhow;
use chrono::Utc;
use clap::Args;
use colored::Colorize;
use ghagent_core::{
    is_enterprise, CapiClient, LogRenderer, Selector, Session, SessionState, AGENTS_HOME_URL,
    DEFAULT_LOG_POLL_INTERVAL,
};

use super::CommandError;
use crate::browser::Browser;
use crate::io::Io;
use crate::output;
use crate::prompter::Prompter;
use crate::repo;

const SESSIONS_PER_PULL_REQUEST: usize = 40;

#[derive(Args, Debug)]
pub struct ViewArgs {
    #[arg(
        value_name = "SELECTOR",
        help = "Session ID, PR number, PR URL, PR reference, or PR branch"
    )]
    pub selector: Option<String>,

    #[arg(short = 'w', long, help = "Open the agent task in the browser")]
    pub web: bool,

    #[arg(long, help = "Show agent session logs")]
    pub log: bool,

    #[arg(long, help = "Follow agent session logs")]
    pub follow: bool,

    #[arg(short = 'R', long, value_name = "[HOST/]OWNER/REPO")]
    pub repo: Option<String>,
}

pub async fn run(
    client: &dyn CapiClient,
    io: &mut Io,
    prompter: &dyn Prompter,
    browser: &dyn Browser,
    args: ViewArgs,
) -> Result<(), CommandError> {
    if args.follow && !args.log {
        return Err(CommandError::flag("--log is required when providing --follow"));
    }

    io.status("Fetching agent session...");

    let session = match &args.selector {
        Some(raw) => match ghagent_core::classify(raw) {
            Selector::SessionId(id) => {
                let session = fetch_session(client, io, &id).await?;
                if args.web {
                    return open_session_in_browser(io, browser, &session);
                }
                session
            }
            selector => {
                return view_by_pull_request(client, io, prompter, browser, &args, Some(selector))
                    .await;
            }
        },
        None => {
            if !io.can_prompt() {
                return Err(CommandError::Other(anyhow!(
                    "session ID is required when not running interactively"
                )));
            }
            return view_by_pull_request(client, io, prompter, browser, &args, None).await;
        }
    };

    print_session(io, &args, &session)?;

    if args.log {
        print_logs(client, io, &args, &session.id).await?;
    }
    Ok(())
}

async fn fetch_session(
    client: &dyn CapiClient,
    io: &mut Io,
    id: &str,
) -> Result<Session, CommandError> {
    match client.get_session(id).await {
        Ok(session) => Ok(session),
        Err(err) if err.is_not_found() => {
            writeln!(io.err, "session not found")?;
            Err(CommandError::Silent)
        }
        Err(err) => Err(err.into()),
    }
}

/// Resolve the selector to a pull request, list its sessions, and pick
/// one.
async fn view_by_pull_request(
    client: &dyn CapiClient,
    io: &mut Io,
    prompter: &dyn Prompter,
    browser: &dyn Browser,
    args: &ViewArgs,
    selector: Option<Selector>,
) -> Result<(), CommandError> {
    let (pr_id, pr_url) = resolve_pull_request(client, args, selector).await?;

    let sessions = client
        .list_sessions_by_resource("pull", pr_id, SESSIONS_PER_PULL_REQUEST)
        .await
        .map_err(|e| CommandError::Other(anyhow!("failed to list sessions for pull request: {e}")))?;

    if sessions.is_empty() {
        writeln!(io.err, "no session found for pull request")?;
        return Err(CommandError::Silent);
    }

    if args.web {
        // The PR exists and has sessions, so its agent-sessions index
        // page is safe to open; the GUI handles session choice.
        let web_url = format!("{pr_url}/agent-sessions");
        if io.stdout_tty {
            writeln!(io.err, "Opening {} in your browser.", output::display_url(&web_url))?;
        }
        browser.browse(&web_url)?;
        return Ok(());
    }

    let session = choose_session(io, prompter, sessions)?;
    print_session(io, args, &session)?;

    if args.log {
        print_logs(client, io, args, &session.id).await?;
    }
    Ok(())
}

async fn resolve_pull_request(
    client: &dyn CapiClient,
    args: &ViewArgs,
    selector: Option<Selector>,
) -> Result<(i64, String), CommandError> {
    match selector {
        Some(Selector::FullReference { owner, repo, number }) => {
            // References carry no hostname; the base repo supplies it.
            let base = base_repo(args)?;
            let resolved = client
                .get_pull_request_database_id(&base.host, &owner, &repo, number)
                .await
                .map_err(|e| CommandError::Other(anyhow!("failed to fetch pull request: {e}")))?;
            Ok(resolved)
        }
        Some(Selector::PullRequestUrl { host, owner, repo, number }) => {
            reject_enterprise(&host)?;
            let resolved = client
                .get_pull_request_database_id(&host, &owner, &repo, number)
                .await
                .map_err(|e| CommandError::Other(anyhow!("failed to fetch pull request: {e}")))?;
            Ok(resolved)
        }
        Some(Selector::PullRequestNumber(number)) => {
            let base = base_repo(args)?;
            let resolved = client
                .get_pull_request_database_id(&base.host, &base.owner, &base.name, number)
                .await
                .map_err(|e| CommandError::Other(anyhow!("failed to fetch pull request: {e}")))?;
            Ok(resolved)
        }
        Some(Selector::Branch(branch)) => {
            let base = base_repo(args)?;
            let resolved = client
                .find_pull_request_by_branch(&base.host, &base.owner, &base.name, &branch)
                .await
                .map_err(|e| CommandError::Other(anyhow!("failed to fetch pull request: {e}")))?;
            Ok(resolved)
        }
        Some(Selector::SessionId(_)) => unreachable!("handled by the caller"),
        None => {
            // No selector: the current branch's pull request.
            let base = base_repo(args)?;
            let branch = repo::current_branch().map_err(CommandError::Other)?;
            let resolved = client
                .find_pull_request_by_branch(&base.host, &base.owner, &base.name, &branch)
                .await
                .map_err(|e| CommandError::Other(anyhow!("failed to fetch pull request: {e}")))?;
            Ok(resolved)
        }
    }
}

fn base_repo(args: &ViewArgs) -> Result<repo::Repo, CommandError> {
    let base = repo::resolve(args.repo.as_deref()).map_err(|_| {
        CommandError::Other(anyhow!(
            "a repository is required; re-run in a repository or supply one with --repo owner/name"
        ))
    })?;
    reject_enterprise(&base.host)?;
    Ok(base)
}

fn reject_enterprise(host: &str) -> Result<(), CommandError> {
    if is_enterprise(host) {
        return Err(CommandError::Other(anyhow!(
            "agent tasks are not supported on this host: {host}"
        )));
    }
    Ok(())
}

fn choose_session(
    io: &mut Io,
    prompter: &dyn Prompter,
    mut sessions: Vec<Session>,
) -> Result<Session, CommandError> {
    if sessions.len() == 1 {
        return Ok(sessions.remove(0));
    }

    let now = Utc::now();
    let options: Vec<String> = sessions
        .iter()
        .map(|s| {
            let state = SessionState::from_raw(&s.state);
            let when = s
                .created_at
                .map(|t| output::fuzzy_ago(now, t))
                .unwrap_or_default();
            format!("{} {} • {}", state.symbol(), s.name, when)
        })
        .collect();

    if !io.can_prompt() {
        // Non-interactive callers get the newest listing order as-is.
        return Ok(sessions.remove(0));
    }

    let selected = prompter.select("Select a session", &options)?;
    Ok(sessions.remove(selected))
}

fn print_session(io: &mut Io, args: &ViewArgs, session: &Session) -> Result<(), CommandError> {
    let styled = io.stdout_tty;
    let state = SessionState::from_raw(&session.state);
    let state_text = if styled {
        output::paint(state.color_role(), state.display()).to_string()
    } else {
        state.display().to_string()
    };

    if let Some(pr) = &session.pull_request {
        let repo_name = pr
            .repository
            .as_ref()
            .map(|r| r.name_with_owner.as_str())
            .unwrap_or_default();
        let number = format!("#{}", pr.number);
        let number = if styled {
            output::paint_pr_state(&pr.state, pr.is_draft, &number).to_string()
        } else {
            number
        };
        let title = if styled {
            pr.title.bold().to_string()
        } else {
            pr.title.clone()
        };
        writeln!(io.out, "{state_text} • {title} • {repo_name}{number}")?;
    } else {
        // Freshly created sessions may not have a pull request yet.
        writeln!(io.out, "{state_text}")?;
    }

    let when = session
        .created_at
        .map(|t| output::fuzzy_ago(Utc::now(), t))
        .unwrap_or_default();
    match &session.user {
        Some(user) => writeln!(io.out, "Started on behalf of {} {}", user.login, when)?,
        None => writeln!(io.out, "Started {when}")?,
    }

    if !args.log {
        writeln!(io.out)?;
        writeln!(
            io.out,
            "For detailed session logs, try:\nghagent agent-task view '{}' --log",
            session.id
        )?;
    } else if !args.follow {
        writeln!(io.out)?;
        writeln!(
            io.out,
            "To follow session logs, try:\nghagent agent-task view '{}' --log --follow",
            session.id
        )?;
    }

    if let Some(pr) = &session.pull_request {
        let trailer = format!(
            "View this session on GitHub:\n{}/agent-sessions/{}",
            pr.url, session.id
        );
        writeln!(io.out)?;
        if styled {
            writeln!(io.out, "{}", trailer.dimmed())?;
        } else {
            writeln!(io.out, "{trailer}")?;
        }
    }

    Ok(())
}

fn open_session_in_browser(
    io: &mut Io,
    browser: &dyn Browser,
    session: &Session,
) -> Result<(), CommandError> {
    // The agents home GUI cannot focus a single session, so a session
    // without a pull request falls back to the home page.
    let url = match &session.pull_request {
        Some(pr) => format!("{}/agent-sessions/{}", pr.url, session.id),
        None => AGENTS_HOME_URL.to_string(),
    };

    if io.stdout_tty {
        writeln!(io.err, "Opening {} in your browser.", output::display_url(&url))?;
    }
    browser.browse(&url)?;
    Ok(())
}

async fn print_logs(
    client: &dyn CapiClient,
    io: &mut Io,
    args: &ViewArgs,
    session_id: &str,
) -> Result<(), CommandError> {
    let renderer = LogRenderer::new(io.stdout_tty);
    writeln!(io.out)?;

    if args.follow {
        let called = Cell::new(false);
        let fetcher = || {
            let wait = called.replace(true);
            async move {
                if wait {
                    tokio::time::sleep(DEFAULT_LOG_POLL_INTERVAL).await;
                }
                client.get_session_logs(session_id).await
            }
        };

        renderer.follow(fetcher, io.out.as_mut()).await?;
        return Ok(());
    }

    let raw = client
        .get_session_logs(session_id)
        .await
        .map_err(|e| CommandError::Other(anyhow!("failed to fetch session logs: {e}")))?;
    renderer.render(&raw, io.out.as_mut())?;
    Ok(())
}
