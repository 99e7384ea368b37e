//! List agent tasks for the viewer or a repository.

use chrono::Utc;
use clap::Args;
use comfy_table::{presets::NOTHING, Cell, Table};
use ghagent_core::{CapiClient, Session, SessionState, AGENTS_HOME_URL};
use std::io::Write;

use super::CommandError;
use crate::browser::Browser;
use crate::io::Io;
use crate::output;
use crate::repo::{self, Repo};

#[derive(Args, Debug)]
pub struct ListArgs {
    #[arg(
        short = 'L',
        long,
        default_value_t = 30,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Maximum number of agent tasks to list"
    )]
    pub limit: u32,

    #[arg(short = 'w', long, help = "Open the agents page in the browser")]
    pub web: bool,

    #[arg(
        short = 'R',
        long,
        value_name = "[HOST/]OWNER/REPO",
        help = "List tasks for a specific repository"
    )]
    pub repo: Option<String>,
}

pub async fn run(
    client: &dyn CapiClient,
    io: &mut Io,
    browser: &dyn Browser,
    args: ListArgs,
) -> Result<(), CommandError> {
    if args.web {
        if io.stdout_tty {
            writeln!(
                io.err,
                "Opening {} in your browser.",
                output::display_url(AGENTS_HOME_URL)
            )?;
        }
        browser.browse(AGENTS_HOME_URL)?;
        return Ok(());
    }

    let scope = resolve_scope(io, args.repo.as_deref())?;

    io.status("Fetching agent tasks...");
    let sessions = match &scope {
        Some(repo) => {
            client
                .list_sessions_for_repo(&repo.owner, &repo.name, args.limit as usize)
                .await?
        }
        None => client.list_sessions_for_viewer(args.limit as usize).await?,
    };

    if sessions.is_empty() {
        writeln!(io.err, "no agent tasks found")?;
        return Err(CommandError::Silent);
    }

    if io.stdout_tty {
        print_table(io, &sessions)
    } else {
        print_rows(io, &sessions)
    }
}

/// An explicit `--repo` must parse; everything else degrades to
/// viewer-scope listing so the command stays useful outside a git
/// repository.
fn resolve_scope(io: &mut Io, flag: Option<&str>) -> Result<Option<Repo>, CommandError> {
    if let Some(spec) = flag {
        return Ok(Some(repo::parse(spec).map_err(CommandError::Other)?));
    }

    match repo::from_git_remote() {
        Ok(repo) if repo.is_canonical_host() => Ok(Some(repo)),
        Ok(repo) => {
            writeln!(
                io.err,
                "warning: {} is not on github.com; listing your agent tasks instead",
                repo
            )?;
            Ok(None)
        }
        Err(err) => {
            tracing::debug!("base repository not resolved: {err}");
            Ok(None)
        }
    }
}

fn print_table(io: &mut Io, sessions: &[Session]) -> Result<(), CommandError> {
    let now = Utc::now();

    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_header(vec![
        "SESSION ID",
        "PULL REQUEST",
        "REPO",
        "SESSION STATE",
        "CREATED",
    ]);

    for session in sessions {
        let Some((pr, repo_name)) = displayable_pull_request(session) else {
            continue;
        };

        let state = SessionState::from_raw(&session.state);
        let created = session
            .created_at
            .map(|t| output::fuzzy_ago(now, t))
            .unwrap_or_default();

        table.add_row(vec![
            Cell::new(&session.id),
            Cell::new(format!("#{}", pr.number))
                .fg(output::pr_table_color(&pr.state, pr.is_draft)),
            Cell::new(repo_name).fg(output::table_color(ghagent_core::ColorRole::Muted)),
            Cell::new(&session.state).fg(output::table_color(state.color_role())),
            Cell::new(created).fg(output::table_color(ghagent_core::ColorRole::Muted)),
        ]);
    }

    writeln!(io.out, "{table}")?;
    Ok(())
}

fn print_rows(io: &mut Io, sessions: &[Session]) -> Result<(), CommandError> {
    for session in sessions {
        let Some((pr, repo_name)) = displayable_pull_request(session) else {
            continue;
        };

        let created = session
            .created_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();

        writeln!(
            io.out,
            "{}\t#{}\t{}\t{}\t{}",
            session.id, pr.number, repo_name, session.state, created
        )?;
    }
    Ok(())
}

/// Sessions without a joined pull request are skipped in the listing.
fn displayable_pull_request(session: &Session) -> Option<(&ghagent_core::PullRequest, &str)> {
    if session.resource_type != "pull" {
        return None;
    }
    let pr = session.pull_request.as_ref()?;
    let repo_name = pr.repository.as_ref()?.name_with_owner.as_str();
    Some((pr, repo_name))
}
