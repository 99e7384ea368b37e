use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};

use ghagent_cli::browser::RecordingBrowser;
use ghagent_cli::commands::{create, list, view, CommandError};
use ghagent_cli::io::Io;
use ghagent_cli::prompter::StaticPrompter;
use ghagent_core::{
    AgentTaskError, AgentTaskResult, CapiClient, Job, PollBackoff, PullRequest,
    PullRequestRepository, Session, User,
};

fn completed_session(id: &str, pr_number: i64) -> Session {
    Session {
        id: id.to_string(),
        name: "Fix the flaky test".to_string(),
        user_id: 583231,
        agent_id: 1,
        state: "completed".to_string(),
        owner_id: 10,
        repo_id: 1000,
        resource_type: "pull".to_string(),
        resource_id: 2000,
        last_updated_at: None,
        created_at: Some(Utc::now() - ChronoDuration::hours(6)),
        completed_at: None,
        event_url: String::new(),
        event_type: String::new(),
        pull_request: Some(PullRequest {
            id: "PR_x".to_string(),
            full_database_id: "2000".to_string(),
            number: pr_number,
            title: "Fix the flaky test".to_string(),
            state: "OPEN".to_string(),
            is_draft: false,
            url: format!("https://github.com/OWNER/REPO/pull/{pr_number}"),
            body: String::new(),
            created_at: None,
            updated_at: None,
            closed_at: None,
            merged_at: None,
            repository: Some(PullRequestRepository {
                name_with_owner: "OWNER/REPO".to_string(),
            }),
        }),
        user: Some(User {
            login: "octocat".to_string(),
            name: None,
            database_id: 583231,
        }),
    }
}

fn job(id: &str, session_id: &str, pr_number: Option<i64>) -> Job {
    let mut value = serde_json::json!({
        "job_id": id,
        "session_id": session_id,
    });
    if let Some(number) = pr_number {
        value["pull_request"] = serde_json::json!({"id": 1, "number": number});
    }
    serde_json::from_value(value).unwrap()
}

#[derive(Default)]
struct MockCapiClient {
    viewer_sessions: Vec<Session>,
    repo_sessions: Vec<Session>,
    resource_sessions: Vec<Session>,
    session: Option<Session>,
    session_not_found: bool,
    logs: Vec<u8>,
    created_job: Option<Job>,
    polled_job: Option<Job>,
    pr_database_id: Option<(i64, String)>,

    create_calls: AtomicUsize,
    get_job_calls: AtomicUsize,
    resource_queries: Mutex<Vec<(String, i64, usize)>>,
    pr_lookup_hosts: Mutex<Vec<String>>,
}

#[async_trait]
impl CapiClient for MockCapiClient {
    async fn list_sessions_for_viewer(&self, limit: usize) -> AgentTaskResult<Vec<Session>> {
        Ok(self.viewer_sessions.iter().take(limit).cloned().collect())
    }

    async fn list_sessions_for_repo(
        &self,
        _owner: &str,
        _repo: &str,
        limit: usize,
    ) -> AgentTaskResult<Vec<Session>> {
        Ok(self.repo_sessions.iter().take(limit).cloned().collect())
    }

    async fn list_sessions_by_resource(
        &self,
        resource_type: &str,
        resource_id: i64,
        limit: usize,
    ) -> AgentTaskResult<Vec<Session>> {
        self.resource_queries
            .lock()
            .unwrap()
            .push((resource_type.to_string(), resource_id, limit));
        Ok(self.resource_sessions.iter().take(limit).cloned().collect())
    }

    async fn get_session(&self, _id: &str) -> AgentTaskResult<Session> {
        if self.session_not_found {
            return Err(AgentTaskError::SessionNotFound);
        }
        self.session
            .clone()
            .ok_or_else(|| AgentTaskError::Api("no session scripted".to_string()))
    }

    async fn get_session_logs(&self, _id: &str) -> AgentTaskResult<Vec<u8>> {
        Ok(self.logs.clone())
    }

    async fn create_job(
        &self,
        _owner: &str,
        _repo: &str,
        _problem_statement: &str,
        _base_branch: Option<&str>,
    ) -> AgentTaskResult<Job> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.created_job
            .clone()
            .ok_or_else(|| AgentTaskError::Api("no job scripted".to_string()))
    }

    async fn get_job(&self, _owner: &str, _repo: &str, _job_id: &str) -> AgentTaskResult<Job> {
        self.get_job_calls.fetch_add(1, Ordering::SeqCst);
        self.polled_job
            .clone()
            .ok_or_else(|| AgentTaskError::Api("no job scripted".to_string()))
    }

    async fn get_pull_request_database_id(
        &self,
        host: &str,
        _owner: &str,
        _repo: &str,
        _number: i64,
    ) -> AgentTaskResult<(i64, String)> {
        self.pr_lookup_hosts.lock().unwrap().push(host.to_string());
        self.pr_database_id
            .clone()
            .ok_or_else(|| AgentTaskError::Api("no pull request scripted".to_string()))
    }

    async fn find_pull_request_by_branch(
        &self,
        host: &str,
        _owner: &str,
        _repo: &str,
        _branch: &str,
    ) -> AgentTaskResult<(i64, String)> {
        self.pr_lookup_hosts.lock().unwrap().push(host.to_string());
        self.pr_database_id
            .clone()
            .ok_or_else(|| AgentTaskError::Api("no pull request scripted".to_string()))
    }
}

fn list_args(extra: &[&str]) -> list::ListArgs {
    parse_args::<WrapList>(extra).args
}

#[derive(clap::Parser)]
struct WrapList {
    #[command(flatten)]
    args: list::ListArgs,
}

#[derive(clap::Parser)]
struct WrapCreate {
    #[command(flatten)]
    args: create::CreateArgs,
}

#[derive(clap::Parser)]
struct WrapView {
    #[command(flatten)]
    args: view::ViewArgs,
}

fn parse_args<T: clap::Parser>(extra: &[&str]) -> T {
    T::try_parse_from(std::iter::once("test").chain(extra.iter().copied())).unwrap()
}

fn zero_backoff(attempts: u32) -> PollBackoff {
    PollBackoff::with_policy(Duration::ZERO, 1.5, Duration::ZERO, Duration::from_secs(10))
        .with_max_attempts(attempts)
}

mod list_command {
    use super::*;

    #[tokio::test]
    async fn test_tty_table_output() {
        let client = MockCapiClient {
            repo_sessions: vec![completed_session("s1", 42)],
            ..Default::default()
        };
        let (mut io, out, _err) = Io::test();
        io.stdout_tty = true;
        let browser = RecordingBrowser::default();

        list::run(&client, &mut io, &browser, list_args(&["--repo", "OWNER/REPO"]))
            .await
            .unwrap();

        let table = out.contents();
        assert!(table.contains("SESSION ID"), "missing header: {table}");
        assert!(table.contains("PULL REQUEST"));
        assert!(table.contains("s1"));
        assert!(table.contains("#42"));
        assert!(table.contains("OWNER/REPO"));
        assert!(table.contains("completed"));
        assert!(table.contains("about 6 hours ago"));
    }

    #[tokio::test]
    async fn test_non_tty_rows_are_tab_separated() {
        let client = MockCapiClient {
            repo_sessions: vec![completed_session("s1", 42)],
            ..Default::default()
        };
        let (mut io, out, _err) = Io::test();
        let browser = RecordingBrowser::default();

        list::run(&client, &mut io, &browser, list_args(&["--repo", "OWNER/REPO"]))
            .await
            .unwrap();

        let rows = out.contents();
        assert!(!rows.contains("SESSION ID"));
        let first = rows.lines().next().unwrap();
        let fields: Vec<&str> = first.split('\t').collect();
        assert_eq!(fields[0], "s1");
        assert_eq!(fields[1], "#42");
        assert_eq!(fields[2], "OWNER/REPO");
        assert_eq!(fields[3], "completed");
        // ISO-8601 timestamp
        assert!(fields[4].contains('T'), "timestamp not ISO-8601: {}", fields[4]);
    }

    #[tokio::test]
    async fn test_empty_result_is_a_silent_failure() {
        let client = MockCapiClient::default();
        let (mut io, out, err) = Io::test();
        let browser = RecordingBrowser::default();

        let result = list::run(&client, &mut io, &browser, list_args(&["--repo", "OWNER/REPO"]))
            .await;

        assert!(matches!(result, Err(CommandError::Silent)));
        assert_eq!(out.contents(), "");
        assert_eq!(err.contents(), "no agent tasks found\n");
    }

    #[tokio::test]
    async fn test_web_short_circuits_to_browser() {
        let client = MockCapiClient {
            viewer_sessions: vec![completed_session("s1", 42)],
            ..Default::default()
        };
        let (mut io, out, _err) = Io::test();
        let browser = RecordingBrowser::default();

        list::run(&client, &mut io, &browser, list_args(&["--web"]))
            .await
            .unwrap();

        assert_eq!(out.contents(), "");
        assert_eq!(
            *browser.opened.lock().unwrap(),
            vec!["https://github.com/copilot/agents"]
        );
    }

    #[tokio::test]
    async fn test_malformed_repo_flag_is_an_error() {
        let client = MockCapiClient::default();
        let (mut io, _out, _err) = Io::test();
        let browser = RecordingBrowser::default();

        let result = list::run(&client, &mut io, &browser, list_args(&["--repo", "notaspec"]))
            .await;
        assert!(matches!(result, Err(CommandError::Other(_))));
    }
}

mod create_command {
    use super::*;

    #[tokio::test]
    async fn test_immediate_pull_request_prints_session_url() {
        let client = MockCapiClient {
            created_job: Some(job("job123", "sess1", Some(42))),
            ..Default::default()
        };
        let (mut io, out, _err) = Io::test();
        let prompter = StaticPrompter {
            confirm_answer: true,
            selection: 0,
        };

        create::run(
            &client,
            &mut io,
            &prompter,
            parse_args::<WrapCreate>(&["Fix the flaky test", "--repo", "OWNER/REPO"]).args,
            zero_backoff(3),
        )
        .await
        .unwrap();

        assert_eq!(
            out.contents(),
            "https://github.com/OWNER/REPO/pull/42/agent-sessions/sess1\n"
        );
        assert_eq!(client.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.get_job_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_polling_exhaustion_prints_fallback_url() {
        let client = MockCapiClient {
            created_job: Some(job("jobABC", "", None)),
            polled_job: Some(job("jobABC", "", None)),
            ..Default::default()
        };
        let (mut io, out, _err) = Io::test();
        let prompter = StaticPrompter {
            confirm_answer: true,
            selection: 0,
        };

        create::run(
            &client,
            &mut io,
            &prompter,
            parse_args::<WrapCreate>(&["Do the thing", "--repo", "OWNER/REPO"]).args,
            zero_backoff(3),
        )
        .await
        .unwrap();

        assert_eq!(
            out.contents(),
            "job jobABC queued. View progress: https://github.com/copilot/agents\n"
        );
        // One create plus the initial poll and three retries.
        assert_eq!(client.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.get_job_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_polling_stops_when_pull_request_appears() {
        let client = MockCapiClient {
            created_job: Some(job("job1", "", None)),
            polled_job: Some(job("job1", "sess9", Some(7))),
            ..Default::default()
        };
        let (mut io, out, _err) = Io::test();
        let prompter = StaticPrompter {
            confirm_answer: true,
            selection: 0,
        };

        create::run(
            &client,
            &mut io,
            &prompter,
            parse_args::<WrapCreate>(&["Do the thing", "--repo", "OWNER/REPO"]).args,
            zero_backoff(3),
        )
        .await
        .unwrap();

        assert_eq!(
            out.contents(),
            "https://github.com/OWNER/REPO/pull/7/agent-sessions/sess9\n"
        );
        assert_eq!(client.get_job_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_description_is_a_flag_error() {
        let client = MockCapiClient::default();
        let (mut io, _out, _err) = Io::test();
        let prompter = StaticPrompter {
            confirm_answer: true,
            selection: 0,
        };

        let result = create::run(
            &client,
            &mut io,
            &prompter,
            parse_args::<WrapCreate>(&["--repo", "OWNER/REPO"]).args,
            zero_backoff(3),
        )
        .await;

        match result {
            Err(CommandError::Flag(message)) => {
                assert_eq!(message, "a task description is required")
            }
            other => panic!("expected flag error, got {other:?}"),
        }
        assert_eq!(client.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_whitespace_description_is_rejected() {
        let client = MockCapiClient::default();
        let (mut io, _out, _err) = Io::test();
        let prompter = StaticPrompter {
            confirm_answer: true,
            selection: 0,
        };

        let result = create::run(
            &client,
            &mut io,
            &prompter,
            parse_args::<WrapCreate>(&["   \n\t  ", "--repo", "OWNER/REPO"]).args,
            zero_backoff(3),
        )
        .await;

        assert!(matches!(result, Err(CommandError::Flag(_))));
    }
}

mod view_command {
    use super::*;

    #[tokio::test]
    async fn test_session_not_found_is_silent() {
        let client = MockCapiClient {
            session_not_found: true,
            ..Default::default()
        };
        let (mut io, out, err) = Io::test();
        let prompter = StaticPrompter {
            confirm_answer: true,
            selection: 0,
        };
        let browser = RecordingBrowser::default();

        let result = view::run(
            &client,
            &mut io,
            &prompter,
            &browser,
            parse_args::<WrapView>(&["e2fa49d2-f164-4a56-ab99-498090b8fcdf"]).args,
        )
        .await;

        assert!(matches!(result, Err(CommandError::Silent)));
        assert_eq!(out.contents(), "");
        assert_eq!(err.contents(), "session not found\n");
    }

    #[tokio::test]
    async fn test_view_by_reference_prints_summary() {
        let client = MockCapiClient {
            pr_database_id: Some((999, "https://github.com/OWNER/REPO/pull/42".to_string())),
            resource_sessions: vec![completed_session(
                "e2fa49d2-f164-4a56-ab99-498090b8fcdf",
                42,
            )],
            ..Default::default()
        };
        let (mut io, out, _err) = Io::test();
        let prompter = StaticPrompter {
            confirm_answer: true,
            selection: 0,
        };
        let browser = RecordingBrowser::default();

        view::run(
            &client,
            &mut io,
            &prompter,
            &browser,
            parse_args::<WrapView>(&["OWNER/REPO#42", "--repo", "OWNER/REPO"]).args,
        )
        .await
        .unwrap();

        let queries = client.resource_queries.lock().unwrap();
        assert_eq!(*queries, vec![("pull".to_string(), 999, 40)]);
        assert_eq!(*client.pr_lookup_hosts.lock().unwrap(), vec!["github.com"]);

        let summary = out.contents();
        assert!(
            summary.contains("Completed • Fix the flaky test • OWNER/REPO#42"),
            "summary was: {summary}"
        );
        assert!(summary.contains("Started on behalf of octocat about 6 hours ago"));
        assert!(summary.contains(
            "https://github.com/OWNER/REPO/pull/42/agent-sessions/e2fa49d2-f164-4a56-ab99-498090b8fcdf"
        ));
    }

    #[tokio::test]
    async fn test_no_sessions_for_pull_request_is_silent() {
        let client = MockCapiClient {
            pr_database_id: Some((999, "https://github.com/OWNER/REPO/pull/42".to_string())),
            ..Default::default()
        };
        let (mut io, _out, err) = Io::test();
        let prompter = StaticPrompter {
            confirm_answer: true,
            selection: 0,
        };
        let browser = RecordingBrowser::default();

        let result = view::run(
            &client,
            &mut io,
            &prompter,
            &browser,
            parse_args::<WrapView>(&["OWNER/REPO#42", "--repo", "OWNER/REPO"]).args,
        )
        .await;

        assert!(matches!(result, Err(CommandError::Silent)));
        assert_eq!(err.contents(), "no session found for pull request\n");
    }

    #[tokio::test]
    async fn test_reference_without_base_repo_is_an_error() {
        // Outside a git repository and without --repo there is no host
        // to resolve the reference against.
        let client = MockCapiClient {
            pr_database_id: Some((999, "https://github.com/OWNER/REPO/pull/42".to_string())),
            ..Default::default()
        };
        let (mut io, _out, _err) = Io::test();
        let prompter = StaticPrompter {
            confirm_answer: true,
            selection: 0,
        };
        let browser = RecordingBrowser::default();

        let result = view::run(
            &client,
            &mut io,
            &prompter,
            &browser,
            parse_args::<WrapView>(&["OWNER/REPO#42"]).args,
        )
        .await;

        match result {
            Err(CommandError::Other(err)) => {
                assert!(err.to_string().contains("a repository is required"))
            }
            other => panic!("expected repository error, got {other:?}"),
        }
        assert!(client.pr_lookup_hosts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reference_with_enterprise_base_repo_rejected() {
        let client = MockCapiClient {
            pr_database_id: Some((999, "https://github.com/OWNER/REPO/pull/42".to_string())),
            ..Default::default()
        };
        let (mut io, _out, _err) = Io::test();
        let prompter = StaticPrompter {
            confirm_answer: true,
            selection: 0,
        };
        let browser = RecordingBrowser::default();

        let result = view::run(
            &client,
            &mut io,
            &prompter,
            &browser,
            parse_args::<WrapView>(&["OWNER/REPO#42", "--repo", "github.example.com/OWNER/REPO"])
                .args,
        )
        .await;

        match result {
            Err(CommandError::Other(err)) => {
                assert!(err.to_string().contains("not supported on this host"))
            }
            other => panic!("expected host error, got {other:?}"),
        }
        assert!(client.pr_lookup_hosts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_web_opens_session_page() {
        let client = MockCapiClient {
            session: Some(completed_session("e2fa49d2-f164-4a56-ab99-498090b8fcdf", 42)),
            ..Default::default()
        };
        let (mut io, out, _err) = Io::test();
        let prompter = StaticPrompter {
            confirm_answer: true,
            selection: 0,
        };
        let browser = RecordingBrowser::default();

        view::run(
            &client,
            &mut io,
            &prompter,
            &browser,
            parse_args::<WrapView>(&["e2fa49d2-f164-4a56-ab99-498090b8fcdf", "--web"]).args,
        )
        .await
        .unwrap();

        assert_eq!(out.contents(), "");
        assert_eq!(
            *browser.opened.lock().unwrap(),
            vec!["https://github.com/OWNER/REPO/pull/42/agent-sessions/e2fa49d2-f164-4a56-ab99-498090b8fcdf"]
        );
    }

    #[tokio::test]
    async fn test_enterprise_pr_url_rejected() {
        let client = MockCapiClient::default();
        let (mut io, _out, _err) = Io::test();
        let prompter = StaticPrompter {
            confirm_answer: true,
            selection: 0,
        };
        let browser = RecordingBrowser::default();

        let result = view::run(
            &client,
            &mut io,
            &prompter,
            &browser,
            parse_args::<WrapView>(&["https://github.example.com/OWNER/REPO/pull/42"]).args,
        )
        .await;

        match result {
            Err(CommandError::Other(err)) => {
                assert!(err.to_string().contains("not supported on this host"))
            }
            other => panic!("expected host error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_follow_requires_log() {
        let client = MockCapiClient::default();
        let (mut io, _out, _err) = Io::test();
        let prompter = StaticPrompter {
            confirm_answer: true,
            selection: 0,
        };
        let browser = RecordingBrowser::default();

        let result = view::run(
            &client,
            &mut io,
            &prompter,
            &browser,
            parse_args::<WrapView>(&["e2fa49d2-f164-4a56-ab99-498090b8fcdf", "--follow"]).args,
        )
        .await;

        match result {
            Err(CommandError::Flag(message)) => {
                assert_eq!(message, "--log is required when providing --follow")
            }
            other => panic!("expected flag error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_log_renders_session_logs() {
        let logs = concat!(
            "data: {\"object\":\"chat.completion.chunk\",\"choices\":[",
            "{\"delta\":{\"role\":\"assistant\",\"content\":\"All done.\"},\"finish_reason\":\"stop\"}]}\n"
        );
        let client = MockCapiClient {
            session: Some(completed_session("e2fa49d2-f164-4a56-ab99-498090b8fcdf", 42)),
            logs: logs.as_bytes().to_vec(),
            ..Default::default()
        };
        let (mut io, out, _err) = Io::test();
        let prompter = StaticPrompter {
            confirm_answer: true,
            selection: 0,
        };
        let browser = RecordingBrowser::default();

        view::run(
            &client,
            &mut io,
            &prompter,
            &browser,
            parse_args::<WrapView>(&["e2fa49d2-f164-4a56-ab99-498090b8fcdf", "--log"]).args,
        )
        .await
        .unwrap();

        let output = out.contents();
        assert!(output.contains("All done."));
        // The one-shot hint is replaced by the follow hint.
        assert!(output.contains("--log --follow"));
    }
}
