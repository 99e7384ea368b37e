//! The Copilot API client proper.
//!
//! `CapiClient` is the capability trait commands program against;
//! `CapiHttpClient` is the reqwest-backed implementation. Session and
//! job endpoints live on the dedicated Copilot host; hydration and
//! pull-request lookups go through the canonical GraphQL endpoint.

use async_trait::async_trait;
use reqwest::{header, Method, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::auth::is_enterprise;
use crate::error::{AgentTaskError, AgentTaskResult};
use crate::models::{Job, Session};

/// The Copilot agents home page, used as the browser target and the
/// fallback progress URL.
pub const AGENTS_HOME_URL: &str = "https://github.com/copilot/agents";

pub const DEFAULT_CAPI_BASE_URL: &str = "https://api.githubcopilot.com";
pub const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";

const DEFAULT_PAGE_SIZE: usize = 50;

/// Event-type tag stamped onto jobs submitted by this CLI.
const CLI_EVENT_TYPE: &str = "ghagent_cli";

/// Operations the agent-task commands need. Implemented by
/// [`CapiHttpClient`] and by scripted doubles in command tests.
#[async_trait]
pub trait CapiClient: Send + Sync {
    /// List the authenticated user's agent sessions, up to `limit`.
    async fn list_sessions_for_viewer(&self, limit: usize) -> AgentTaskResult<Vec<Session>>;

    /// List agent sessions for one repository, up to `limit`.
    async fn list_sessions_for_repo(
        &self,
        owner: &str,
        repo: &str,
        limit: usize,
    ) -> AgentTaskResult<Vec<Session>>;

    /// List agent sessions attached to a resource such as a pull
    /// request, up to `limit`.
    async fn list_sessions_by_resource(
        &self,
        resource_type: &str,
        resource_id: i64,
        limit: usize,
    ) -> AgentTaskResult<Vec<Session>>;

    /// Fetch one session by ID. A missing session is
    /// [`AgentTaskError::SessionNotFound`].
    async fn get_session(&self, id: &str) -> AgentTaskResult<Session>;

    /// Fetch the raw log stream of a session.
    async fn get_session_logs(&self, id: &str) -> AgentTaskResult<Vec<u8>>;

    /// Queue a new agent job. The response may or may not carry pull
    /// request information; poll [`CapiClient::get_job`] when it does
    /// not.
    async fn create_job(
        &self,
        owner: &str,
        repo: &str,
        problem_statement: &str,
        base_branch: Option<&str>,
    ) -> AgentTaskResult<Job>;

    /// Fetch an agent job.
    async fn get_job(&self, owner: &str, repo: &str, job_id: &str) -> AgentTaskResult<Job>;

    /// Resolve a pull request's database ID and URL from its number.
    /// `host` names where the pull request lives; only the canonical
    /// public host is served.
    async fn get_pull_request_database_id(
        &self,
        host: &str,
        owner: &str,
        repo: &str,
        number: i64,
    ) -> AgentTaskResult<(i64, String)>;

    /// Resolve the most recent pull request whose head ref matches
    /// `branch`. `host` is checked the same way as for
    /// [`CapiClient::get_pull_request_database_id`].
    async fn find_pull_request_by_branch(
        &self,
        host: &str,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> AgentTaskResult<(i64, String)>;
}

pub struct CapiHttpClient {
    pub(crate) http: reqwest::Client,
    pub(crate) token: String,
    pub(crate) capi_base: Url,
    pub(crate) graphql_url: Url,
    pub(crate) page_size: usize,
}

impl CapiHttpClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.into(),
            capi_base: Url::parse(DEFAULT_CAPI_BASE_URL).expect("default CAPI base URL"),
            graphql_url: Url::parse(DEFAULT_GRAPHQL_URL).expect("default GraphQL URL"),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Point the client at alternate endpoints. Used by tests.
    pub fn with_base_urls(
        token: impl Into<String>,
        capi_base: &str,
        graphql_url: &str,
    ) -> AgentTaskResult<Self> {
        let mut client = Self::new(token);
        client.capi_base = Url::parse(capi_base)
            .map_err(|e| AgentTaskError::InvalidArgument(format!("invalid CAPI base URL: {e}")))?;
        client.graphql_url = Url::parse(graphql_url)
            .map_err(|e| AgentTaskError::InvalidArgument(format!("invalid GraphQL URL: {e}")))?;
        Ok(client)
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .header(header::ACCEPT, "application/json")
    }

    /// Build a URL under the Copilot host. Segments are percent-encoded
    /// by the URL builder, so user-supplied owners, repos, and IDs are
    /// safe to pass through.
    fn capi_url(&self, segments: &[&str]) -> Url {
        let mut url = self.capi_base.clone();
        url.path_segments_mut()
            .expect("CAPI base URL supports path segments")
            .extend(segments);
        url
    }

    async fn list_sessions_paged(
        &self,
        base: Url,
        limit: usize,
    ) -> AgentTaskResult<Vec<crate::models::RawSession>> {
        #[derive(Deserialize)]
        struct SessionsPage {
            #[serde(default)]
            sessions: Vec<crate::models::RawSession>,
        }

        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut sessions = Vec::new();
        for page in 1u32.. {
            let mut url = base.clone();
            url.query_pairs_mut()
                .append_pair("page_size", &self.page_size.to_string())
                .append_pair("page_number", &page.to_string());

            debug!(page, "listing agent sessions");
            let res = self.request(Method::GET, url).send().await?;
            if !res.status().is_success() {
                return Err(AgentTaskError::Api(format!(
                    "failed to list sessions: {}",
                    res.status()
                )));
            }

            let body: SessionsPage = decode(res, "sessions response").await?;
            let fetched = body.sessions.len();
            sessions.extend(body.sessions);

            if fetched < self.page_size || sessions.len() >= limit {
                break;
            }
        }

        // Drop any above the limit.
        sessions.truncate(limit);
        Ok(sessions)
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    res: Response,
    context: &str,
) -> AgentTaskResult<T> {
    res.json().await.map_err(|e| AgentTaskError::Decode {
        context: context.to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl CapiClient for CapiHttpClient {
    async fn list_sessions_for_viewer(&self, limit: usize) -> AgentTaskResult<Vec<Session>> {
        let raw = self
            .list_sessions_paged(self.capi_url(&["agents", "sessions"]), limit)
            .await?;
        self.hydrate_sessions(raw)
            .await
            .map_err(AgentTaskError::hydration)
    }

    async fn list_sessions_for_repo(
        &self,
        owner: &str,
        repo: &str,
        limit: usize,
    ) -> AgentTaskResult<Vec<Session>> {
        if owner.is_empty() || repo.is_empty() {
            return Err(AgentTaskError::InvalidArgument(
                "owner and repo are required".to_string(),
            ));
        }

        let raw = self
            .list_sessions_paged(
                self.capi_url(&["agents", "sessions", "nwo", owner, repo]),
                limit,
            )
            .await?;
        self.hydrate_sessions(raw)
            .await
            .map_err(AgentTaskError::hydration)
    }

    async fn list_sessions_by_resource(
        &self,
        resource_type: &str,
        resource_id: i64,
        limit: usize,
    ) -> AgentTaskResult<Vec<Session>> {
        if resource_type.is_empty() || resource_id == 0 {
            return Err(AgentTaskError::InvalidArgument(
                "missing resource type/ID".to_string(),
            ));
        }

        let raw = self
            .list_sessions_paged(
                self.capi_url(&[
                    "agents",
                    "sessions",
                    "resource",
                    resource_type,
                    &resource_id.to_string(),
                ]),
                limit,
            )
            .await?;
        self.hydrate_sessions(raw)
            .await
            .map_err(AgentTaskError::hydration)
    }

    async fn get_session(&self, id: &str) -> AgentTaskResult<Session> {
        if id.is_empty() {
            return Err(AgentTaskError::InvalidArgument(
                "missing session ID".to_string(),
            ));
        }

        let url = self.capi_url(&["agents", "sessions", id]);
        let res = self.request(Method::GET, url).send().await?;
        if res.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AgentTaskError::SessionNotFound);
        }
        if !res.status().is_success() {
            return Err(AgentTaskError::Api(format!(
                "failed to get session: {}",
                res.status()
            )));
        }

        let raw: crate::models::RawSession = decode(res, "session response").await?;
        let mut sessions = self
            .hydrate_sessions(vec![raw])
            .await
            .map_err(AgentTaskError::hydration)?;
        Ok(sessions.remove(0))
    }

    async fn get_session_logs(&self, id: &str) -> AgentTaskResult<Vec<u8>> {
        if id.is_empty() {
            return Err(AgentTaskError::InvalidArgument(
                "missing session ID".to_string(),
            ));
        }

        let url = self.capi_url(&["agents", "sessions", id, "logs"]);
        let res = self.request(Method::GET, url).send().await?;
        if res.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AgentTaskError::SessionNotFound);
        }
        if !res.status().is_success() {
            return Err(AgentTaskError::Api(format!(
                "failed to get session logs: {}",
                res.status()
            )));
        }

        Ok(res.bytes().await?.to_vec())
    }

    async fn create_job(
        &self,
        owner: &str,
        repo: &str,
        problem_statement: &str,
        base_branch: Option<&str>,
    ) -> AgentTaskResult<Job> {
        if owner.is_empty() || repo.is_empty() {
            return Err(AgentTaskError::InvalidArgument(
                "owner and repo are required".to_string(),
            ));
        }
        if problem_statement.is_empty() {
            return Err(AgentTaskError::InvalidArgument(
                "problem statement is required".to_string(),
            ));
        }

        let mut body = json!({
            "problem_statement": problem_statement,
            "event_type": CLI_EVENT_TYPE,
        });
        if let Some(branch) = base_branch {
            body["pull_request"] = json!({ "base_ref": format!("refs/heads/{branch}") });
        }

        let url = self.capi_url(&["agents", "swe", "v1", "jobs", owner, repo]);
        debug!(owner, repo, "creating agent job");
        let res = self.request(Method::POST, url).json(&body).send().await?;

        let status = res.status();
        if status != reqwest::StatusCode::CREATED && status != reqwest::StatusCode::OK {
            // Error bodies may carry a message that beats the bare
            // status line.
            #[derive(Deserialize, Default)]
            struct ErrorBody {
                #[serde(default)]
                error: ErrorDetail,
            }
            #[derive(Deserialize, Default)]
            struct ErrorDetail {
                #[serde(default)]
                message: String,
            }

            let body: ErrorBody = res.json().await.unwrap_or_default();
            let message = if body.error.message.is_empty() {
                status.to_string()
            } else {
                body.error.message
            };
            return Err(AgentTaskError::Api(format!(
                "failed to create job: {message}"
            )));
        }

        decode(res, "create job response").await
    }

    async fn get_job(&self, owner: &str, repo: &str, job_id: &str) -> AgentTaskResult<Job> {
        if owner.is_empty() || repo.is_empty() || job_id.is_empty() {
            return Err(AgentTaskError::InvalidArgument(
                "owner, repo, and job ID are required".to_string(),
            ));
        }

        let url = self.capi_url(&["agents", "swe", "v1", "jobs", owner, repo, job_id]);
        let res = self.request(Method::GET, url).send().await?;
        if !res.status().is_success() {
            return Err(AgentTaskError::Api(format!(
                "failed to get job: {}",
                res.status()
            )));
        }

        decode(res, "get job response").await
    }

    async fn get_pull_request_database_id(
        &self,
        host: &str,
        owner: &str,
        repo: &str,
        number: i64,
    ) -> AgentTaskResult<(i64, String)> {
        if is_enterprise(host) {
            return Err(AgentTaskError::UnsupportedHost(host.to_string()));
        }

        const QUERY: &str = "query($owner: String!, $repo: String!, $number: Int!) { \
            repository(owner: $owner, name: $repo) { \
                pullRequest(number: $number) { fullDatabaseId url } } }";

        #[derive(Deserialize)]
        struct Data {
            repository: Option<Repository>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Repository {
            pull_request: Option<PullRequestIds>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct PullRequestIds {
            full_database_id: String,
            url: String,
        }

        let data: Data = self
            .graphql(
                QUERY,
                json!({ "owner": owner, "repo": repo, "number": number }),
            )
            .await?;

        let pr = data
            .repository
            .and_then(|r| r.pull_request)
            .ok_or_else(|| {
                AgentTaskError::Api(format!("pull request {owner}/{repo}#{number} not found"))
            })?;

        let database_id = pr.full_database_id.parse().map_err(|_| {
            AgentTaskError::Decode {
                context: "pull request database ID".to_string(),
                message: format!("not a 64-bit integer: {:?}", pr.full_database_id),
            }
        })?;
        Ok((database_id, pr.url))
    }

    async fn find_pull_request_by_branch(
        &self,
        host: &str,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> AgentTaskResult<(i64, String)> {
        if is_enterprise(host) {
            return Err(AgentTaskError::UnsupportedHost(host.to_string()));
        }

        const QUERY: &str = "query($owner: String!, $repo: String!, $branch: String!) { \
            repository(owner: $owner, name: $repo) { \
                pullRequests(headRefName: $branch, first: 1, \
                             orderBy: {field: CREATED_AT, direction: DESC}) { \
                    nodes { fullDatabaseId url } } } }";

        #[derive(Deserialize)]
        struct Data {
            repository: Option<Repository>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Repository {
            pull_requests: PullRequests,
        }
        #[derive(Deserialize)]
        struct PullRequests {
            #[serde(default)]
            nodes: Vec<PullRequestIds>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct PullRequestIds {
            full_database_id: String,
            url: String,
        }

        let data: Data = self
            .graphql(
                QUERY,
                json!({ "owner": owner, "repo": repo, "branch": branch }),
            )
            .await?;

        let pr = data
            .repository
            .map(|r| r.pull_requests.nodes)
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| {
                AgentTaskError::Api(format!("no pull request found for branch '{branch}'"))
            })?;

        let database_id = pr.full_database_id.parse().map_err(|_| {
            AgentTaskError::Decode {
                context: "pull request database ID".to_string(),
                message: format!("not a 64-bit integer: {:?}", pr.full_database_id),
            }
        })?;
        Ok((database_id, pr.url))
    }
}
