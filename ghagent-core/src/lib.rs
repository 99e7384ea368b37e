//! Core library for ghagent.
//!
//! Everything the `ghagent` binary needs to drive Copilot agent tasks:
//! the Copilot API client with pagination and hydration, the node-ID
//! codec, session/job models and the state vocabulary, the session log
//! renderer, the job-polling backoff, and the OAuth authentication
//! gate.

pub mod auth;
pub mod backoff;
pub mod capi;
pub mod config;
pub mod error;
pub mod logs;
pub mod models;
pub mod node_id;
pub mod selector;

pub use auth::{is_enterprise, require_oauth_token, OAUTH_TOKEN_PREFIX};
pub use backoff::PollBackoff;
pub use capi::{
    CapiClient, CapiHttpClient, AGENTS_HOME_URL, DEFAULT_CAPI_BASE_URL, DEFAULT_GRAPHQL_URL,
};
pub use config::{ActiveToken, ConfigLoadError, HostConfig, TokenSource, DEFAULT_HOST};
pub use error::{AgentTaskError, AgentTaskResult};
pub use logs::{LogRenderer, DEFAULT_LOG_POLL_INTERVAL};
pub use models::{
    ColorRole, Job, JobActor, JobError, JobPullRequest, PullRequest, PullRequestRepository,
    RawSession, Session, SessionState, User, WorkflowRun,
};
pub use node_id::{encode_pull_request_node_id, encode_user_node_id};
pub use selector::{classify, is_session_id, parse_agent_session_url, Selector};
