//! Agent session records.
//!
//! `RawSession` is the wire shape served by the Copilot API; `Session`
//! is the hydrated form handed to callers, carrying the pull request
//! and user joined in from GraphQL when they resolve.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::pull_request::{PullRequest, User};

/// A session exactly as the Copilot API serves it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSession {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub agent_id: i64,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub owner_id: u64,
    #[serde(default)]
    pub repo_id: u64,
    #[serde(default)]
    pub resource_type: String,
    #[serde(default)]
    pub resource_id: i64,
    #[serde(default)]
    pub last_updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub event_url: String,
    #[serde(default)]
    pub event_type: String,
}

/// A hydrated agent session.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub name: String,
    pub user_id: i64,
    pub agent_id: i64,
    pub state: String,
    pub owner_id: u64,
    pub repo_id: u64,
    pub resource_type: String,
    pub resource_id: i64,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub event_url: String,
    pub event_type: String,

    /// None until the server has associated a pull request, or when the
    /// referenced node is inaccessible. Absence is never an error.
    pub pull_request: Option<PullRequest>,
    /// None when hydration cannot resolve the acting user.
    pub user: Option<User>,
}

impl Session {
    pub fn from_raw(raw: RawSession) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            user_id: raw.user_id,
            agent_id: raw.agent_id,
            state: raw.state,
            owner_id: raw.owner_id,
            repo_id: raw.repo_id,
            resource_type: raw.resource_type,
            resource_id: raw.resource_id,
            last_updated_at: raw.last_updated_at,
            created_at: raw.created_at,
            completed_at: raw.completed_at,
            event_url: raw.event_url,
            event_type: raw.event_type,
            pull_request: None,
            user: None,
        }
    }
}
