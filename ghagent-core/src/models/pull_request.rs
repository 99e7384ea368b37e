//! Lightweight pull-request and user shapes returned by GraphQL
//! hydration. These are deliberately slim: looking nodes up by ID with
//! a full pull-request type fails on union fields, so only the fields
//! the agent-task commands display are requested.

use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub id: String,
    /// Decimal string form of the pull request's 64-bit database ID.
    #[serde(default)]
    pub full_database_id: String,
    #[serde(default)]
    pub number: i64,
    #[serde(default)]
    pub title: String,
    /// OPEN, CLOSED, or MERGED.
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub is_draft: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub repository: Option<PullRequestRepository>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestRepository {
    pub name_with_owner: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub database_id: i64,
}
