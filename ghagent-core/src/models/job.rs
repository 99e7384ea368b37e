//! Job submission handles.
//!
//! A job is the request that spawns an agent session. Jobs are
//! server-owned; the client creates one, then polls until the server
//! has associated a pull request or the polling budget runs out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    #[serde(rename = "job_id")]
    pub id: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub problem_statement: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub actor: Option<JobActor>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pull_request: Option<JobPullRequest>,
    #[serde(default)]
    pub workflow_run: Option<WorkflowRun>,
    #[serde(default, rename = "error")]
    pub error_info: Option<JobError>,
}

impl Job {
    /// True once the server has minted a pull request for this job.
    pub fn has_pull_request(&self) -> bool {
        self.pull_request.as_ref().is_some_and(|pr| pr.number > 0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobActor {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobPullRequest {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub number: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRun {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobError {
    #[serde(default)]
    pub message: String,
    /// The server string-encodes this integer.
    #[serde(default, deserialize_with = "int_from_string")]
    pub response_status_code: i64,
    #[serde(default)]
    pub service: String,
}

fn int_from_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        None => Ok(0),
        Some(s) => s.parse().map_err(serde::de::Error::custom),
    }
}
