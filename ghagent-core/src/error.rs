//! Error types for the ghagent core library.
//!
//! A single enum covers the API client, hydration, authentication gate,
//! and log-rendering failure modes. Command handlers decide what any of
//! these look like to the user; this module only classifies.

use thiserror::Error;

/// The main error type for ghagent core operations.
#[derive(Debug, Error)]
pub enum AgentTaskError {
    /// The requested session (or its logs) does not exist. This is a
    /// sentinel: callers match on it to print "not found" and exit
    /// silently instead of surfacing an error trailer.
    #[error("not found")]
    SessionNotFound,

    /// A required argument was missing or malformed before any request
    /// was issued.
    #[error("{0}")]
    InvalidArgument(String),

    /// The Copilot API answered with a non-success status.
    #[error("{0}")]
    Api(String),

    /// A response body could not be decoded.
    #[error("failed to decode {context}: {message}")]
    Decode { context: String, message: String },

    /// The GraphQL endpoint reported errors or returned no data.
    #[error("GraphQL query failed: {0}")]
    Graphql(String),

    /// Hydration of session pull requests and users failed as a whole.
    #[error("failed to fetch session resources: {0}")]
    Hydration(#[source] Box<AgentTaskError>),

    /// No default host is configured.
    #[error("no default host configured; run 'ghagent auth login'")]
    MissingHost,

    /// Agent tasks only exist on the canonical public host.
    #[error("agent tasks are not supported on this host: {0}")]
    UnsupportedHost(String),

    /// The active token is not an OAuth device-flow token.
    #[error("this command requires an OAuth token. Re-authenticate with: ghagent auth login")]
    OAuthTokenRequired,

    /// The outer framing of a log stream was not recognized.
    #[error("unexpected log format")]
    LogFormat,

    /// Transport-level failure from the HTTP client.
    #[error("API request failed: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for ghagent core operations.
pub type AgentTaskResult<T> = Result<T, AgentTaskError>;

impl AgentTaskError {
    /// Wrap an error as a hydration failure.
    pub fn hydration(err: AgentTaskError) -> Self {
        AgentTaskError::Hydration(Box::new(err))
    }

    /// Returns true for the not-found sentinel.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AgentTaskError::SessionNotFound)
    }

    /// Returns true if this error came from the authentication gate.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            AgentTaskError::MissingHost
                | AgentTaskError::UnsupportedHost(_)
                | AgentTaskError::OAuthTokenRequired
        )
    }
}

impl From<reqwest::Error> for AgentTaskError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AgentTaskError::Decode {
                context: "response".to_string(),
                message: err.to_string(),
            }
        } else {
            AgentTaskError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AgentTaskError {
    fn from(err: serde_json::Error) -> Self {
        AgentTaskError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AgentTaskError {
    fn from(err: std::io::Error) -> Self {
        AgentTaskError::Io(err.to_string())
    }
}
