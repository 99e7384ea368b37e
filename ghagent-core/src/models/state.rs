//! The session-state vocabulary.
//!
//! The only place raw state strings are interpreted for display. Every
//! consumer goes through these mappings; nothing else branches on the
//! raw value.

use std::fmt;

/// Semantic color role for a session state. The CLI maps roles onto its
/// color scheme; the core never picks concrete colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRole {
    Success,
    Warning,
    Error,
    Muted,
}

/// A session state as reported by the Copilot API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Queued,
    InProgress,
    Completed,
    Failed,
    Canceled,
    Idle,
    WaitingForUser,
    TimedOut,
    /// Any state this client does not know about; carried verbatim.
    Other(String),
}

impl SessionState {
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "queued" => SessionState::Queued,
            "in_progress" => SessionState::InProgress,
            "completed" => SessionState::Completed,
            "failed" => SessionState::Failed,
            // Both spellings appear in the wild.
            "canceled" | "cancelled" => SessionState::Canceled,
            "idle" => SessionState::Idle,
            "waiting_for_user" => SessionState::WaitingForUser,
            "timed_out" => SessionState::TimedOut,
            other => SessionState::Other(other.to_string()),
        }
    }

    /// Human-readable display string.
    pub fn display(&self) -> &str {
        match self {
            SessionState::Queued => "Queued",
            SessionState::InProgress => "In Progress",
            SessionState::Completed => "Completed",
            SessionState::Failed => "Failed",
            SessionState::Canceled => "Canceled",
            SessionState::Idle => "Idle",
            SessionState::WaitingForUser => "Waiting for User",
            SessionState::TimedOut => "Timed Out",
            SessionState::Other(raw) => raw,
        }
    }

    pub fn color_role(&self) -> ColorRole {
        match self {
            SessionState::Queued | SessionState::InProgress => ColorRole::Warning,
            SessionState::Completed => ColorRole::Success,
            SessionState::Failed => ColorRole::Error,
            SessionState::Canceled
            | SessionState::Idle
            | SessionState::WaitingForUser
            | SessionState::TimedOut
            | SessionState::Other(_) => ColorRole::Muted,
        }
    }

    /// One-character marker used in interactive session pickers.
    pub fn symbol(&self) -> &'static str {
        match self {
            SessionState::Completed => "✓",
            SessionState::Failed => "✗",
            _ => "•",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}
