pub mod agent_task;
pub mod create;
pub mod list;
pub mod view;

pub use agent_task::{handle_agent_task_command, AgentTaskCommand};

/// Command outcome classification, mapped onto exit codes by `main`.
#[derive(Debug)]
pub enum CommandError {
    /// User-visible condition already reported; exit non-zero without
    /// an error trailer.
    Silent,
    /// Flag misuse; exits like an argument parsing failure.
    Flag(String),
    /// Everything else.
    Other(anyhow::Error),
}

impl CommandError {
    pub fn flag(message: impl Into<String>) -> Self {
        CommandError::Flag(message.into())
    }
}

impl From<anyhow::Error> for CommandError {
    fn from(err: anyhow::Error) -> Self {
        CommandError::Other(err)
    }
}

impl From<ghagent_core::AgentTaskError> for CommandError {
    fn from(err: ghagent_core::AgentTaskError) -> Self {
        CommandError::Other(err.into())
    }
}

impl From<std::io::Error> for CommandError {
    fn from(err: std::io::Error) -> Self {
        CommandError::Other(err.into())
    }
}
