pub mod job;
pub mod pull_request;
pub mod session;
pub mod state;

pub use job::{Job, JobActor, JobError, JobPullRequest, WorkflowRun};
pub use pull_request::{PullRequest, PullRequestRepository, User};
pub use session::{RawSession, Session};
pub use state::{ColorRole, SessionState};
