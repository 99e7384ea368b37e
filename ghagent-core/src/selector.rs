//! Selector grammar for the view command.
//!
//! A selector names either a session directly (UUID or agent-sessions
//! URL) or a pull request (number, URL, `owner/repo#N` reference, or a
//! branch name as the last resort).

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// A session UUID, given directly or lifted from an agent-sessions
    /// URL.
    SessionId(String),
    /// A bare pull-request number, resolved against the base repo.
    PullRequestNumber(i64),
    /// A full `owner/repo#N` reference.
    FullReference {
        owner: String,
        repo: String,
        number: i64,
    },
    /// A pull-request URL.
    PullRequestUrl {
        host: String,
        owner: String,
        repo: String,
        number: i64,
    },
    /// Anything else is treated as a head branch name.
    Branch(String),
}

fn uuid_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^[a-fA-F0-9]{8}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{12}$",
        )
        .expect("session ID regex")
    })
}

fn reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([^/\s#]+)/([^/\s#]+)#(\d+)$").expect("reference regex"))
}

pub fn is_session_id(s: &str) -> bool {
    uuid_re().is_match(s)
}

/// Extract a session ID from a pull request's agent-session URL:
/// `https://{host}/OWNER/REPO/pull/N/agent-sessions/SESSION-ID`.
pub fn parse_agent_session_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let segments: Vec<&str> = url.path_segments()?.collect();

    match segments.as_slice() {
        [_owner, _repo, "pull", number, "agent-sessions", session_id]
            if number.parse::<i64>().is_ok() && is_session_id(session_id) =>
        {
            Some((*session_id).to_string())
        }
        _ => None,
    }
}

/// Classify a raw selector argument.
pub fn classify(arg: &str) -> Selector {
    if is_session_id(arg) {
        return Selector::SessionId(arg.to_string());
    }

    if let Some(session_id) = parse_agent_session_url(arg) {
        return Selector::SessionId(session_id);
    }

    if let Ok(number) = arg.parse::<i64>() {
        if number > 0 {
            return Selector::PullRequestNumber(number);
        }
    }

    if let Some(caps) = reference_re().captures(arg) {
        if let Ok(number) = caps[3].parse::<i64>() {
            return Selector::FullReference {
                owner: caps[1].to_string(),
                repo: caps[2].to_string(),
                number,
            };
        }
    }

    if let Ok(url) = Url::parse(arg) {
        if let (Some(host), Some(segments)) = (url.host_str(), url.path_segments()) {
            let segments: Vec<&str> = segments.collect();
            if segments.len() == 4 && segments[2] == "pull" {
                if let Ok(number) = segments[3].parse::<i64>() {
                    return Selector::PullRequestUrl {
                        host: host.to_string(),
                        owner: segments[0].to_string(),
                        repo: segments[1].to_string(),
                        number,
                    };
                }
            }
        }
    }

    Selector::Branch(arg.to_string())
}
