//! The authentication gate for agent-task commands.
//!
//! Agent tasks are only served to OAuth device-flow tokens on the
//! canonical public host. Every subcommand runs this check before its
//! first API call.

use crate::config::{ActiveToken, HostConfig, TokenSource, DEFAULT_HOST};
use crate::error::{AgentTaskError, AgentTaskResult};

/// Prefix carried by tokens minted through the OAuth device flow.
pub const OAUTH_TOKEN_PREFIX: &str = "gho_";

/// Returns true for any host other than the canonical public host.
pub fn is_enterprise(host: &str) -> bool {
    !host.eq_ignore_ascii_case(DEFAULT_HOST)
}

/// Ensure an OAuth device-flow token is configured for the canonical
/// host, returning it on success.
///
/// Tokens sourced from the config file or the OS keyring are the ones
/// minted through the device flow; anything injected through the
/// environment is rejected even when it carries the right prefix.
pub fn require_oauth_token(cfg: &HostConfig) -> AgentTaskResult<ActiveToken> {
    let host = cfg.default_host();
    if host.is_empty() {
        return Err(AgentTaskError::MissingHost);
    }

    if is_enterprise(host) {
        return Err(AgentTaskError::UnsupportedHost(host.to_string()));
    }

    let Some(active) = cfg.active_token(host) else {
        return Err(AgentTaskError::OAuthTokenRequired);
    };

    let source_is_device_flow = matches!(
        active.source,
        TokenSource::ConfigFile | TokenSource::Keyring
    );
    let token_is_oauth = active.token.starts_with(OAUTH_TOKEN_PREFIX);

    if !source_is_device_flow || !token_is_oauth {
        return Err(AgentTaskError::OAuthTokenRequired);
    }

    Ok(active)
}
