//! Base-repository resolution: the `--repo` flag first, the git
//! `origin` remote otherwise.

use std::fmt;
use std::process::Command;

use anyhow::{anyhow, bail, Context, Result};
use ghagent_core::DEFAULT_HOST;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repo {
    pub host: String,
    pub owner: String,
    pub name: String,
}

impl Repo {
    pub fn is_canonical_host(&self) -> bool {
        self.host.eq_ignore_ascii_case(DEFAULT_HOST)
    }
}

impl fmt::Display for Repo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Resolve the base repository: an explicit spec wins, then the
/// working directory's origin remote.
pub fn resolve(flag: Option<&str>) -> Result<Repo> {
    match flag {
        Some(spec) => parse(spec),
        None => from_git_remote(),
    }
}

/// Parse `OWNER/REPO` or `HOST/OWNER/REPO`.
pub fn parse(spec: &str) -> Result<Repo> {
    let parts: Vec<&str> = spec.split('/').collect();
    match parts.as_slice() {
        [owner, name] if !owner.is_empty() && !name.is_empty() => Ok(Repo {
            host: DEFAULT_HOST.to_string(),
            owner: (*owner).to_string(),
            name: (*name).to_string(),
        }),
        [host, owner, name] if !host.is_empty() && !owner.is_empty() && !name.is_empty() => {
            Ok(Repo {
                host: (*host).to_string(),
                owner: (*owner).to_string(),
                name: (*name).to_string(),
            })
        }
        _ => bail!("expected the \"[HOST/]OWNER/REPO\" format, got {spec:?}"),
    }
}

/// Resolve from the origin remote of the enclosing git repository.
pub fn from_git_remote() -> Result<Repo> {
    let output = Command::new("git")
        .args(["remote", "get-url", "origin"])
        .output()
        .context("failed to run git")?;

    if !output.status.success() {
        bail!("no origin remote found");
    }

    let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
    parse_remote_url(&url).ok_or_else(|| anyhow!("could not parse remote URL {url:?}"))
}

/// The current branch name, used when the view command gets no
/// selector.
pub fn current_branch() -> Result<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .output()
        .context("failed to run git")?;

    if !output.status.success() {
        bail!("not inside a git repository");
    }

    let branch = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if branch.is_empty() || branch == "HEAD" {
        bail!("could not determine the current branch");
    }
    Ok(branch)
}

/// Accepts the common remote shapes: https, ssh, and scp-like.
fn parse_remote_url(url: &str) -> Option<Repo> {
    let url = url.strip_suffix(".git").unwrap_or(url);

    if let Some(rest) = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .or_else(|| url.strip_prefix("ssh://git@"))
        .or_else(|| url.strip_prefix("git://"))
    {
        let mut parts = rest.splitn(3, '/');
        let host = parts.next()?;
        let owner = parts.next()?;
        let name = parts.next()?;
        // Strip any userinfo from the host part.
        let host = host.rsplit('@').next()?;
        return some_repo(host, owner, name);
    }

    // scp-like: git@github.com:owner/repo
    if let Some(rest) = url.strip_prefix("git@") {
        let (host, path) = rest.split_once(':')?;
        let (owner, name) = path.split_once('/')?;
        return some_repo(host, owner, name);
    }

    None
}

fn some_repo(host: &str, owner: &str, name: &str) -> Option<Repo> {
    if host.is_empty() || owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some(Repo {
        host: host.to_string(),
        owner: owner.to_string(),
        name: name.to_string(),
    })
}
