//! GitHub metadata lookups through the `gh` CLI.
//!
//! `gh` resolves bare numbers against the repository of the current
//! directory, and full URLs against the repository they name.

pub mod errors;

use std::io::ErrorKind;
use std::process::Command;

use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

pub use errors::ForgeError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestInfo {
    pub number: u64,
    pub title: String,
    pub head_ref_name: String,
    #[serde(default)]
    pub url: String,
}

impl PullRequestInfo {
    /// `(owner, repo)` taken from the PR URL, if it is a GitHub URL.
    pub fn repository(&self) -> Option<(String, String)> {
        repository_from_url(&self.url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueInfo {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub url: String,
}

impl IssueInfo {
    pub fn repository(&self) -> Option<(String, String)> {
        repository_from_url(&self.url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryInfo {
    pub owner: String,
    pub name: String,
}

#[derive(Deserialize)]
struct RawRepository {
    owner: RawOwner,
    name: String,
}

#[derive(Deserialize)]
struct RawOwner {
    login: String,
}

/// Look up a pull request by number or URL.
pub fn fetch_pull_request(value: &str) -> Result<PullRequestInfo, ForgeError> {
    info!(event = "core.forge.pr_fetch_started", value = value);
    let stdout = gh(&["pr", "view", value, "--json", "number,title,headRefName,url"])?;
    let pr: PullRequestInfo = parse_json(&stdout, "pull request")?;
    info!(
        event = "core.forge.pr_fetch_completed",
        number = pr.number,
        head = pr.head_ref_name
    );
    Ok(pr)
}

/// Look up an issue by number or URL.
pub fn fetch_issue(value: &str) -> Result<IssueInfo, ForgeError> {
    info!(event = "core.forge.issue_fetch_started", value = value);
    let stdout = gh(&["issue", "view", value, "--json", "number,title,url"])?;
    let issue: IssueInfo = parse_json(&stdout, "issue")?;
    info!(event = "core.forge.issue_fetch_completed", number = issue.number);
    Ok(issue)
}

/// The GitHub repository of the current directory.
pub fn current_repository() -> Result<RepositoryInfo, ForgeError> {
    let stdout = gh(&["repo", "view", "--json", "owner,name"])?;
    let raw: RawRepository = parse_json(&stdout, "repository")?;
    debug!(
        event = "core.forge.repository_resolved",
        owner = raw.owner.login,
        name = raw.name
    );
    Ok(RepositoryInfo {
        owner: raw.owner.login,
        name: raw.name,
    })
}

fn gh(args: &[&str]) -> Result<String, ForgeError> {
    let command = format!("gh {}", args.join(" "));
    debug!(event = "core.forge.gh_started", command = %command);

    let output = Command::new("gh").args(args).output().map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            ForgeError::GhNotInstalled
        } else {
            ForgeError::CommandFailed {
                command: command.clone(),
                message: e.to_string(),
            }
        }
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        warn!(
            event = "core.forge.gh_failed",
            command = %command,
            exit_code = output.status.code(),
            stderr = %stderr
        );
        return Err(ForgeError::CommandFailed {
            command,
            message: stderr,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn parse_json<T: DeserializeOwned>(raw: &str, what: &str) -> Result<T, ForgeError> {
    serde_json::from_str(raw).map_err(|e| ForgeError::ParseFailed {
        what: what.to_string(),
        message: e.to_string(),
    })
}

fn repository_from_url(url: &str) -> Option<(String, String)> {
    let rest = url
        .strip_prefix("https://github.com/")
        .or_else(|| url.strip_prefix("http://github.com/"))?;
    let mut parts = rest.split('/');
    let owner = parts.next().filter(|s| !s.is_empty())?;
    let repo = parts.next().filter(|s| !s.is_empty())?;
    Some((owner.to_string(), repo.to_string()))
}
