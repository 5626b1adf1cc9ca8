//! Interpretation of the positional `add` / `remove` argument.

use std::sync::LazyLock;

use regex::Regex;

static GITHUB_ITEM_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.)?github\.com/([^/]+)/([^/]+)/(pull|issues)/(\d+)(?:[/?#].*)?$")
        .expect("Invalid regex pattern")
});

static INVALID_BRANCH_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_-]").expect("Invalid regex pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    PullRequest { owner: String, repo: String, number: u64 },
    Issue { owner: String, repo: String, number: u64 },
    /// A bare number, resolved against the current repository as a PR.
    Number(u64),
    Local(String),
}

/// Classify user input as a GitHub PR/issue URL, a bare number, or a local name.
///
/// Anything that is not an http(s) GitHub PR or issue URL is a local name,
/// including other URL schemes.
pub fn parse_target(input: &str) -> Target {
    let trimmed = input.trim();

    if let Some(caps) = GITHUB_ITEM_URL.captures(trimmed) {
        let number = caps[4].parse::<u64>().ok();
        if let Some(number) = number {
            let owner = caps[1].to_string();
            let repo = caps[2].trim_end_matches(".git").to_string();
            return match &caps[3] {
                "pull" => Target::PullRequest {
                    owner,
                    repo,
                    number,
                },
                _ => Target::Issue {
                    owner,
                    repo,
                    number,
                },
            };
        }
    }

    if !trimmed.is_empty()
        && trimmed.chars().all(|c| c.is_ascii_digit())
        && let Ok(number) = trimmed.parse::<u64>()
    {
        return Target::Number(number);
    }

    Target::Local(trimmed.to_string())
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_branch_name(name: &str) -> String {
    INVALID_BRANCH_CHARS.replace_all(name, "_").into_owned()
}
