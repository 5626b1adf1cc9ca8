use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::git::{GitBackend, repository_root};
use crate::worktree::errors::WorktreeError;
use crate::worktree::types::{BARE_DIR, WorktreeListItem};

/// Enumerate worktrees laid out as `<root>/<repo>/<name>`.
///
/// Only directories that are git checkouts are reported; the bare clone
/// and stray directories are skipped. A missing root yields an empty list.
pub fn list_worktrees(
    git: &dyn GitBackend,
    root: &Path,
    repo_filter: Option<&str>,
) -> Result<Vec<WorktreeListItem>, WorktreeError> {
    info!(
        event = "core.worktree.list_started",
        root = %root.display(),
        repo = repo_filter.unwrap_or("*")
    );

    if !root.is_dir() {
        debug!(event = "core.worktree.list_root_missing", root = %root.display());
        return Ok(Vec::new());
    }

    let mut items = Vec::new();

    for repo_entry in fs::read_dir(root)? {
        let repo_entry = repo_entry?;
        if !repo_entry.file_type()?.is_dir() {
            continue;
        }
        let repo_name = repo_entry.file_name().to_string_lossy().into_owned();
        if repo_filter.is_some_and(|filter| filter != repo_name) {
            continue;
        }

        for wt_entry in fs::read_dir(repo_entry.path())? {
            let wt_entry = wt_entry?;
            let name = wt_entry.file_name().to_string_lossy().into_owned();
            let path = wt_entry.path();
            if name == BARE_DIR || !wt_entry.file_type()?.is_dir() {
                continue;
            }
            if !git.is_git_repository(&path) {
                debug!(event = "core.worktree.list_skipped", path = %path.display());
                continue;
            }
            items.push(describe(git, &repo_name, &name, &path));
        }
    }

    items.sort_by(|a, b| a.repo.cmp(&b.repo).then_with(|| a.name.cmp(&b.name)));

    info!(event = "core.worktree.list_completed", count = items.len());
    Ok(items)
}

/// Every worktree whose directory name is `name`, across repositories.
pub fn find_by_name(
    git: &dyn GitBackend,
    root: &Path,
    name: &str,
) -> Result<Vec<WorktreeListItem>, WorktreeError> {
    let matches: Vec<_> = list_worktrees(git, root, None)?
        .into_iter()
        .filter(|item| item.name == name)
        .collect();

    debug!(
        event = "core.worktree.find_completed",
        name = name,
        matches = matches.len()
    );
    Ok(matches)
}

fn describe(git: &dyn GitBackend, repo: &str, name: &str, path: &Path) -> WorktreeListItem {
    let branch = git.current_branch(path).unwrap_or_else(|e| {
        warn!(event = "core.worktree.list_branch_failed", path = %path.display(), error = %e);
        None
    });

    let has_changes = git.has_uncommitted_changes(path).unwrap_or_else(|e| {
        warn!(event = "core.worktree.list_status_failed", path = %path.display(), error = %e);
        false
    });

    let last_modified = fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .map(|time| DateTime::<Utc>::from(time).to_rfc3339());

    let repo_path = git
        .common_dir(path)
        .map(|common| repository_root(&common))
        .unwrap_or_else(|_| path.join("..").join(BARE_DIR));

    WorktreeListItem {
        name: name.to_string(),
        repo: repo.to_string(),
        branch,
        path: path.to_path_buf(),
        has_changes,
        last_modified,
        repo_path,
    }
}
