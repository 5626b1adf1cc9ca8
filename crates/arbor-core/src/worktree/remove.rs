use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::git::GitBackend;
use crate::worktree::create::remove_path;
use crate::worktree::errors::WorktreeError;
use crate::worktree::types::RemoveOutcome;

/// Remove a worktree and its branch.
///
/// Removing a path that is neither on disk nor registered is a no-op. The
/// branch is deleted after the worktree is gone; failing to delete it is
/// reported as [`WorktreeError::BranchDeleteFailed`].
pub fn remove(
    git: &dyn GitBackend,
    repo_path: &Path,
    worktree_path: &Path,
    branch: &str,
    force: bool,
) -> Result<RemoveOutcome, WorktreeError> {
    info!(
        event = "core.worktree.remove_started",
        path = %worktree_path.display(),
        branch = branch,
        force = force
    );

    let on_disk = fs::symlink_metadata(worktree_path).is_ok();
    let repo_known = git.is_git_repository(repo_path);

    let entry = if repo_known {
        git.registered_entry(repo_path, worktree_path)
            .unwrap_or_else(|e| {
                warn!(
                    event = "core.worktree.remove_list_failed",
                    repo = %repo_path.display(),
                    error = %e
                );
                None
            })
    } else {
        None
    };

    if !on_disk && entry.is_none() {
        info!(
            event = "core.worktree.remove_already_absent",
            path = %worktree_path.display()
        );
        return Ok(RemoveOutcome::AlreadyAbsent);
    }

    if !force
        && on_disk
        && git.is_git_repository(worktree_path)
        && git.has_uncommitted_changes(worktree_path)?
    {
        warn!(
            event = "core.worktree.remove_blocked_dirty",
            path = %worktree_path.display()
        );
        return Err(WorktreeError::UncommittedChanges {
            path: worktree_path.to_path_buf(),
        });
    }

    let mut removed = false;
    if let Some(entry) = &entry {
        match git.worktree_remove(repo_path, &entry.path, force || !on_disk) {
            Ok(()) => removed = true,
            Err(e) => {
                warn!(
                    event = "core.worktree.remove_git_failed",
                    path = %entry.path.display(),
                    error = %e
                );
            }
        }
    }

    if !removed {
        remove_path(worktree_path)?;
        if repo_known && let Err(e) = git.worktree_prune(repo_path) {
            warn!(event = "core.worktree.remove_prune_failed", error = %e);
        }
    }

    if repo_known && !branch.is_empty() {
        match git.branch_exists(repo_path, branch) {
            Ok(true) => {
                git.branch_delete(repo_path, branch, true)
                    .map_err(|source| WorktreeError::BranchDeleteFailed {
                        branch: branch.to_string(),
                        source,
                    })?;
            }
            Ok(false) => {}
            Err(e) => {
                warn!(
                    event = "core.worktree.remove_branch_check_failed",
                    branch = branch,
                    error = %e
                );
            }
        }
    }

    info!(
        event = "core.worktree.remove_completed",
        path = %worktree_path.display()
    );

    Ok(RemoveOutcome::Removed)
}
