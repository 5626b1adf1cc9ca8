use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::git::GitBackend;
use crate::worktree::types::{CleanupStep, ConflictSignature, Decision};

/// Inspect the target path and branch for pre-existing state.
///
/// Never fails: lookup errors are logged and treated as "not present". When
/// the backing repository does not exist yet only the directory bit can be set.
pub fn classify(
    git: &dyn GitBackend,
    repo_path: &Path,
    worktree_path: &Path,
    branch: &str,
) -> ConflictSignature {
    let dir_exists = fs::symlink_metadata(worktree_path).is_ok();

    if !git.is_git_repository(repo_path) {
        debug!(
            event = "core.worktree.classify_no_repository",
            repo = %repo_path.display(),
            dir_exists = dir_exists
        );
        return ConflictSignature {
            dir_exists,
            ..ConflictSignature::default()
        };
    }

    let entry = match git.registered_entry(repo_path, worktree_path) {
        Ok(entry) => entry,
        Err(e) => {
            warn!(
                event = "core.worktree.classify_list_failed",
                repo = %repo_path.display(),
                error = %e
            );
            None
        }
    };
    let git_registered = entry.is_some();

    let registered_branch = entry.and_then(|e| e.branch).or_else(|| {
        if git_registered && dir_exists {
            git.current_branch(worktree_path).ok().flatten()
        } else {
            None
        }
    });

    let branch_exists = match git.branch_exists(repo_path, branch) {
        Ok(exists) => exists,
        Err(e) => {
            warn!(
                event = "core.worktree.classify_branch_check_failed",
                branch = branch,
                error = %e
            );
            false
        }
    };

    let signature = ConflictSignature {
        dir_exists,
        git_registered,
        branch_exists,
        registered_branch,
    };

    debug!(
        event = "core.worktree.classify_completed",
        path = %worktree_path.display(),
        branch = branch,
        dir_exists = signature.dir_exists,
        git_registered = signature.git_registered,
        branch_exists = signature.branch_exists
    );

    signature
}

/// Cleanup steps implied by a signature, in execution order.
pub fn plan_steps(signature: &ConflictSignature, path: &Path, branch: &str) -> Vec<CleanupStep> {
    let mut steps = Vec::new();

    if signature.dir_exists && signature.git_registered {
        steps.push(CleanupStep::RemoveWorktree {
            path: path.to_path_buf(),
            branch: signature.registered_branch.clone(),
        });
    } else if signature.git_registered {
        steps.push(CleanupStep::PruneStaleRecord {
            path: path.to_path_buf(),
        });
    } else if signature.dir_exists {
        steps.push(CleanupStep::RemoveDirectory {
            path: path.to_path_buf(),
        });
    }

    if signature.branch_exists {
        steps.push(CleanupStep::DeleteBranch {
            branch: branch.to_string(),
        });
    }

    steps
}

/// Human-readable overwrite plan for a signature.
pub fn describe_plan(signature: &ConflictSignature, path: &Path, branch: &str) -> String {
    format_plan(branch, &plan_steps(signature, path, branch), Decision::Overwrite)
}

pub fn format_plan(branch: &str, steps: &[CleanupStep], decision: Decision) -> String {
    let mut text = format!("Target: create worktree for '{branch}'\n\nThis will:\n");
    for step in steps {
        text.push_str(&format!("- {step}\n"));
    }
    match decision {
        Decision::Attach => {
            text.push_str(&format!("- Create worktree on existing branch '{branch}'\n"))
        }
        _ => text.push_str(&format!("- Create worktree and branch for '{branch}'\n")),
    }
    text
}
