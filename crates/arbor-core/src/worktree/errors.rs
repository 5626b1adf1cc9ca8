use std::path::PathBuf;

use crate::errors::ArborError;
use crate::git::errors::GitError;
use crate::worktree::types::RollbackReport;

#[derive(Debug, thiserror::Error)]
pub enum WorktreeError {
    #[error("Worktree at {} has uncommitted changes (use --force to remove anyway)", path.display())]
    UncommittedChanges { path: PathBuf },

    #[error("Worktree already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("Worktree '{name}' not found")]
    NotFound { name: String },

    #[error("Invalid target '{input}': {message}")]
    InvalidTarget { input: String, message: String },

    #[error("{source}{rollback}")]
    CreationFailed {
        source: Box<WorktreeError>,
        rollback: RollbackReport,
    },

    #[error("Worktree removed, but failed to delete branch '{branch}': {source}")]
    BranchDeleteFailed { branch: String, source: GitError },

    #[error("Failed to clean up {}: {message}", path.display())]
    CleanupFailed { path: PathBuf, message: String },

    #[error("Failed to read confirmation: {message}")]
    PromptFailed { message: String },

    #[error(transparent)]
    Git(#[from] GitError),

    #[error("IO error during worktree operation: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl ArborError for WorktreeError {
    fn error_code(&self) -> &'static str {
        match self {
            WorktreeError::UncommittedChanges { .. } => "WORKTREE_UNCOMMITTED_CHANGES",
            WorktreeError::AlreadyExists { .. } => "WORKTREE_ALREADY_EXISTS",
            WorktreeError::NotFound { .. } => "WORKTREE_NOT_FOUND",
            WorktreeError::InvalidTarget { .. } => "INVALID_TARGET",
            WorktreeError::CreationFailed { .. } => "WORKTREE_CREATION_FAILED",
            WorktreeError::BranchDeleteFailed { .. } => "BRANCH_DELETE_FAILED",
            WorktreeError::CleanupFailed { .. } => "WORKTREE_CLEANUP_FAILED",
            WorktreeError::PromptFailed { .. } => "PROMPT_FAILED",
            WorktreeError::Git(_) => "WORKTREE_GIT_ERROR",
            WorktreeError::IoError { .. } => "WORKTREE_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            WorktreeError::UncommittedChanges { .. }
                | WorktreeError::AlreadyExists { .. }
                | WorktreeError::NotFound { .. }
                | WorktreeError::InvalidTarget { .. }
        )
    }
}

impl WorktreeError {
    /// Rollback outcome attached to a failed creation, if any.
    pub fn rollback_report(&self) -> Option<&RollbackReport> {
        match self {
            WorktreeError::CreationFailed { rollback, .. } => Some(rollback),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncommitted_changes_display() {
        let error = WorktreeError::UncommittedChanges {
            path: PathBuf::from("/trees/r/pr_1"),
        };
        assert!(error.to_string().contains("/trees/r/pr_1"));
        assert!(error.to_string().contains("--force"));
        assert_eq!(error.error_code(), "WORKTREE_UNCOMMITTED_CHANGES");
        assert!(error.is_user_error());
    }

    #[test]
    fn test_creation_failed_shows_original_then_rollback() {
        let mut rollback = RollbackReport::default();
        rollback.failures.push("remove directory /trees/r/pr_1: busy".to_string());

        let error = WorktreeError::CreationFailed {
            source: Box::new(WorktreeError::Git(GitError::CommandFailed {
                command: "git fetch origin refs/pull/1/head".to_string(),
                message: "network down".to_string(),
            })),
            rollback,
        };

        let text = error.to_string();
        let original = text.find("network down").unwrap();
        let cleanup = text.find("busy").unwrap();
        assert!(original < cleanup);
        assert!(error.rollback_report().unwrap().has_failures());
    }

    #[test]
    fn test_creation_failed_clean_rollback_shows_only_original() {
        let error = WorktreeError::CreationFailed {
            source: Box::new(WorktreeError::AlreadyExists {
                path: PathBuf::from("/x"),
            }),
            rollback: RollbackReport::default(),
        };
        assert_eq!(error.to_string(), "Worktree already exists: /x");
    }
}
