use std::path::{Path, PathBuf};

use crate::git::errors::GitError;
use crate::git::operations::find_registered_entry;
use crate::git::types::WorktreeEntry;

/// Narrow interface over the git operations the worktree lifecycle needs.
///
/// `repo` arguments name the directory repository-level commands run in:
/// a bare repository (`<root>/<repo>/.bare`) or the top of a regular checkout.
pub trait GitBackend {
    /// `git worktree add -b <branch> <path> <start_point>`
    fn worktree_add(
        &self,
        repo: &Path,
        branch: &str,
        path: &Path,
        start_point: &str,
    ) -> Result<(), GitError>;

    /// `git worktree add <path> <branch>` for an existing branch.
    fn worktree_add_from_branch(&self, repo: &Path, branch: &str, path: &Path)
    -> Result<(), GitError>;

    fn worktree_remove(&self, repo: &Path, path: &Path, force: bool) -> Result<(), GitError>;

    fn worktree_list(&self, repo: &Path) -> Result<Vec<WorktreeEntry>, GitError>;

    fn worktree_prune(&self, repo: &Path) -> Result<(), GitError>;

    fn branch_exists(&self, repo: &Path, name: &str) -> Result<bool, GitError>;

    fn branch_delete(&self, repo: &Path, name: &str, force: bool) -> Result<(), GitError>;

    /// Branch checked out at `path`; `None` when detached or unborn.
    fn current_branch(&self, path: &Path) -> Result<Option<String>, GitError>;

    /// `git fetch origin <refspec>`
    fn fetch(&self, repo: &Path, refspec: &str) -> Result<(), GitError>;

    fn has_uncommitted_changes(&self, path: &Path) -> Result<bool, GitError>;

    fn is_git_repository(&self, path: &Path) -> bool;

    /// Clone `owner/repo` as a bare repository into `dest`.
    fn clone_bare(&self, owner: &str, repo: &str, dest: &Path) -> Result<(), GitError>;

    /// Make `origin` fetch every branch into `refs/remotes/origin/*`.
    fn configure_fetch_refspec(&self, repo: &Path) -> Result<(), GitError>;

    /// Absolute git common dir of the repository containing `path`.
    fn common_dir(&self, path: &Path) -> Result<PathBuf, GitError>;

    /// Top of the working tree containing `path`.
    fn toplevel(&self, path: &Path) -> Result<PathBuf, GitError>;

    fn worktree_is_registered(&self, repo: &Path, path: &Path) -> Result<bool, GitError> {
        Ok(self.registered_entry(repo, path)?.is_some())
    }

    /// The worktree record for `path`, matched exactly first, then by suffix.
    fn registered_entry(&self, repo: &Path, path: &Path) -> Result<Option<WorktreeEntry>, GitError> {
        let entries = self.worktree_list(repo)?;
        Ok(find_registered_entry(&entries, path).cloned())
    }
}
