//! In-memory `GitBackend` for exercising the worktree lifecycle without git.
//!
//! Worktree directories are real (created and removed on disk) so filesystem
//! checks behave normally; branches, registrations and remotes are simulated.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use super::errors::GitError;
use super::operations::paths_equal;
use super::traits::GitBackend;
use super::types::WorktreeEntry;

#[derive(Debug, Default)]
struct FakeRepo {
    branches: BTreeSet<String>,
    worktrees: Vec<WorktreeEntry>,
}

#[derive(Debug, Default)]
pub struct FakeGit {
    repos: RefCell<HashMap<PathBuf, FakeRepo>>,
    dirty: RefCell<HashSet<PathBuf>>,
    failures: RefCell<HashMap<String, String>>,
    partial_failures: RefCell<HashMap<String, String>>,
    calls: RefCell<Vec<String>>,
    cloned_branches: RefCell<Vec<String>>,
    failing_branch_lookups: Cell<usize>,
}

impl FakeGit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an existing repository at `repo` with the given branches.
    pub fn with_repo(self, repo: &Path, branches: &[&str]) -> Self {
        let fake = FakeRepo {
            branches: branches.iter().map(|b| b.to_string()).collect(),
            worktrees: Vec::new(),
        };
        self.repos.borrow_mut().insert(repo.to_path_buf(), fake);
        self
    }

    /// Register a worktree record (the directory is not created).
    pub fn with_worktree(self, repo: &Path, path: &Path, branch: &str) -> Self {
        if let Some(fake) = self.repos.borrow_mut().get_mut(repo) {
            fake.branches.insert(branch.to_string());
            fake.worktrees
                .push(WorktreeEntry::new(path).with_branch(branch));
        }
        self
    }

    /// Branches that `clone_bare` brings along besides `main`.
    pub fn with_cloned_branches(self, branches: &[&str]) -> Self {
        self.cloned_branches
            .borrow_mut()
            .extend(branches.iter().map(|b| b.to_string()));
        self
    }

    /// Make the next `count` branch lookups fail.
    pub fn fail_branch_lookups(&self, count: usize) {
        self.failing_branch_lookups.set(count);
    }

    pub fn mark_dirty(&self, path: &Path) {
        self.dirty.borrow_mut().insert(path.to_path_buf());
    }

    /// Make every call to `op` fail with `message`.
    pub fn fail_on(&self, op: &str, message: &str) {
        self.failures
            .borrow_mut()
            .insert(op.to_string(), message.to_string());
    }

    /// Let `op` take effect, then report failure (a half-finished git command).
    pub fn fail_after(&self, op: &str, message: &str) {
        self.partial_failures
            .borrow_mut()
            .insert(op.to_string(), message.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Calls whose operation name is `op`.
    pub fn calls_to(&self, op: &str) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.split_whitespace().next() == Some(op))
            .cloned()
            .collect()
    }

    pub fn has_branch(&self, repo: &Path, branch: &str) -> bool {
        self.repos
            .borrow()
            .get(repo)
            .is_some_and(|r| r.branches.contains(branch))
    }

    pub fn registered_paths(&self, repo: &Path) -> Vec<PathBuf> {
        self.repos
            .borrow()
            .get(repo)
            .map(|r| r.worktrees.iter().map(|w| w.path.clone()).collect())
            .unwrap_or_default()
    }

    fn record(&self, op: &str, detail: String) -> Result<(), GitError> {
        let call = if detail.is_empty() {
            op.to_string()
        } else {
            format!("{op} {detail}")
        };
        self.calls.borrow_mut().push(call.clone());
        match self.failures.borrow().get(op) {
            Some(message) => Err(GitError::CommandFailed {
                command: call,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn finish(&self, op: &str) -> Result<(), GitError> {
        match self.partial_failures.borrow().get(op) {
            Some(message) => Err(GitError::CommandFailed {
                command: op.to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn with_repo_mut<T>(
        &self,
        repo: &Path,
        f: impl FnOnce(&mut FakeRepo) -> Result<T, GitError>,
    ) -> Result<T, GitError> {
        let mut repos = self.repos.borrow_mut();
        let fake = repos
            .get_mut(repo)
            .ok_or_else(|| GitError::RepositoryNotFound {
                path: repo.display().to_string(),
            })?;
        f(fake)
    }

    fn add(&self, repo: &Path, branch: &str, path: &Path, create_branch: bool) -> Result<(), GitError> {
        self.with_repo_mut(repo, |fake| {
            if create_branch && fake.branches.contains(branch) {
                return Err(GitError::CommandFailed {
                    command: "worktree add".to_string(),
                    message: format!("a branch named '{branch}' already exists"),
                });
            }
            if !create_branch && !fake.branches.contains(branch) {
                return Err(GitError::CommandFailed {
                    command: "worktree add".to_string(),
                    message: format!("invalid reference: {branch}"),
                });
            }
            if path.exists() {
                return Err(GitError::CommandFailed {
                    command: "worktree add".to_string(),
                    message: format!("'{}' already exists", path.display()),
                });
            }
            fs::create_dir_all(path)?;
            fake.branches.insert(branch.to_string());
            fake.worktrees
                .push(WorktreeEntry::new(path).with_branch(branch));
            Ok(())
        })
    }
}

impl GitBackend for FakeGit {
    fn worktree_add(
        &self,
        repo: &Path,
        branch: &str,
        path: &Path,
        start_point: &str,
    ) -> Result<(), GitError> {
        self.record(
            "worktree_add",
            format!("{branch} {} {start_point}", path.display()),
        )?;
        self.add(repo, branch, path, true)?;
        self.finish("worktree_add")
    }

    fn worktree_add_from_branch(
        &self,
        repo: &Path,
        branch: &str,
        path: &Path,
    ) -> Result<(), GitError> {
        self.record("worktree_add_from_branch", format!("{branch} {}", path.display()))?;
        self.add(repo, branch, path, false)?;
        self.finish("worktree_add_from_branch")
    }

    fn worktree_remove(&self, repo: &Path, path: &Path, force: bool) -> Result<(), GitError> {
        self.record("worktree_remove", format!("{} force={force}", path.display()))?;
        self.with_repo_mut(repo, |fake| {
            let before = fake.worktrees.len();
            fake.worktrees.retain(|w| !paths_equal(&w.path, path));
            if fake.worktrees.len() == before {
                return Err(GitError::CommandFailed {
                    command: "worktree remove".to_string(),
                    message: format!("'{}' is not a working tree", path.display()),
                });
            }
            if path.exists() {
                fs::remove_dir_all(path)?;
            }
            Ok(())
        })
    }

    fn worktree_list(&self, repo: &Path) -> Result<Vec<WorktreeEntry>, GitError> {
        self.with_repo_mut(repo, |fake| Ok(fake.worktrees.clone()))
    }

    fn worktree_prune(&self, repo: &Path) -> Result<(), GitError> {
        self.record("worktree_prune", String::new())?;
        self.with_repo_mut(repo, |fake| {
            fake.worktrees.retain(|w| w.path.exists());
            Ok(())
        })
    }

    fn branch_exists(&self, repo: &Path, name: &str) -> Result<bool, GitError> {
        let failing = self.failing_branch_lookups.get();
        if failing > 0 {
            self.failing_branch_lookups.set(failing - 1);
            return Err(GitError::CommandFailed {
                command: "branch lookup".to_string(),
                message: "could not read refs".to_string(),
            });
        }
        self.with_repo_mut(repo, |fake| Ok(fake.branches.contains(name)))
    }

    fn branch_delete(&self, repo: &Path, name: &str, force: bool) -> Result<(), GitError> {
        self.record("branch_delete", format!("{name} force={force}"))?;
        self.with_repo_mut(repo, |fake| {
            if fake.worktrees.iter().any(|w| w.is_on_branch(name)) {
                return Err(GitError::CommandFailed {
                    command: "branch -D".to_string(),
                    message: format!("branch '{name}' is checked out"),
                });
            }
            if !fake.branches.remove(name) {
                return Err(GitError::CommandFailed {
                    command: "branch -D".to_string(),
                    message: format!("branch '{name}' not found"),
                });
            }
            Ok(())
        })
    }

    fn current_branch(&self, path: &Path) -> Result<Option<String>, GitError> {
        let repos = self.repos.borrow();
        Ok(repos
            .values()
            .flat_map(|r| r.worktrees.iter())
            .find(|w| paths_equal(&w.path, path))
            .and_then(|w| w.branch.clone()))
    }

    fn fetch(&self, _repo: &Path, refspec: &str) -> Result<(), GitError> {
        self.record("fetch", refspec.to_string())
    }

    fn has_uncommitted_changes(&self, path: &Path) -> Result<bool, GitError> {
        Ok(self.dirty.borrow().iter().any(|p| paths_equal(p, path)))
    }

    fn is_git_repository(&self, path: &Path) -> bool {
        let repos = self.repos.borrow();
        repos.contains_key(path)
            || repos
                .values()
                .flat_map(|r| r.worktrees.iter())
                .any(|w| paths_equal(&w.path, path) && path.exists())
    }

    fn clone_bare(&self, owner: &str, repo: &str, dest: &Path) -> Result<(), GitError> {
        self.record("clone_bare", format!("{owner}/{repo} {}", dest.display()))?;
        fs::create_dir_all(dest)?;
        let mut branches = BTreeSet::from(["main".to_string()]);
        branches.extend(self.cloned_branches.borrow().iter().cloned());
        let fake = FakeRepo {
            branches,
            worktrees: vec![WorktreeEntry {
                bare: true,
                ..WorktreeEntry::new(dest)
            }],
        };
        self.repos.borrow_mut().insert(dest.to_path_buf(), fake);
        Ok(())
    }

    fn configure_fetch_refspec(&self, repo: &Path) -> Result<(), GitError> {
        self.record("configure_fetch_refspec", repo.display().to_string())
    }

    fn common_dir(&self, path: &Path) -> Result<PathBuf, GitError> {
        let repos = self.repos.borrow();
        repos
            .iter()
            .find(|(repo, fake)| {
                path.starts_with(repo) || fake.worktrees.iter().any(|w| paths_equal(&w.path, path))
            })
            .map(|(repo, _)| repo.clone())
            .ok_or(GitError::NotInRepository)
    }

    fn toplevel(&self, path: &Path) -> Result<PathBuf, GitError> {
        self.common_dir(path)
    }
}
