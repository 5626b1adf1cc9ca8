use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::config::ArborConfig;
use crate::git::{GitBackend, GitError};
use crate::worktree::errors::WorktreeError;
use crate::worktree::types::{
    CleanupStep, CreateOutcome, Decision, Resolution, RollbackReport, WorktreeKind,
    WorktreeLocation, WorktreeRequest,
};

/// Resources created by one creation attempt, undone on failure.
///
/// Every resource is recorded before the operation that creates it returns,
/// so a failure at any point leaves nothing behind after rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationTransaction {
    pub created_directories: Vec<PathBuf>,
    pub created_branches: Vec<String>,
    pub repo_path: PathBuf,
}

impl CreationTransaction {
    pub fn new(repo_path: PathBuf) -> Self {
        Self {
            created_directories: Vec::new(),
            created_branches: Vec::new(),
            repo_path,
        }
    }

    pub fn record_directory(&mut self, path: &Path) {
        self.created_directories.push(path.to_path_buf());
    }

    pub fn record_branch(&mut self, branch: &str) {
        self.created_branches.push(branch.to_string());
    }

    /// Stop tracking a directory that should outlive a failed attempt.
    pub fn forget_directory(&mut self, path: &Path) {
        self.created_directories.retain(|p| p != path);
    }

    /// Undo everything recorded: remove directories, prune worktree
    /// metadata, then force-delete branches. Failures are collected.
    pub fn rollback(self, git: &dyn GitBackend) -> RollbackReport {
        let mut report = RollbackReport::default();

        info!(
            event = "core.worktree.rollback_started",
            directories = self.created_directories.len(),
            branches = self.created_branches.len()
        );

        for dir in self.created_directories.iter().rev() {
            if let Err(e) = remove_path(dir) {
                warn!(
                    event = "core.worktree.rollback_directory_failed",
                    path = %dir.display(),
                    error = %e
                );
                report
                    .failures
                    .push(format!("remove directory {}: {e}", dir.display()));
            }
        }

        if git.is_git_repository(&self.repo_path)
            && let Err(e) = git.worktree_prune(&self.repo_path)
        {
            warn!(event = "core.worktree.rollback_prune_failed", error = %e);
            report.failures.push(format!("prune worktrees: {e}"));
        }

        for branch in self.created_branches.iter().rev() {
            if let Err(e) = git.branch_delete(&self.repo_path, branch, true) {
                warn!(
                    event = "core.worktree.rollback_branch_failed",
                    branch = %branch,
                    error = %e
                );
                report.failures.push(format!("delete branch '{branch}': {e}"));
            }
        }

        if report.has_failures() {
            error!(
                event = "core.worktree.rollback_incomplete",
                failures = report.failures.len()
            );
        } else {
            info!(event = "core.worktree.rollback_completed");
        }

        report
    }
}

/// User-visible milestones of a creation, reported through [`Creator::with_progress`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateProgress {
    Cloning { owner: String, repo: String },
    FetchingPullRequest { number: u64 },
}

/// Executes a resolved creation request.
pub struct Creator<'a> {
    git: &'a dyn GitBackend,
    root: PathBuf,
    progress: Option<&'a dyn Fn(&CreateProgress)>,
}

impl<'a> Creator<'a> {
    pub fn new(git: &'a dyn GitBackend, config: &ArborConfig) -> Self {
        Self::with_root(git, config.worktree_root())
    }

    pub fn with_root(git: &'a dyn GitBackend, root: PathBuf) -> Self {
        Self {
            git,
            root,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn Fn(&CreateProgress)) -> Self {
        self.progress = Some(progress);
        self
    }

    fn report(&self, step: CreateProgress) {
        if let Some(progress) = self.progress {
            progress(&step);
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn location(&self, request: &WorktreeRequest) -> WorktreeLocation {
        request.location(&self.root)
    }

    pub fn create(
        &self,
        request: &WorktreeRequest,
        resolution: &Resolution,
    ) -> Result<CreateOutcome, WorktreeError> {
        let (outcome, _) = self.create_with_transaction(request, resolution)?;
        Ok(outcome)
    }

    /// Like [`Creator::create`], also returning the committed transaction.
    pub fn create_with_transaction(
        &self,
        request: &WorktreeRequest,
        resolution: &Resolution,
    ) -> Result<(CreateOutcome, Option<CreationTransaction>), WorktreeError> {
        if resolution.decision == Decision::Cancel {
            info!(event = "core.worktree.create_cancelled", branch = %request.branch_name);
            return Ok((CreateOutcome::Cancelled, None));
        }

        let location = self.location(request);
        info!(
            event = "core.worktree.create_started",
            kind = %request.kind,
            branch = %request.branch_name,
            path = %location.worktree_path.display(),
            decision = ?resolution.decision
        );

        fs::create_dir_all(&location.repo_base)?;

        let mut tx = CreationTransaction::new(location.repo_path.clone());
        match self.execute(request, resolution, &location, &mut tx) {
            Ok(attached) => {
                info!(
                    event = "core.worktree.create_completed",
                    path = %location.worktree_path.display(),
                    attached = attached
                );
                Ok((
                    CreateOutcome::Created {
                        path: location.worktree_path,
                        attached,
                    },
                    Some(tx),
                ))
            }
            Err(e) => {
                error!(
                    event = "core.worktree.create_failed",
                    path = %location.worktree_path.display(),
                    error = %e
                );
                let rollback = tx.rollback(self.git);
                Err(WorktreeError::CreationFailed {
                    source: Box::new(e),
                    rollback,
                })
            }
        }
    }

    fn execute(
        &self,
        request: &WorktreeRequest,
        resolution: &Resolution,
        location: &WorktreeLocation,
        tx: &mut CreationTransaction,
    ) -> Result<bool, WorktreeError> {
        let repo = &location.repo_path;
        let path = &location.worktree_path;
        let branch = &request.branch_name;

        let cloned = match request.kind {
            WorktreeKind::Local => {
                if !self.git.is_git_repository(repo) {
                    return Err(GitError::RepositoryNotFound {
                        path: repo.display().to_string(),
                    }
                    .into());
                }
                false
            }
            WorktreeKind::PullRequest | WorktreeKind::Issue => {
                self.ensure_bare_clone(request, repo, tx)?
            }
        };

        // A fresh clone carries every remote branch, which classification could not see
        let mut decision = resolution.decision;
        if cloned && decision == Decision::Overwrite && self.git.branch_exists(repo, branch)? {
            info!(
                event = "core.worktree.cloned_branch_attached",
                branch = %branch,
                repo = %repo.display()
            );
            decision = Decision::Attach;
        }

        if !path.exists() && self.git.worktree_is_registered(repo, path)? {
            info!(event = "core.worktree.stale_record_removed", path = %path.display());
            self.git.worktree_remove(repo, path, true)?;
        }

        for step in &resolution.plan {
            self.run_cleanup_step(repo, step)?;
        }

        if fs::symlink_metadata(path).is_ok() {
            return Err(WorktreeError::AlreadyExists { path: path.clone() });
        }

        if decision == Decision::Attach {
            self.fetch_pull_ref(request, repo)?;
            tx.record_directory(path);
            self.git.worktree_add_from_branch(repo, branch, path)?;
            return Ok(true);
        }

        tx.record_directory(path);

        let start_point = if self.fetch_pull_ref(request, repo)? {
            "FETCH_HEAD"
        } else {
            request.start_point.as_str()
        };

        // Only a branch that was provably absent can be claimed by this transaction
        let existed_before = self.git.branch_exists(repo, branch).ok();

        match self.git.worktree_add(repo, branch, path, start_point) {
            Ok(()) => {
                tx.record_branch(branch);
                Ok(false)
            }
            Err(e) => {
                if existed_before == Some(false)
                    && self.git.branch_exists(repo, branch).unwrap_or(false)
                {
                    tx.record_branch(branch);
                }
                Err(e.into())
            }
        }
    }

    /// Fetch the pull request head when the request has one.
    fn fetch_pull_ref(
        &self,
        request: &WorktreeRequest,
        repo: &Path,
    ) -> Result<bool, WorktreeError> {
        let Some(pull_ref) = request.pull_ref() else {
            return Ok(false);
        };
        self.report(CreateProgress::FetchingPullRequest {
            number: request.number.unwrap_or_default(),
        });
        self.git.fetch(repo, &pull_ref)?;
        Ok(true)
    }

    fn ensure_bare_clone(
        &self,
        request: &WorktreeRequest,
        repo: &Path,
        tx: &mut CreationTransaction,
    ) -> Result<bool, WorktreeError> {
        if repo.exists() {
            return Ok(false);
        }

        self.report(CreateProgress::Cloning {
            owner: request.owner.clone(),
            repo: request.repo.clone(),
        });
        info!(
            event = "core.worktree.clone_started",
            owner = %request.owner,
            repo = %request.repo,
            dest = %repo.display()
        );

        tx.record_directory(repo);
        self.git.clone_bare(&request.owner, &request.repo, repo)?;
        self.git.configure_fetch_refspec(repo)?;
        tx.forget_directory(repo);

        info!(event = "core.worktree.clone_completed", dest = %repo.display());
        Ok(true)
    }

    fn run_cleanup_step(&self, repo: &Path, step: &CleanupStep) -> Result<(), WorktreeError> {
        info!(event = "core.worktree.cleanup_step", step = %step);
        match step {
            CleanupStep::RemoveWorktree { path, .. } => {
                self.git.worktree_remove(repo, path, true)?;
                if path.exists() {
                    remove_path(path).map_err(|e| WorktreeError::CleanupFailed {
                        path: path.clone(),
                        message: e.to_string(),
                    })?;
                }
            }
            CleanupStep::PruneStaleRecord { path } => {
                if self.git.worktree_is_registered(repo, path)? {
                    self.git.worktree_prune(repo)?;
                }
            }
            CleanupStep::RemoveDirectory { path } => {
                remove_path(path).map_err(|e| WorktreeError::CleanupFailed {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
            }
            CleanupStep::DeleteBranch { branch } => {
                self.git.branch_delete(repo, branch, true)?;
            }
        }
        Ok(())
    }
}

/// Remove a file, symlink or directory tree. Missing paths are fine.
pub(crate) fn remove_path(path: &Path) -> std::io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
