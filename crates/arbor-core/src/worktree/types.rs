use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Directory name of the bare clone under `<root>/<repo>/`.
pub const BARE_DIR: &str = ".bare";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorktreeKind {
    PullRequest,
    Issue,
    Local,
}

impl WorktreeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorktreeKind::PullRequest => "pr",
            WorktreeKind::Issue => "issue",
            WorktreeKind::Local => "local",
        }
    }
}

impl fmt::Display for WorktreeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user asked to create. Built once per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeRequest {
    pub kind: WorktreeKind,
    pub owner: String,
    pub repo: String,
    pub number: Option<u64>,
    pub branch_name: String,
    pub worktree_name: String,
    pub start_point: String,
    /// Existing repository for local requests.
    pub repo_dir: Option<PathBuf>,
}

impl WorktreeRequest {
    /// PR request. An empty head branch falls back to `pr_<n>`.
    pub fn pull_request(owner: &str, repo: &str, number: u64, head_branch: &str) -> Self {
        let branch_name = if head_branch.trim().is_empty() {
            format!("pr_{number}")
        } else {
            head_branch.to_string()
        };
        Self {
            kind: WorktreeKind::PullRequest,
            owner: owner.to_string(),
            repo: repo.to_string(),
            number: Some(number),
            branch_name,
            worktree_name: format!("pr_{number}"),
            start_point: "FETCH_HEAD".to_string(),
            repo_dir: None,
        }
    }

    pub fn issue(owner: &str, repo: &str, number: u64) -> Self {
        Self {
            kind: WorktreeKind::Issue,
            owner: owner.to_string(),
            repo: repo.to_string(),
            number: Some(number),
            branch_name: format!("issue_{number}"),
            worktree_name: format!("issue_{number}"),
            start_point: "HEAD".to_string(),
            repo_dir: None,
        }
    }

    /// Local request branched from `repo_dir`. The branch is the sanitized name.
    pub fn local(repo: &str, name: &str, repo_dir: PathBuf) -> Self {
        Self {
            kind: WorktreeKind::Local,
            owner: String::new(),
            repo: repo.to_string(),
            number: None,
            branch_name: super::parse::sanitize_branch_name(name),
            worktree_name: name.to_string(),
            start_point: "HEAD".to_string(),
            repo_dir: Some(repo_dir),
        }
    }

    pub fn with_worktree_name(mut self, name: &str) -> Self {
        self.worktree_name = name.to_string();
        self
    }

    pub fn with_branch_name(mut self, branch: &str) -> Self {
        self.branch_name = branch.to_string();
        self
    }

    /// Refspec for the PR head, only for pull requests.
    pub fn pull_ref(&self) -> Option<String> {
        match (self.kind, self.number) {
            (WorktreeKind::PullRequest, Some(n)) => Some(format!("refs/pull/{n}/head")),
            _ => None,
        }
    }

    /// Where the worktree and its backing repository live under `root`.
    pub fn location(&self, root: &Path) -> WorktreeLocation {
        let repo_base = root.join(&self.repo);
        let repo_path = match (&self.kind, &self.repo_dir) {
            (WorktreeKind::Local, Some(dir)) => dir.clone(),
            _ => repo_base.join(BARE_DIR),
        };
        WorktreeLocation {
            worktree_path: repo_base.join(&self.worktree_name),
            repo_base,
            repo_path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeLocation {
    /// `<root>/<repo>`
    pub repo_base: PathBuf,
    /// Directory repository-level git commands run in.
    pub repo_path: PathBuf,
    /// `<root>/<repo>/<worktree_name>`
    pub worktree_path: PathBuf,
}

/// Pre-existing state that collides with a creation target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictSignature {
    pub dir_exists: bool,
    pub git_registered: bool,
    pub branch_exists: bool,
    /// Branch checked out at the registered path, when known.
    pub registered_branch: Option<String>,
}

impl ConflictSignature {
    pub fn has_conflict(&self) -> bool {
        self.dir_exists || self.git_registered || self.branch_exists
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupStep {
    RemoveWorktree {
        path: PathBuf,
        branch: Option<String>,
    },
    PruneStaleRecord {
        path: PathBuf,
    },
    RemoveDirectory {
        path: PathBuf,
    },
    DeleteBranch {
        branch: String,
    },
}

impl CleanupStep {
    pub fn touches_path(&self) -> bool {
        !matches!(self, CleanupStep::DeleteBranch { .. })
    }
}

impl fmt::Display for CleanupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanupStep::RemoveWorktree {
                path,
                branch: Some(branch),
            } if !branch.is_empty() => write!(
                f,
                "Remove worktree at {} (currently on branch '{}')",
                path.display(),
                branch
            ),
            CleanupStep::RemoveWorktree { path, .. } => {
                write!(f, "Remove worktree at {}", path.display())
            }
            CleanupStep::PruneStaleRecord { path } => {
                write!(f, "Remove stale worktree record at {}", path.display())
            }
            CleanupStep::RemoveDirectory { path } => {
                write!(f, "Remove directory at {}", path.display())
            }
            CleanupStep::DeleteBranch { branch } => {
                write!(f, "Delete existing branch '{branch}'")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Run the cleanup plan, then create a fresh branch and worktree.
    Overwrite,
    /// Run path cleanup only, then check out the existing branch.
    Attach,
    Cancel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    pub force: bool,
    pub use_existing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub decision: Decision,
    pub plan: Vec<CleanupStep>,
    pub warnings: Vec<String>,
}

impl Resolution {
    pub fn proceed() -> Self {
        Self {
            decision: Decision::Overwrite,
            plan: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created { path: PathBuf, attached: bool },
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    AlreadyAbsent,
}

/// Failures hit while undoing a failed creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollbackReport {
    pub failures: Vec<String>,
}

impl RollbackReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

impl fmt::Display for RollbackReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return Ok(());
        }
        write!(f, "\nRollback incomplete:")?;
        for failure in &self.failures {
            write!(f, "\n  - {failure}")?;
        }
        Ok(())
    }
}

/// A worktree found under the worktree root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorktreeListItem {
    pub name: String,
    pub repo: String,
    pub branch: Option<String>,
    pub path: PathBuf,
    pub has_changes: bool,
    /// RFC 3339 modification time of the worktree directory.
    pub last_modified: Option<String>,
    /// Repository directory the worktree is registered with.
    #[serde(skip)]
    pub repo_path: PathBuf,
}
