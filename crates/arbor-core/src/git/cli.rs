//! Git backend backed by the `git` CLI and `git2`.
//!
//! Mutating and network operations (`worktree add`, `fetch`, `clone`) go
//! through the git CLI so they inherit the user's SSH agent, credential
//! helpers and hooks. Read-only queries (branch lookup, status, HEAD) use
//! git2 to avoid spawning a process per check.
//!
//! Each operation validates arguments, logs structured events, and maps errors consistently.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use git2::{BranchType, ErrorCode, Repository, Status, StatusOptions};
use tracing::{debug, info, warn};

use super::errors::GitError;
use super::operations::{format_command, normalize_path, parse_worktree_porcelain};
use super::traits::GitBackend;
use super::types::WorktreeEntry;

/// Fetch refspec configured on fresh bare clones so remote branches are tracked.
pub const ORIGIN_FETCH_REFSPEC: &str = "+refs/heads/*:refs/remotes/origin/*";

/// Validate a git argument to prevent injection.
///
/// Rejects empty values, values that start with `-` (option injection),
/// control characters, and `::` sequences (refspec injection).
pub fn validate_git_arg(value: &str, label: &str) -> Result<(), GitError> {
    let invalid = |message: String| GitError::InvalidArgument {
        label: label.to_string(),
        message,
    };

    if value.is_empty() {
        return Err(invalid("must not be empty".to_string()));
    }
    if value.starts_with('-') {
        return Err(invalid(format!("'{value}' (must not start with '-')")));
    }
    if value.chars().any(|c| c.is_control()) {
        return Err(invalid("contains control characters".to_string()));
    }
    if value.contains("::") {
        return Err(invalid("'::' sequences are not allowed".to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        Self
    }

    fn run(&self, program: &str, dir: &Path, args: &[&str]) -> Result<String, GitError> {
        let command = format_command(program, args);
        debug!(
            event = "core.git.command_started",
            command = %command,
            path = %dir.display()
        );

        let output = Command::new(program)
            .current_dir(dir)
            .args(args)
            .output()
            .map_err(|e| GitError::CommandFailed {
                command: command.clone(),
                message: format!("Failed to execute {program} in {}: {e}", dir.display()),
            })?;

        if output.status.success() {
            debug!(event = "core.git.command_completed", command = %command);
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = match stderr.trim() {
            "" => format!("exit status {}", output.status.code().unwrap_or(-1)),
            trimmed => trimmed.to_string(),
        };
        warn!(
            event = "core.git.command_failed",
            command = %command,
            path = %dir.display(),
            stderr = %message
        );
        Err(GitError::CommandFailed { command, message })
    }

    fn git(&self, dir: &Path, args: &[&str]) -> Result<String, GitError> {
        self.run("git", dir, args)
    }

    fn open(&self, path: &Path) -> Result<Repository, GitError> {
        Repository::open(path).map_err(|e| match e.code() {
            ErrorCode::NotFound => GitError::RepositoryNotFound {
                path: path.display().to_string(),
            },
            _ => GitError::Git2Error { source: e },
        })
    }

    fn discover(&self, path: &Path) -> Result<Repository, GitError> {
        Repository::discover(path).map_err(|e| match e.code() {
            ErrorCode::NotFound => GitError::NotInRepository,
            _ => GitError::Git2Error { source: e },
        })
    }
}

fn path_arg<'a>(path: &'a Path, label: &str) -> Result<&'a str, GitError> {
    path.to_str().ok_or_else(|| GitError::InvalidArgument {
        label: label.to_string(),
        message: format!("'{}' is not valid UTF-8", path.display()),
    })
}

impl GitBackend for GitCli {
    fn worktree_add(
        &self,
        repo: &Path,
        branch: &str,
        path: &Path,
        start_point: &str,
    ) -> Result<(), GitError> {
        validate_git_arg(branch, "branch name")?;
        validate_git_arg(start_point, "start point")?;
        let path_str = path_arg(path, "worktree path")?;

        info!(
            event = "core.git.worktree.create_started",
            branch = branch,
            start_point = start_point,
            path = %path.display()
        );

        self.git(
            repo,
            &["worktree", "add", "-b", branch, path_str, start_point],
        )?;

        info!(
            event = "core.git.worktree.create_completed",
            branch = branch,
            path = %path.display()
        );
        Ok(())
    }

    fn worktree_add_from_branch(
        &self,
        repo: &Path,
        branch: &str,
        path: &Path,
    ) -> Result<(), GitError> {
        validate_git_arg(branch, "branch name")?;
        let path_str = path_arg(path, "worktree path")?;

        info!(
            event = "core.git.worktree.attach_started",
            branch = branch,
            path = %path.display()
        );

        self.git(repo, &["worktree", "add", path_str, branch])?;

        info!(
            event = "core.git.worktree.attach_completed",
            branch = branch,
            path = %path.display()
        );
        Ok(())
    }

    fn worktree_remove(&self, repo: &Path, path: &Path, force: bool) -> Result<(), GitError> {
        let path_str = path_arg(path, "worktree path")?;

        info!(
            event = "core.git.worktree.remove_started",
            path = %path.display(),
            force = force
        );

        let mut args = vec!["worktree", "remove"];
        if force {
            args.push("--force");
        }
        args.push(path_str);
        self.git(repo, &args)?;

        info!(event = "core.git.worktree.remove_completed", path = %path.display());
        Ok(())
    }

    fn worktree_list(&self, repo: &Path) -> Result<Vec<WorktreeEntry>, GitError> {
        let output = self.git(repo, &["worktree", "list", "--porcelain"])?;
        Ok(parse_worktree_porcelain(&output))
    }

    fn worktree_prune(&self, repo: &Path) -> Result<(), GitError> {
        self.git(repo, &["worktree", "prune"])?;
        debug!(event = "core.git.worktree.prune_completed", repo = %repo.display());
        Ok(())
    }

    fn branch_exists(&self, repo: &Path, name: &str) -> Result<bool, GitError> {
        let repository = self.open(repo)?;
        match repository.find_branch(name, BranchType::Local) {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.code(), ErrorCode::NotFound | ErrorCode::InvalidSpec) => Ok(false),
            Err(e) => Err(GitError::Git2Error { source: e }),
        }
    }

    fn branch_delete(&self, repo: &Path, name: &str, force: bool) -> Result<(), GitError> {
        validate_git_arg(name, "branch name")?;

        info!(
            event = "core.git.branch.delete_started",
            branch = name,
            force = force
        );

        let flag = if force { "-D" } else { "-d" };
        self.git(repo, &["branch", flag, name])?;

        info!(event = "core.git.branch.delete_completed", branch = name);
        Ok(())
    }

    fn current_branch(&self, path: &Path) -> Result<Option<String>, GitError> {
        let repository = self.open(path)?;
        let head = match repository.head() {
            Ok(head) => head,
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                debug!(event = "core.git.head_unborn", path = %path.display());
                return Ok(None);
            }
            Err(e) => return Err(GitError::Git2Error { source: e }),
        };

        if !head.is_branch() {
            debug!(event = "core.git.head_detached", path = %path.display());
            return Ok(None);
        }

        Ok(head.shorthand().map(str::to_string))
    }

    fn fetch(&self, repo: &Path, refspec: &str) -> Result<(), GitError> {
        validate_git_arg(refspec, "refspec")?;

        info!(
            event = "core.git.fetch_started",
            refspec = refspec,
            path = %repo.display()
        );

        self.git(repo, &["fetch", "origin", refspec])?;

        info!(event = "core.git.fetch_completed", refspec = refspec);
        Ok(())
    }

    fn has_uncommitted_changes(&self, path: &Path) -> Result<bool, GitError> {
        let repository = self.open(path)?;

        let mut opts = StatusOptions::new();
        opts.include_untracked(true);
        opts.include_ignored(false);

        let statuses = repository.statuses(Some(&mut opts))?;
        let dirty = statuses.iter().any(|entry| {
            entry.status().intersects(
                Status::INDEX_NEW
                    | Status::INDEX_MODIFIED
                    | Status::INDEX_DELETED
                    | Status::INDEX_RENAMED
                    | Status::INDEX_TYPECHANGE
                    | Status::WT_NEW
                    | Status::WT_MODIFIED
                    | Status::WT_DELETED
                    | Status::WT_RENAMED
                    | Status::WT_TYPECHANGE
                    | Status::CONFLICTED,
            )
        });

        debug!(
            event = "core.git.status_checked",
            path = %path.display(),
            dirty = dirty
        );
        Ok(dirty)
    }

    fn is_git_repository(&self, path: &Path) -> bool {
        Repository::open(path).is_ok()
    }

    fn clone_bare(&self, owner: &str, repo: &str, dest: &Path) -> Result<(), GitError> {
        validate_git_arg(owner, "repository owner")?;
        validate_git_arg(repo, "repository name")?;
        let dest_str = path_arg(dest, "clone destination")?;
        let parent = dest.parent().unwrap_or_else(|| Path::new("."));
        let slug = format!("{owner}/{repo}");

        info!(
            event = "core.git.clone_started",
            repository = %slug,
            dest = %dest.display()
        );

        if which::which("gh").is_ok() {
            self.run(
                "gh",
                parent,
                &["repo", "clone", &slug, dest_str, "--", "--bare"],
            )?;
        } else {
            warn!(event = "core.git.clone_gh_missing", repository = %slug);
            let url = format!("https://github.com/{slug}.git");
            self.git(parent, &["clone", "--bare", &url, dest_str])?;
        }

        info!(event = "core.git.clone_completed", repository = %slug);
        Ok(())
    }

    fn configure_fetch_refspec(&self, repo: &Path) -> Result<(), GitError> {
        self.git(
            repo,
            &["config", "--add", "remote.origin.fetch", ORIGIN_FETCH_REFSPEC],
        )?;
        debug!(event = "core.git.fetch_refspec_configured", repo = %repo.display());
        Ok(())
    }

    fn common_dir(&self, path: &Path) -> Result<PathBuf, GitError> {
        let repository = self.discover(path)?;
        let git_dir = repository.path();

        // Linked worktrees point at the shared directory through a `commondir` file
        let common = match fs::read_to_string(git_dir.join("commondir")) {
            Ok(contents) => {
                let target = Path::new(contents.trim());
                if target.is_absolute() {
                    target.to_path_buf()
                } else {
                    git_dir.join(target)
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => git_dir.to_path_buf(),
            Err(e) => return Err(e.into()),
        };

        debug!(
            event = "core.git.common_dir_resolved",
            path = %path.display(),
            common_dir = %common.display()
        );
        Ok(normalize_path(&common))
    }

    fn toplevel(&self, path: &Path) -> Result<PathBuf, GitError> {
        let repository = self.discover(path)?;
        match repository.workdir() {
            Some(workdir) => Ok(workdir.components().collect()),
            None => Err(GitError::BareRepository {
                path: repository.path().display().to_string(),
            }),
        }
    }
}
