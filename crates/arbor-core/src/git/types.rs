use std::path::PathBuf;

/// One record from `git worktree list --porcelain`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorktreeEntry {
    pub path: PathBuf,
    /// Commit checked out, absent for bare entries.
    pub head: Option<String>,
    /// Short branch name (`refs/heads/` stripped); `None` when detached or bare.
    pub branch: Option<String>,
    pub bare: bool,
    pub detached: bool,
    /// Git reports the directory as missing.
    pub prunable: bool,
}

impl WorktreeEntry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_branch(mut self, branch: &str) -> Self {
        self.branch = Some(branch.to_string());
        self
    }

    pub fn is_on_branch(&self, branch: &str) -> bool {
        self.branch.as_deref() == Some(branch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worktree_entry_builder() {
        let entry = WorktreeEntry::new("/tmp/wt").with_branch("feature-x");
        assert_eq!(entry.path, PathBuf::from("/tmp/wt"));
        assert!(entry.is_on_branch("feature-x"));
        assert!(!entry.is_on_branch("main"));
        assert!(!entry.bare);
    }
}
