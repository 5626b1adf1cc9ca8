use std::path::{Component, Path, PathBuf};

use crate::git::types::WorktreeEntry;

/// Parse `git worktree list --porcelain` output.
///
/// Records are separated by blank lines. Unknown attribute lines are ignored.
pub fn parse_worktree_porcelain(output: &str) -> Vec<WorktreeEntry> {
    let mut entries = Vec::new();
    let mut current: Option<WorktreeEntry> = None;

    for line in output.lines() {
        if line.trim().is_empty() {
            if let Some(entry) = current.take() {
                entries.push(entry);
            }
            continue;
        }

        if let Some(path) = line.strip_prefix("worktree ") {
            if let Some(entry) = current.take() {
                entries.push(entry);
            }
            current = Some(WorktreeEntry::new(path));
            continue;
        }

        let Some(entry) = current.as_mut() else {
            continue;
        };

        if let Some(head) = line.strip_prefix("HEAD ") {
            entry.head = Some(head.to_string());
        } else if let Some(branch) = line.strip_prefix("branch ") {
            let short = branch.strip_prefix("refs/heads/").unwrap_or(branch);
            entry.branch = Some(short.to_string());
        } else if line == "bare" {
            entry.bare = true;
        } else if line == "detached" {
            entry.detached = true;
        } else if line == "prunable" || line.starts_with("prunable ") {
            entry.prunable = true;
        }
    }

    if let Some(entry) = current {
        entries.push(entry);
    }

    entries
}

/// Normalize a path for comparison against git's worktree records.
///
/// Lexically removes `.` components and trailing separators, then resolves
/// symlinks on the longest existing ancestor so aliases such as `/tmp` and
/// `/private/tmp` compare equal even when the leaf does not exist yet.
pub fn normalize_path(path: &Path) -> PathBuf {
    let lexical: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    if let Ok(canonical) = lexical.canonicalize() {
        return canonical;
    }

    let mut existing = lexical.as_path();
    let mut missing = Vec::new();
    while let Some(parent) = existing.parent() {
        if let Some(name) = existing.file_name() {
            missing.push(name.to_os_string());
        }
        existing = parent;
        if let Ok(canonical) = existing.canonicalize() {
            let mut resolved = canonical;
            for name in missing.iter().rev() {
                resolved.push(name);
            }
            return resolved;
        }
    }

    lexical
}

pub fn paths_equal(a: &Path, b: &Path) -> bool {
    a == b || normalize_path(a) == normalize_path(b)
}

/// Find the registered worktree entry for `path`.
///
/// Exact (normalized) matches win; otherwise an entry whose path ends with
/// the given path is accepted, which covers relative paths from callers.
pub fn find_registered_entry<'a>(
    entries: &'a [WorktreeEntry],
    path: &Path,
) -> Option<&'a WorktreeEntry> {
    entries
        .iter()
        .find(|entry| paths_equal(&entry.path, path))
        .or_else(|| {
            if path.is_absolute() || path.as_os_str().is_empty() {
                return None;
            }
            entries.iter().find(|entry| entry.path.ends_with(path))
        })
}

/// Directory to run repository-level git commands in, given a git common dir.
///
/// A `.git` common dir belongs to a regular checkout, so its parent is used.
/// Any other common dir (such as `<repo>/.bare`) is a bare repository.
pub fn repository_root(common_dir: &Path) -> PathBuf {
    let trimmed: PathBuf = common_dir.components().collect();
    match trimmed.file_name().and_then(|n| n.to_str()) {
        Some(".git") => trimmed
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(trimmed),
        _ => trimmed,
    }
}

/// Render a git invocation for error messages and logs.
pub fn format_command(program: &str, args: &[&str]) -> String {
    let mut command = program.to_string();
    for arg in args {
        command.push(' ');
        command.push_str(arg);
    }
    command
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const PORCELAIN: &str = "worktree /home/me/trees/r/.bare
bare

worktree /home/me/trees/r/pr_123
HEAD 1f2e3d4c5b6a79881f2e3d4c5b6a79881f2e3d4c
branch refs/heads/feature-x

worktree /home/me/trees/r/scratch
HEAD 0000000000000000000000000000000000000001
detached
prunable gitdir file points to non-existent location
";

    #[test]
    fn test_parse_worktree_porcelain() {
        let entries = parse_worktree_porcelain(PORCELAIN);
        assert_eq!(entries.len(), 3);

        assert!(entries[0].bare);
        assert!(entries[0].branch.is_none());

        assert_eq!(entries[1].path, PathBuf::from("/home/me/trees/r/pr_123"));
        assert_eq!(entries[1].branch.as_deref(), Some("feature-x"));
        assert!(entries[1].head.is_some());

        assert!(entries[2].detached);
        assert!(entries[2].prunable);
        assert!(entries[2].branch.is_none());
    }

    #[test]
    fn test_parse_worktree_porcelain_empty() {
        assert!(parse_worktree_porcelain("").is_empty());
        assert!(parse_worktree_porcelain("\n\n").is_empty());
    }

    #[test]
    fn test_normalize_path_strips_trailing_separator() {
        let dir = TempDir::new().unwrap();
        let with_slash = PathBuf::from(format!("{}/", dir.path().display()));
        assert_eq!(normalize_path(&with_slash), normalize_path(dir.path()));
    }

    #[test]
    fn test_normalize_path_missing_leaf_resolves_parent() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("not-yet").join("created");
        let canonical_parent = dir.path().canonicalize().unwrap();
        assert_eq!(
            normalize_path(&missing),
            canonical_parent.join("not-yet").join("created")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_paths_equal_through_symlink() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real");
        fs::create_dir(&real).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        assert!(paths_equal(&link.join("wt"), &real.join("wt")));
    }

    #[test]
    fn test_find_registered_entry_exact_then_suffix() {
        let entries = parse_worktree_porcelain(PORCELAIN);

        let exact = find_registered_entry(&entries, Path::new("/home/me/trees/r/pr_123"));
        assert_eq!(exact.unwrap().branch.as_deref(), Some("feature-x"));

        let suffix = find_registered_entry(&entries, Path::new("r/pr_123"));
        assert_eq!(suffix.unwrap().path, PathBuf::from("/home/me/trees/r/pr_123"));

        assert!(find_registered_entry(&entries, Path::new("/elsewhere/pr_123")).is_none());
    }

    #[test]
    fn test_repository_root() {
        assert_eq!(
            repository_root(Path::new("/src/project/.git")),
            PathBuf::from("/src/project")
        );
        assert_eq!(
            repository_root(Path::new("/src/project/.git/")),
            PathBuf::from("/src/project")
        );
        assert_eq!(
            repository_root(Path::new("/trees/r/.bare")),
            PathBuf::from("/trees/r/.bare")
        );
    }

    #[test]
    fn test_format_command() {
        assert_eq!(
            format_command("git", &["worktree", "add", "-b", "issue_1"]),
            "git worktree add -b issue_1"
        );
    }
}
