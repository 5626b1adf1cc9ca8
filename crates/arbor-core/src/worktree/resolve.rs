use std::io;

use tracing::{info, warn};

use crate::git::{GitBackend, paths_equal};
use crate::worktree::classify::{format_plan, plan_steps};
use crate::worktree::errors::WorktreeError;
use crate::worktree::types::{
    ConflictSignature, Decision, Resolution, ResolveOptions, WorktreeLocation, WorktreeRequest,
};

/// Yes/no confirmation source.
pub trait Prompter {
    /// Ask `message`; `Ok(true)` means the user accepted.
    fn confirm(&mut self, message: &str) -> io::Result<bool>;
}

/// Turn a conflict signature into a decision, prompting unless forced.
pub fn resolve(
    git: &dyn GitBackend,
    signature: &ConflictSignature,
    request: &WorktreeRequest,
    location: &WorktreeLocation,
    options: ResolveOptions,
    prompter: &mut dyn Prompter,
) -> Result<Resolution, WorktreeError> {
    if !signature.has_conflict() {
        return Ok(Resolution::proceed());
    }

    let branch = &request.branch_name;
    let mut plan = plan_steps(signature, &location.worktree_path, branch);

    let decision = if options.use_existing && signature.branch_exists {
        plan.retain(|step| step.touches_path());
        Decision::Attach
    } else {
        Decision::Overwrite
    };

    let warnings = collect_warnings(git, signature, location, branch, decision);

    let needs_prompt = !options.force && (decision == Decision::Overwrite || !plan.is_empty());

    info!(
        event = "core.worktree.resolve_started",
        branch = %branch,
        path = %location.worktree_path.display(),
        steps = plan.len(),
        warnings = warnings.len(),
        prompt = needs_prompt
    );

    if needs_prompt {
        let message = prompt_message(branch, &plan, &warnings, decision);
        let accepted = prompter
            .confirm(&message)
            .map_err(|e| WorktreeError::PromptFailed {
                message: e.to_string(),
            })?;

        if !accepted {
            info!(event = "core.worktree.resolve_cancelled", branch = %branch);
            return Ok(Resolution {
                decision: Decision::Cancel,
                plan,
                warnings,
            });
        }
    }

    info!(
        event = "core.worktree.resolve_completed",
        branch = %branch,
        decision = ?decision
    );

    Ok(Resolution {
        decision,
        plan,
        warnings,
    })
}

/// Prompt text: plan, warnings, then the question.
pub fn prompt_message(
    branch: &str,
    plan: &[crate::worktree::types::CleanupStep],
    warnings: &[String],
    decision: Decision,
) -> String {
    let mut message = format_plan(branch, plan, decision);
    for warning in warnings {
        message.push('\n');
        message.push_str(warning);
        message.push('\n');
    }
    match decision {
        Decision::Attach => message.push_str("\nContinue?"),
        _ => message.push_str("\nOverwrite?"),
    }
    message
}

fn collect_warnings(
    git: &dyn GitBackend,
    signature: &ConflictSignature,
    location: &WorktreeLocation,
    branch: &str,
    decision: Decision,
) -> Vec<String> {
    let mut warnings = Vec::new();
    let target = &location.worktree_path;

    if signature.dir_exists && git.is_git_repository(target) && is_dirty(git, target) {
        warnings.push(format!(
            "WARNING: Worktree at {} has uncommitted changes that will be PERMANENTLY DELETED. \
             Consider committing or stashing changes first.",
            target.display()
        ));
    }

    if signature.branch_exists && decision == Decision::Overwrite {
        let entries = match git.worktree_list(&location.repo_path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    event = "core.worktree.resolve_list_failed",
                    repo = %location.repo_path.display(),
                    error = %e
                );
                Vec::new()
            }
        };

        for entry in entries.iter().filter(|e| e.is_on_branch(branch)) {
            if signature.dir_exists && paths_equal(&entry.path, target) {
                continue;
            }
            if entry.path.exists() && is_dirty(git, &entry.path) {
                warnings.push(format!(
                    "WARNING: Branch '{}' has uncommitted changes in worktree at {} that will be \
                     PERMANENTLY DELETED. Consider committing or stashing changes first.",
                    branch,
                    entry.path.display()
                ));
            }
        }
    }

    warnings
}

fn is_dirty(git: &dyn GitBackend, path: &std::path::Path) -> bool {
    match git.has_uncommitted_changes(path) {
        Ok(dirty) => dirty,
        Err(e) => {
            warn!(
                event = "core.worktree.status_check_failed",
                path = %path.display(),
                error = %e,
                "Failed to get git status - assuming dirty to be safe"
            );
            true
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::git::fake::FakeGit;
    use crate::worktree::classify::classify;
    use crate::worktree::types::CleanupStep;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Prompter answering from a script and recording every question.
    pub(crate) struct ScriptedPrompter {
        answers: Vec<io::Result<bool>>,
        pub(crate) asked: Vec<String>,
    }

    impl ScriptedPrompter {
        pub(crate) fn answering(answers: Vec<bool>) -> Self {
            Self {
                answers: answers.into_iter().map(Ok).collect(),
                asked: Vec::new(),
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                answers: vec![Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"))],
                asked: Vec::new(),
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn confirm(&mut self, message: &str) -> io::Result<bool> {
            self.asked.push(message.to_string());
            if self.answers.is_empty() {
                return Ok(false);
            }
            self.answers.remove(0)
        }
    }

    fn pr_request() -> WorktreeRequest {
        WorktreeRequest::pull_request("o", "r", 123, "feature-x")
    }

    #[test]
    fn test_no_conflict_never_prompts() {
        let dir = TempDir::new().unwrap();
        let git = FakeGit::new();
        let request = pr_request();
        let location = request.location(dir.path());
        let mut prompter = ScriptedPrompter::answering(vec![]);

        let resolution = resolve(
            &git,
            &ConflictSignature::default(),
            &request,
            &location,
            ResolveOptions::default(),
            &mut prompter,
        )
        .unwrap();

        assert_eq!(resolution.decision, Decision::Overwrite);
        assert!(resolution.plan.is_empty());
        assert!(prompter.asked.is_empty());
    }

    #[test]
    fn test_declined_prompt_cancels_without_mutation() {
        let dir = TempDir::new().unwrap();
        let request = pr_request();
        let location = request.location(dir.path());
        fs::create_dir_all(&location.worktree_path).unwrap();
        let git = FakeGit::new()
            .with_repo(&location.repo_path, &["main"])
            .with_worktree(&location.repo_path, &location.worktree_path, "feature-x");

        let before = classify(&git, &location.repo_path, &location.worktree_path, "feature-x");
        let mut prompter = ScriptedPrompter::answering(vec![false]);
        let resolution = resolve(
            &git,
            &before,
            &request,
            &location,
            ResolveOptions::default(),
            &mut prompter,
        )
        .unwrap();

        assert_eq!(resolution.decision, Decision::Cancel);
        assert_eq!(prompter.asked.len(), 1);
        assert!(prompter.asked[0].ends_with("Overwrite?"));
        assert!(git.calls().is_empty());
        let after = classify(&git, &location.repo_path, &location.worktree_path, "feature-x");
        assert_eq!(before, after);
    }

    #[test]
    fn test_force_skips_prompt() {
        let dir = TempDir::new().unwrap();
        let request = pr_request();
        let location = request.location(dir.path());
        let git = FakeGit::new().with_repo(&location.repo_path, &["feature-x"]);
        let signature = classify(&git, &location.repo_path, &location.worktree_path, "feature-x");
        let mut prompter = ScriptedPrompter::answering(vec![]);

        let resolution = resolve(
            &git,
            &signature,
            &request,
            &location,
            ResolveOptions {
                force: true,
                use_existing: false,
            },
            &mut prompter,
        )
        .unwrap();

        assert_eq!(resolution.decision, Decision::Overwrite);
        assert_eq!(
            resolution.plan,
            vec![CleanupStep::DeleteBranch {
                branch: "feature-x".to_string()
            }]
        );
        assert!(prompter.asked.is_empty());
    }

    #[test]
    fn test_use_existing_branch_only_attaches_silently() {
        let dir = TempDir::new().unwrap();
        let request = WorktreeRequest::issue("o", "r", 7);
        let location = request.location(dir.path());
        let git = FakeGit::new().with_repo(&location.repo_path, &["main", "issue_7"]);
        let signature = classify(&git, &location.repo_path, &location.worktree_path, "issue_7");
        let mut prompter = ScriptedPrompter::answering(vec![]);

        let resolution = resolve(
            &git,
            &signature,
            &request,
            &location,
            ResolveOptions {
                force: false,
                use_existing: true,
            },
            &mut prompter,
        )
        .unwrap();

        assert_eq!(resolution.decision, Decision::Attach);
        assert!(resolution.plan.is_empty());
        assert!(prompter.asked.is_empty());
    }

    #[test]
    fn test_use_existing_with_directory_prompts_and_keeps_path_step() {
        let dir = TempDir::new().unwrap();
        let request = WorktreeRequest::issue("o", "r", 7);
        let location = request.location(dir.path());
        fs::create_dir_all(&location.worktree_path).unwrap();
        let git = FakeGit::new().with_repo(&location.repo_path, &["issue_7"]);
        let signature = classify(&git, &location.repo_path, &location.worktree_path, "issue_7");
        let mut prompter = ScriptedPrompter::answering(vec![true]);

        let resolution = resolve(
            &git,
            &signature,
            &request,
            &location,
            ResolveOptions {
                force: false,
                use_existing: true,
            },
            &mut prompter,
        )
        .unwrap();

        assert_eq!(resolution.decision, Decision::Attach);
        assert_eq!(
            resolution.plan,
            vec![CleanupStep::RemoveDirectory {
                path: location.worktree_path.clone()
            }]
        );
        assert_eq!(prompter.asked.len(), 1);
        assert!(!prompter.asked[0].contains("Delete existing branch"));
        assert!(prompter.asked[0].ends_with("Continue?"));
    }

    #[test]
    fn test_prompt_failure_is_an_error() {
        let dir = TempDir::new().unwrap();
        let request = pr_request();
        let location = request.location(dir.path());
        let git = FakeGit::new().with_repo(&location.repo_path, &["feature-x"]);
        let signature = classify(&git, &location.repo_path, &location.worktree_path, "feature-x");

        let err = resolve(
            &git,
            &signature,
            &request,
            &location,
            ResolveOptions::default(),
            &mut ScriptedPrompter::failing(),
        )
        .unwrap_err();

        assert!(matches!(err, WorktreeError::PromptFailed { .. }));
    }

    #[test]
    fn test_dirty_branch_warning_names_other_worktree() {
        let dir = TempDir::new().unwrap();
        let request = pr_request();
        let location = request.location(dir.path());
        let other = dir.path().join("elsewhere").join("feature-checkout");
        fs::create_dir_all(&other).unwrap();
        let git = FakeGit::new()
            .with_repo(&location.repo_path, &["main"])
            .with_worktree(&location.repo_path, &other, "feature-x");
        git.mark_dirty(&other);

        let signature = classify(&git, &location.repo_path, &location.worktree_path, "feature-x");
        assert!(signature.branch_exists);
        assert!(!signature.dir_exists);

        let mut prompter = ScriptedPrompter::answering(vec![true]);
        let resolution = resolve(
            &git,
            &signature,
            &request,
            &location,
            ResolveOptions::default(),
            &mut prompter,
        )
        .unwrap();

        assert_eq!(resolution.warnings.len(), 1);
        assert!(resolution.warnings[0].contains(&other.display().to_string()));
        assert!(resolution.warnings[0].contains("Branch 'feature-x'"));
        assert!(prompter.asked[0].contains("PERMANENTLY DELETED"));
    }

    #[test]
    fn test_dirty_target_warning() {
        let dir = TempDir::new().unwrap();
        let request = pr_request();
        let location = request.location(dir.path());
        fs::create_dir_all(&location.worktree_path).unwrap();
        let git = FakeGit::new()
            .with_repo(&location.repo_path, &["main"])
            .with_worktree(&location.repo_path, &location.worktree_path, "feature-x");
        git.mark_dirty(&location.worktree_path);

        let signature = classify(&git, &location.repo_path, &location.worktree_path, "feature-x");
        let resolution = resolve(
            &git,
            &signature,
            &request,
            &location,
            ResolveOptions {
                force: true,
                use_existing: false,
            },
            &mut ScriptedPrompter::answering(vec![]),
        )
        .unwrap();

        assert_eq!(resolution.warnings.len(), 1);
        assert!(resolution.warnings[0].starts_with(&format!(
            "WARNING: Worktree at {}",
            location.worktree_path.display()
        )));
    }

    #[test]
    fn test_prompt_message_layout() {
        let message = prompt_message(
            "b",
            &[CleanupStep::RemoveDirectory {
                path: Path::new("/x").to_path_buf(),
            }],
            &["WARNING: careful".to_string()],
            Decision::Overwrite,
        );
        assert_eq!(
            message,
            "Target: create worktree for 'b'\n\nThis will:\n- Remove directory at /x\n\
             - Create worktree and branch for 'b'\n\nWARNING: careful\n\nOverwrite?"
        );
    }
}
