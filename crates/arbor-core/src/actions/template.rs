//! Template rendering for action commands.
//!
//! Uses minijinja with strict undefined handling: referencing any variable
//! outside the fixed set is an error instead of an empty string.
//!
//! # Variables
//!
//! | Name | Value |
//! |------|-------|
//! | `WorktreePath` | absolute worktree path |
//! | `WorktreeName` | final path component |
//! | `Action` | action name |
//! | `CLI_ARGS` | arguments after `--`, space-joined |
//! | `OS`, `ARCH` | host platform |
//! | `ROOT_DIR` | top of the invoking repository |
//! | `Type` | `pr`, `issue` or `local` |
//! | `Owner`, `Repo`, `Number`, `BranchName` | worktree metadata |

use std::path::Path;

use minijinja::{Environment, UndefinedBehavior, Value};
use serde::Serialize;
use tracing::debug;

use crate::actions::errors::ActionError;
use crate::worktree::{WorktreeKind, WorktreeListItem, WorktreeRequest};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateContext {
    #[serde(rename = "WorktreePath")]
    pub worktree_path: String,
    #[serde(rename = "WorktreeName")]
    pub worktree_name: String,
    #[serde(rename = "Action")]
    pub action: String,
    #[serde(rename = "CLI_ARGS")]
    pub cli_args: String,
    #[serde(rename = "OS")]
    pub os: String,
    #[serde(rename = "ARCH")]
    pub arch: String,
    #[serde(rename = "ROOT_DIR")]
    pub root_dir: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Owner")]
    pub owner: String,
    #[serde(rename = "Repo")]
    pub repo: String,
    /// Empty for local worktrees.
    #[serde(rename = "Number")]
    pub number: String,
    #[serde(rename = "BranchName")]
    pub branch_name: String,
}

impl TemplateContext {
    fn base(worktree_path: &Path, action: &str, cli_args: &str, root_dir: &Path) -> Self {
        Self {
            worktree_path: worktree_path.display().to_string(),
            worktree_name: worktree_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            action: action.to_string(),
            cli_args: cli_args.to_string(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            root_dir: root_dir.display().to_string(),
            kind: WorktreeKind::Local.as_str().to_string(),
            owner: String::new(),
            repo: String::new(),
            number: String::new(),
            branch_name: String::new(),
        }
    }

    /// Context for a worktree that was just created from `request`.
    pub fn from_request(
        request: &WorktreeRequest,
        worktree_path: &Path,
        action: &str,
        cli_args: &str,
        root_dir: &Path,
    ) -> Self {
        Self {
            kind: request.kind.as_str().to_string(),
            owner: request.owner.clone(),
            repo: request.repo.clone(),
            number: request.number.map(|n| n.to_string()).unwrap_or_default(),
            branch_name: request.branch_name.clone(),
            ..Self::base(worktree_path, action, cli_args, root_dir)
        }
    }

    /// Context for an existing worktree found on disk.
    ///
    /// The kind and number are recovered from `pr_<n>` / `issue_<n>` names.
    pub fn from_existing(
        item: &WorktreeListItem,
        action: &str,
        cli_args: &str,
        root_dir: &Path,
    ) -> Self {
        let (kind, number) = kind_from_name(&item.name);
        Self {
            kind: kind.as_str().to_string(),
            repo: item.repo.clone(),
            number: number.map(|n| n.to_string()).unwrap_or_default(),
            branch_name: item.branch.clone().unwrap_or_default(),
            ..Self::base(&item.path, action, cli_args, root_dir)
        }
    }
}

fn kind_from_name(name: &str) -> (WorktreeKind, Option<u64>) {
    if let Some(n) = name.strip_prefix("pr_").and_then(|n| n.parse().ok()) {
        (WorktreeKind::PullRequest, Some(n))
    } else if let Some(n) = name.strip_prefix("issue_").and_then(|n| n.parse().ok()) {
        (WorktreeKind::Issue, Some(n))
    } else {
        (WorktreeKind::Local, None)
    }
}

/// Render `template` against `context`.
///
/// `name` identifies the template in error messages.
pub fn render(template: &str, name: &str, context: &TemplateContext) -> Result<String, ActionError> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);

    let template_error = |e: minijinja::Error| ActionError::Template {
        name: name.to_string(),
        message: e.to_string(),
    };

    let tmpl = env
        .template_from_named_str(name, template)
        .map_err(template_error)?;
    let rendered = tmpl
        .render(Value::from_serialize(context))
        .map_err(template_error)?;

    debug!(
        event = "core.actions.template_rendered",
        name = name,
        template = template,
        result = %rendered
    );

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn context() -> TemplateContext {
        let request = WorktreeRequest::pull_request("octo", "widgets", 123, "feature-x");
        TemplateContext::from_request(
            &request,
            Path::new("/trees/widgets/pr_123"),
            "claude",
            "--resume",
            Path::new("/src/widgets"),
        )
    }

    #[test]
    fn test_render_known_variables() {
        let rendered = render(
            "cd {{ WorktreePath }} && echo {{ WorktreeName }} {{ Type }} {{ Owner }}/{{ Repo }}#{{ Number }} {{ BranchName }} {{ Action }} {{ CLI_ARGS }}",
            "cmd",
            &context(),
        )
        .unwrap();
        assert_eq!(
            rendered,
            "cd /trees/widgets/pr_123 && echo pr_123 pr octo/widgets#123 feature-x claude --resume"
        );
    }

    #[test]
    fn test_render_platform_and_root() {
        let rendered = render("{{ OS }}-{{ ARCH }} {{ ROOT_DIR }}", "cmd", &context()).unwrap();
        assert_eq!(
            rendered,
            format!(
                "{}-{} /src/widgets",
                std::env::consts::OS,
                std::env::consts::ARCH
            )
        );
    }

    #[test]
    fn test_render_unknown_variable_errors() {
        let err = render("echo {{ Unknown }}", "cmd", &context()).unwrap_err();
        assert!(matches!(err, ActionError::Template { ref name, .. } if name == "cmd"));
    }

    #[test]
    fn test_render_syntax_error() {
        let err = render("echo {{ WorktreePath", "dir", &context()).unwrap_err();
        assert!(err.to_string().contains("Failed to render template 'dir'"));
    }

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(render("make test", "cmd", &context()).unwrap(), "make test");
    }

    #[test]
    fn test_local_number_is_empty_but_defined() {
        let request = WorktreeRequest::local("proj", "spike", PathBuf::from("/src/proj"));
        let ctx = TemplateContext::from_request(
            &request,
            Path::new("/trees/proj/spike"),
            "a",
            "",
            Path::new("/src/proj"),
        );
        assert_eq!(render("[{{ Number }}]{{ Type }}", "cmd", &ctx).unwrap(), "[]local");
    }

    #[test]
    fn test_from_existing_recovers_kind() {
        let item = WorktreeListItem {
            name: "issue_42".to_string(),
            repo: "widgets".to_string(),
            branch: Some("issue_42".to_string()),
            path: PathBuf::from("/trees/widgets/issue_42"),
            has_changes: false,
            last_modified: None,
            repo_path: PathBuf::from("/trees/widgets/.bare"),
        };
        let ctx = TemplateContext::from_existing(&item, "a", "", Path::new("/"));
        assert_eq!(ctx.kind, "issue");
        assert_eq!(ctx.number, "42");
        assert_eq!(ctx.worktree_name, "issue_42");
    }
}
