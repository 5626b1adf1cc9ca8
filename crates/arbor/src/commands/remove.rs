use clap::ArgMatches;
use tracing::{error, info};

use arbor_core::events;
use arbor_core::git::GitCli;
use arbor_core::worktree::{Prompter, RemoveOutcome, Target, parse_target, remove};

use colored::Colorize;

use super::helpers::{StdinPrompter, load_config_with_warning, select_worktree};

pub(crate) fn handle_remove_command(
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let target = matches
        .get_one::<String>("target")
        .ok_or("Target argument is required")?;
    let mut force = matches.get_flag("force");

    let config = load_config_with_warning();
    let git = GitCli::new();

    let (repo_filter, name) = worktree_name_for(target);

    info!(
        event = "cli.remove_started",
        name = %name,
        repo = repo_filter.as_deref().unwrap_or("*"),
        force = force
    );

    let root = config.worktree_root();
    let Some(item) = select_worktree(&git, &root, &name, repo_filter.as_deref())? else {
        println!("Worktree '{}' not found, nothing to remove", name);
        info!(event = "cli.remove_not_found", name = %name);
        return Ok(());
    };

    if !force && item.has_changes {
        let accepted = StdinPrompter::new().confirm(&format!(
            "Worktree '{}' has uncommitted changes. Remove anyway?",
            name
        ))?;
        if !accepted {
            println!("Operation cancelled");
            info!(event = "cli.remove_cancelled", name = %name);
            return Ok(());
        }
        force = true;
    }

    let branch = item.branch.clone().unwrap_or_default();
    match remove(&git, &item.repo_path, &item.path, &branch, force) {
        Ok(RemoveOutcome::Removed) => {
            println!("{}", format!("Removed worktree: {}", name).green());
            info!(
                event = "cli.remove_completed",
                path = %item.path.display(),
                branch = %branch
            );
            Ok(())
        }
        Ok(RemoveOutcome::AlreadyAbsent) => {
            println!("Worktree '{}' not found, nothing to remove", name);
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Failed to remove worktree '{}': {}", name, e);

            error!(
                event = "cli.remove_failed",
                name = %name,
                error = %e
            );

            events::log_app_error(&e);
            Err(e.into())
        }
    }
}

/// Directory name (and repository, for URLs) a remove target refers to.
fn worktree_name_for(target: &str) -> (Option<String>, String) {
    match parse_target(target) {
        Target::PullRequest { repo, number, .. } => (Some(repo), format!("pr_{number}")),
        Target::Issue { repo, number, .. } => (Some(repo), format!("issue_{number}")),
        Target::Number(number) => (None, number.to_string()),
        Target::Local(name) => (None, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worktree_name_for_urls() {
        assert_eq!(
            worktree_name_for("https://github.com/octo/widgets/pull/12"),
            (Some("widgets".to_string()), "pr_12".to_string())
        );
        assert_eq!(
            worktree_name_for("https://github.com/octo/widgets/issues/3/"),
            (Some("widgets".to_string()), "issue_3".to_string())
        );
    }

    #[test]
    fn test_worktree_name_for_plain_names() {
        assert_eq!(worktree_name_for("pr_12"), (None, "pr_12".to_string()));
        assert_eq!(worktree_name_for("42"), (None, "42".to_string()));
    }
}
