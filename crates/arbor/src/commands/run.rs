use std::collections::BTreeMap;

use clap::ArgMatches;
use tracing::{debug, error, info};

use arbor_core::actions::{
    ExecuteOptions, ShellRunner, StdioConfig, TemplateContext, execute_action, run_raw_command,
};
use arbor_core::events;
use arbor_core::forge::{self, RepositoryInfo};
use arbor_core::git::GitCli;
use arbor_core::worktree::WorktreeError;

use colored::Colorize;

use super::helpers::{
    cli_args, load_config_with_warning, print_action_event, root_dir, select_worktree,
};

pub(crate) fn handle_run_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let name = matches
        .get_one::<String>("worktree")
        .ok_or("Worktree argument is required")?;
    let action = matches.get_one::<String>("action");
    let trailing = cli_args(matches);

    if action.is_none() && trailing.is_empty() {
        let mut cmd = crate::app::build_cli();
        if let Some(run) = cmd.find_subcommand_mut("run") {
            run.print_help()?;
        }
        return Ok(());
    }

    let config = load_config_with_warning();
    let git = GitCli::new();

    info!(
        event = "cli.run_started",
        worktree = %name,
        action = action.map(String::as_str).unwrap_or(""),
        has_args = !trailing.is_empty()
    );

    let item = match select_worktree(&git, &config.worktree_root(), name, None)? {
        Some(item) if item.path.is_dir() => item,
        _ => {
            let e = WorktreeError::NotFound { name: name.clone() };
            eprintln!("❌ {}", e);
            events::log_app_error(&e);
            return Err(e.into());
        }
    };

    let runner = ShellRunner::new();
    let result = match action {
        Some(action) => {
            let mut context = TemplateContext::from_existing(
                &item,
                action,
                &trailing,
                &root_dir(&git, &item.path),
            );
            let current = forge::current_repository()
                .map_err(|e| debug!(event = "cli.run_repository_unresolved", error = %e))
                .ok();
            context.owner = owner_for(&item.repo, current);
            let options = ExecuteOptions::new(action, context);
            execute_action(&config, &runner, &options, &mut print_action_event)
        }
        None => {
            eprintln!("Running in worktree: {}", trailing);
            let stdio = StdioConfig::default();
            run_raw_command(&runner, &trailing, &item.path, &BTreeMap::new(), &stdio)
        }
    };

    match result {
        Ok(()) => {
            if action.is_some() {
                println!("{}", "Action completed successfully.".green());
            }
            info!(event = "cli.run_completed", worktree = %name);
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ {}", e);

            error!(
                event = "cli.run_failed",
                worktree = %name,
                error = %e
            );

            events::log_app_error(&e);
            Err(e.into())
        }
    }
}

/// Owner of the worktree's repository, taken from the current checkout's
/// GitHub remote only when that checkout is the same repository.
fn owner_for(worktree_repo: &str, current: Option<RepositoryInfo>) -> String {
    current
        .filter(|repo| repo.name == worktree_repo)
        .map(|repo| repo.owner)
        .unwrap_or_default()
}
