use chrono::{DateTime, Local};
use clap::ArgMatches;
use tracing::{error, info};

use arbor_core::WorktreeListItem;
use arbor_core::events;
use arbor_core::git::GitCli;
use arbor_core::worktree::list_worktrees;

use colored::Colorize;

use super::helpers::load_config_with_warning;

pub(crate) fn handle_list_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = matches.get_flag("json");
    let repo_filter = matches.get_one::<String>("repo").map(String::as_str);

    info!(
        event = "cli.list_started",
        json_output = json_output,
        repo = repo_filter.unwrap_or("*")
    );

    let config = load_config_with_warning();
    let git = GitCli::new();

    match list_worktrees(&git, &config.worktree_root(), repo_filter) {
        Ok(items) => {
            if json_output {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else if items.is_empty() {
                println!("No worktrees found");
            } else {
                for item in &items {
                    println!("{}", format_row(item));
                }
            }

            info!(event = "cli.list_completed", count = items.len());
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Failed to list worktrees: {}", e);

            error!(
                event = "cli.list_failed",
                error = %e
            );

            events::log_app_error(&e);
            Err(e.into())
        }
    }
}

fn format_row(item: &WorktreeListItem) -> String {
    let status = if item.has_changes {
        format!("{:<10}", "modified").yellow().to_string()
    } else {
        format!("{:<10}", "clean")
    };
    format!(
        "{:<20} {:<20} {:<30} {} {}",
        item.repo,
        item.name,
        item.branch.as_deref().unwrap_or("(detached)"),
        status,
        format_modified(item.last_modified.as_deref())
    )
}

fn format_modified(raw: Option<&str>) -> String {
    raw.and_then(|value| DateTime::parse_from_rfc3339(value).ok())
        .map(|time| {
            time.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|| "-".to_string())
}
