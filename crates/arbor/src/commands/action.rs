use clap::ArgMatches;
use tracing::info;

use arbor_core::config::ArborConfig;

use colored::Colorize;

use super::helpers::load_config_with_warning;

pub(crate) fn handle_action_command(
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    if !matches.get_flag("list") {
        let mut cmd = crate::app::build_cli();
        if let Some(action) = cmd.find_subcommand_mut("action") {
            action.print_help()?;
        }
        return Ok(());
    }

    let config = load_config_with_warning();
    let silent = matches.get_flag("silent");

    for line in action_lines(&config, silent) {
        if line == NO_ACTIONS {
            println!("{}", line.yellow());
        } else {
            println!("{line}");
        }
    }

    info!(
        event = "cli.action_list_completed",
        count = config.actions.len(),
        silent = silent
    );
    Ok(())
}

const NO_ACTIONS: &str = "No actions configured.";

/// Lines printed by `action --list`; silent mode prints bare names only.
fn action_lines(config: &ArborConfig, silent: bool) -> Vec<String> {
    let names = config.action_names();
    if silent {
        return names.into_iter().map(str::to_string).collect();
    }
    if names.is_empty() {
        return vec![NO_ACTIONS.to_string()];
    }

    let mut lines = vec!["Available actions:".to_string()];
    lines.extend(names.into_iter().map(|name| format!("  - {name}")));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::config::ActionConfig;

    fn config(names: &[&str]) -> ArborConfig {
        ArborConfig {
            worktree_dir: None,
            actions: names
                .iter()
                .map(|name| ActionConfig {
                    name: name.to_string(),
                    dir: None,
                    cmds: vec!["true".to_string()],
                })
                .collect(),
        }
    }

    #[test]
    fn test_action_lines_formatted() {
        assert_eq!(
            action_lines(&config(&["claude", "tmux"]), false),
            vec!["Available actions:", "  - claude", "  - tmux"]
        );
    }

    #[test]
    fn test_action_lines_silent() {
        assert_eq!(action_lines(&config(&["claude", "tmux"]), true), vec!["claude", "tmux"]);
        assert!(action_lines(&config(&[]), true).is_empty());
    }

    #[test]
    fn test_action_lines_empty() {
        assert_eq!(action_lines(&config(&[]), false), vec![NO_ACTIONS]);
    }
}
