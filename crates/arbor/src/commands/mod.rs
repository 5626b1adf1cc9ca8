use clap::ArgMatches;
use tracing::error;

use arbor_core::events;

pub mod helpers;

mod action;
mod add;
mod completions;
mod list;
mod remove;
mod run;

pub fn run_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    events::log_app_startup();
    helpers::apply_color_choice(matches);

    match matches.subcommand() {
        Some(("add", sub_matches)) => add::handle_add_command(sub_matches),
        Some(("remove", sub_matches)) => remove::handle_remove_command(sub_matches),
        Some(("run", sub_matches)) => run::handle_run_command(sub_matches),
        Some(("list", sub_matches)) => list::handle_list_command(sub_matches),
        Some(("action", sub_matches)) => action::handle_action_command(sub_matches),
        Some(("completions", sub_matches)) => {
            completions::handle_completions_command(sub_matches)
        }
        _ => {
            error!(event = "cli.command_unknown");
            Err("Unknown command".into())
        }
    }
}
