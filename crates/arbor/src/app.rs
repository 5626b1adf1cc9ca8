use clap::{Arg, ArgAction, Command};
use clap_complete::Shell;

pub fn build_cli() -> Command {
    Command::new("arbor")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Create git worktrees from GitHub pull requests, issues and local branches")
        .long_about("arbor creates git worktrees under a shared root, one per pull request, issue or local branch, resolving conflicts with existing worktrees and branches. Configured actions can run templated shell commands inside a worktree right after it is created.")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("force")
                .short('f')
                .long("force")
                .help("Skip confirmation prompts and overwrite conflicting state")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colored output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("add")
                .about("Add a worktree for a pull request, issue or local branch")
                .visible_alias("create")
                .after_help(
                    "Examples:\n  \
                     arbor add https://github.com/owner/repo/pull/123\n  \
                     arbor add https://github.com/owner/repo/issues/456\n  \
                     arbor add my-feature-branch\n  \
                     arbor add --pr 123 --name review -a claude -- fix the tests",
                )
                .arg(
                    Arg::new("target")
                        .help("Pull request URL, issue URL, or a name for a local branch"),
                )
                .arg(
                    Arg::new("pr")
                        .long("pr")
                        .help("Pull request number or URL")
                        .conflicts_with_all(["target", "issue"]),
                )
                .arg(
                    Arg::new("issue")
                        .long("issue")
                        .help("Issue number or URL")
                        .conflicts_with("target"),
                )
                .arg(
                    Arg::new("name")
                        .long("name")
                        .short('n')
                        .help("Worktree directory name (overrides pr_<n> / issue_<n>)"),
                )
                .arg(
                    Arg::new("action")
                        .long("action")
                        .short('a')
                        .help("Action to run after the worktree is created"),
                )
                .arg(
                    Arg::new("use-existing")
                        .long("use-existing")
                        .short('e')
                        .help("Attach to an existing branch instead of recreating it")
                        .action(ArgAction::SetTrue),
                )
                .arg(cli_args_arg()),
        )
        .subcommand(
            Command::new("remove")
                .about("Remove a worktree and its branch")
                .visible_alias("rm")
                .arg(
                    Arg::new("target")
                        .help("Worktree name, or the pull request / issue URL it was created from")
                        .required(true)
                        .index(1),
                ),
        )
        .subcommand(
            Command::new("run")
                .about("Run an action or a command in an existing worktree")
                .after_help(
                    "Examples:\n  \
                     arbor run pr_123 claude -- fix issue #456\n  \
                     arbor run pr_123 -- ls",
                )
                .arg(
                    Arg::new("worktree")
                        .help("Worktree name")
                        .required(true),
                )
                .arg(
                    Arg::new("action")
                        .help("Configured action to run"),
                )
                .arg(cli_args_arg()),
        )
        .subcommand(
            Command::new("list")
                .about("List worktrees under the worktree root")
                .visible_alias("ls")
                .arg(
                    Arg::new("repo")
                        .help("Only show worktrees of this repository")
                        .index(1),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Output in JSON format")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("action")
                .about("Inspect configured actions")
                .arg(
                    Arg::new("list")
                        .long("list")
                        .short('l')
                        .help("List configured action names")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("silent")
                        .long("silent")
                        .short('s')
                        .help("Print names only, one per line")
                        .action(ArgAction::SetTrue)
                        .requires("list"),
                ),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .help("Target shell")
                        .required(true)
                        .value_parser(clap::value_parser!(Shell))
                        .index(1),
                ),
        )
}

/// Everything after a literal `--`.
fn cli_args_arg() -> Arg {
    Arg::new("cli-args")
        .help("Arguments after -- (available to actions as CLI_ARGS)")
        .num_args(0..)
        .last(true)
        .allow_hyphen_values(true)
}
