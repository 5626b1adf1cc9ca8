use std::collections::BTreeMap;
use std::path::Path;

use clap::ArgMatches;
use tracing::{error, info, warn};

use arbor_core::actions::{
    ExecuteOptions, ShellRunner, StdioConfig, TemplateContext, execute_action, run_raw_command,
};
use arbor_core::config::ArborConfig;
use arbor_core::events;
use arbor_core::forge;
use arbor_core::git::{GitBackend, GitCli, repository_root};
use arbor_core::worktree::{
    CreateOutcome, Creator, ResolveOptions, Target, WorktreeError, WorktreeRequest, classify,
    parse_target, resolve,
};

use colored::Colorize;

use super::helpers::{
    StdinPrompter, cli_args, load_config_with_warning, print_action_event, print_create_progress,
    root_dir,
};

pub(crate) fn handle_add_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_with_warning();
    let git = GitCli::new();

    let Some(request) = build_request(&git, matches)? else {
        let mut cmd = crate::app::build_cli();
        if let Some(add) = cmd.find_subcommand_mut("add") {
            add.print_help()?;
        }
        return Ok(());
    };

    let options = ResolveOptions {
        force: matches.get_flag("force"),
        use_existing: matches.get_flag("use-existing"),
    };

    info!(
        event = "cli.add_started",
        kind = %request.kind,
        branch = %request.branch_name,
        worktree = %request.worktree_name,
        force = options.force,
        use_existing = options.use_existing
    );

    let creator = Creator::new(&git, &config).with_progress(&print_create_progress);
    let location = creator.location(&request);
    let signature = classify(
        &git,
        &location.repo_path,
        &location.worktree_path,
        &request.branch_name,
    );

    let mut prompter = StdinPrompter::new();
    let outcome = resolve(&git, &signature, &request, &location, options, &mut prompter)
        .and_then(|resolution| {
            if options.force {
                for warning in &resolution.warnings {
                    eprintln!("{}", format!("⚠️  {warning}").yellow());
                }
            }
            creator.create(&request, &resolution)
        });

    match outcome {
        Ok(CreateOutcome::Cancelled) => {
            println!("{}", "Cancelled - no changes made".yellow());
            info!(event = "cli.add_cancelled", branch = %request.branch_name);
            Ok(())
        }
        Ok(CreateOutcome::Created { path, attached }) => {
            print_success(&path, attached);
            info!(
                event = "cli.add_completed",
                path = %path.display(),
                attached = attached
            );
            run_post_creation(&config, &git, matches, &request, &path);
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Failed to create worktree: {}", e);
            if let WorktreeError::CreationFailed { rollback, .. } = &e
                && rollback.has_failures()
            {
                eprintln!("   Some partially created state may need manual cleanup.");
            }

            error!(
                event = "cli.add_failed",
                branch = %request.branch_name,
                error = %e
            );

            events::log_app_error(&e);
            Err(e.into())
        }
    }
}

/// Turn flags and the positional argument into a request.
///
/// `Ok(None)` means nothing was given to add.
fn build_request(
    git: &dyn GitBackend,
    matches: &ArgMatches,
) -> Result<Option<WorktreeRequest>, Box<dyn std::error::Error>> {
    let name = matches.get_one::<String>("name");

    let request = if let Some(value) = matches.get_one::<String>("pr") {
        pull_request(value, None)?
    } else if let Some(value) = matches.get_one::<String>("issue") {
        issue(value, None)?
    } else if let Some(target) = matches.get_one::<String>("target") {
        match parse_target(target) {
            Target::PullRequest { owner, repo, .. } => {
                pull_request(target, Some((owner, repo)))?
            }
            Target::Issue { owner, repo, .. } => issue(target, Some((owner, repo)))?,
            Target::Number(number) => pull_request(&number.to_string(), None)?,
            // -n renames both the worktree and the branch of a local request
            Target::Local(local) => {
                local_request(git, name.map_or(local.as_str(), String::as_str))?
            }
        }
    } else {
        return Ok(None);
    };

    Ok(Some(match name {
        Some(name) => request.with_worktree_name(name),
        None => request,
    }))
}

fn pull_request(
    value: &str,
    repository: Option<(String, String)>,
) -> Result<WorktreeRequest, Box<dyn std::error::Error>> {
    eprintln!("Fetching Pull Request info...");
    let pr = forge::fetch_pull_request(value)?;
    let (owner, repo) = match repository.or_else(|| pr.repository()) {
        Some(pair) => pair,
        None => {
            let current = forge::current_repository()?;
            (current.owner, current.name)
        }
    };

    println!(
        "{}",
        format!("Creating worktree for PR #{}: {}", pr.number, pr.title).green()
    );
    Ok(WorktreeRequest::pull_request(
        &owner,
        &repo,
        pr.number,
        &pr.head_ref_name,
    ))
}

fn issue(
    value: &str,
    repository: Option<(String, String)>,
) -> Result<WorktreeRequest, Box<dyn std::error::Error>> {
    eprintln!("Fetching Issue info...");
    let issue = forge::fetch_issue(value)?;
    let (owner, repo) = match repository.or_else(|| issue.repository()) {
        Some(pair) => pair,
        None => {
            let current = forge::current_repository()?;
            (current.owner, current.name)
        }
    };

    println!(
        "{}",
        format!("Creating worktree for Issue #{}: {}", issue.number, issue.title).green()
    );
    Ok(WorktreeRequest::issue(&owner, &repo, issue.number))
}

/// Local branch request rooted at the repository of the current directory.
fn local_request(
    git: &dyn GitBackend,
    name: &str,
) -> Result<WorktreeRequest, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let toplevel = git
        .toplevel(&cwd)
        .map_err(|_| "not in a git repository")?;
    let repo_name = toplevel
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or("could not determine repository name")?;
    let repo_dir = repository_root(&git.common_dir(&cwd)?);

    Ok(WorktreeRequest::local(&repo_name, name, repo_dir))
}

fn print_success(path: &Path, attached: bool) {
    if attached {
        println!("\n{}", "✅ Worktree attached to existing branch!".green());
    } else {
        println!("\n{}", "✅ Worktree created successfully!".green());
    }
    println!("   Location: {}", path.display());
    println!("\nTo switch to the worktree:");
    println!("{}", format!("  cd {}", path.display()).cyan());
}

/// Run the requested action or raw command; failures only warn.
fn run_post_creation(
    config: &ArborConfig,
    git: &dyn GitBackend,
    matches: &ArgMatches,
    request: &WorktreeRequest,
    path: &Path,
) {
    let trailing = cli_args(matches);
    let runner = ShellRunner::new();

    if let Some(action) = matches.get_one::<String>("action") {
        let context =
            TemplateContext::from_request(request, path, action, &trailing, &root_dir(git, path));
        let options = ExecuteOptions::new(action, context);
        if let Err(e) = execute_action(config, &runner, &options, &mut print_action_event) {
            eprintln!("\n{}", format!("⚠️  {}", e).yellow());
            warn!(event = "cli.add_action_failed", action = action, error = %e);
        }
    } else if !trailing.is_empty() {
        println!();
        eprintln!("Running in worktree: {}", trailing);
        let stdio = StdioConfig::default();
        if let Err(e) = run_raw_command(&runner, &trailing, path, &BTreeMap::new(), &stdio) {
            eprintln!("\n{}", format!("⚠️  {}", e).yellow());
            warn!(event = "cli.add_command_failed", command = %trailing, error = %e);
        }
    }
}
