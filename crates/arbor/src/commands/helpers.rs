use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::ArgMatches;
use tracing::warn;

use arbor_core::actions::ActionEvent;
use arbor_core::config::ArborConfig;
use arbor_core::git::GitBackend;
use arbor_core::worktree::{
    CreateProgress, Prompter, WorktreeError, WorktreeListItem, find_by_name,
};

/// Load config with warning on errors.
///
/// Falls back to defaults when the hierarchy cannot be loaded.
pub fn load_config_with_warning() -> ArborConfig {
    match ArborConfig::load_hierarchy() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Could not load config: {}. Using defaults.\n\
                 Tip: Check ~/.arbor/config.toml and ./.arbor/config.toml for syntax errors.",
                e
            );
            warn!(
                event = "cli.config.load_failed",
                error = %e,
                "Config load failed, using defaults"
            );
            ArborConfig::default()
        }
    }
}

/// Arguments after `--`, joined with single spaces.
pub fn cli_args(matches: &ArgMatches) -> String {
    matches
        .get_many::<String>("cli-args")
        .map(|values| values.map(String::as_str).collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

/// Top of the repository containing the current directory, or `fallback`.
pub fn root_dir(git: &dyn GitBackend, fallback: &Path) -> PathBuf {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| git.toplevel(&cwd).ok())
        .unwrap_or_else(|| fallback.to_path_buf())
}

/// Find a worktree by directory name, asking the user to pick when several
/// repositories have one with that name.
pub fn select_worktree(
    git: &dyn GitBackend,
    root: &Path,
    name: &str,
    repo_filter: Option<&str>,
) -> Result<Option<WorktreeListItem>, WorktreeError> {
    let mut matches: Vec<_> = find_by_name(git, root, name)?
        .into_iter()
        .filter(|item| repo_filter.is_none_or(|repo| item.repo == repo))
        .collect();

    if matches.len() <= 1 {
        return Ok(matches.pop());
    }

    let options: Vec<String> = matches
        .iter()
        .map(|item| item.path.display().to_string())
        .collect();
    let index = StdinPrompter::new()
        .select(
            &format!("Multiple worktrees match '{name}'. Select one:"),
            &options,
        )
        .map_err(|e| WorktreeError::PromptFailed {
            message: e.to_string(),
        })?;

    Ok(Some(matches.swap_remove(index)))
}

/// Turn off colour output when `--no-color` is given.
///
/// `colored` already honours `NO_COLOR`, `CLICOLOR` and non-terminal stdout.
pub fn apply_color_choice(matches: &ArgMatches) {
    if matches.get_flag("no-color") {
        colored::control::set_override(false);
    }
}

pub fn print_action_event(event: &ActionEvent) {
    eprintln!("{}", action_event_line(event));
}

fn action_event_line(event: &ActionEvent) -> String {
    match event {
        ActionEvent::Started { action, dir } => {
            format!("Running action '{}' in {}...", action, dir.display())
        }
        ActionEvent::Command { action, command } => format!("[{}]: {}", action, command),
        ActionEvent::Finished { .. } => "Action finished successfully.".to_string(),
    }
}

pub fn print_create_progress(step: &CreateProgress) {
    let line = match step {
        CreateProgress::Cloning { owner, repo } => format!("Cloning {}/{}...", owner, repo),
        CreateProgress::FetchingPullRequest { number } => format!("Fetching PR #{}...", number),
    };
    eprintln!("{}", line);
}

/// Line-based prompts on stdin; questions go to stderr.
pub struct StdinPrompter<R> {
    input: R,
}

impl StdinPrompter<io::StdinLock<'static>> {
    pub fn new() -> Self {
        Self {
            input: io::stdin().lock(),
        }
    }
}

impl Default for StdinPrompter<io::StdinLock<'static>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: BufRead> StdinPrompter<R> {
    #[cfg(test)]
    fn from_reader(input: R) -> Self {
        Self { input }
    }

    fn read_answer(&mut self) -> io::Result<String> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "no answer on stdin",
            ));
        }
        Ok(line.trim().to_string())
    }

    /// Pick one of `options`; returns its index.
    pub fn select(&mut self, message: &str, options: &[String]) -> io::Result<usize> {
        let mut stderr = io::stderr();
        writeln!(stderr, "{message}")?;
        for (index, option) in options.iter().enumerate() {
            writeln!(stderr, "  {}) {}", index + 1, option)?;
        }

        loop {
            write!(stderr, "Select [1-{}]: ", options.len())?;
            stderr.flush()?;
            let answer = self.read_answer()?;
            match answer.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(n - 1),
                _ => writeln!(stderr, "Invalid selection '{answer}'")?,
            }
        }
    }
}

impl<R: BufRead> Prompter for StdinPrompter<R> {
    fn confirm(&mut self, message: &str) -> io::Result<bool> {
        let mut stderr = io::stderr();
        write!(stderr, "{message} [y/N] ")?;
        stderr.flush()?;
        let answer = self.read_answer()?.to_lowercase();
        Ok(answer == "y" || answer == "yes")
    }
}
