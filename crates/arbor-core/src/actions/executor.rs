use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{debug, error, info};

use crate::actions::errors::{ActionError, RunError};
use crate::actions::template::{TemplateContext, render};
use crate::config::ArborConfig;

/// Where a command's standard input comes from.
#[derive(Debug, Clone, Default)]
pub enum InputSource {
    #[default]
    Inherit,
    Null,
    Bytes(Vec<u8>),
}

/// Where a command's output goes.
#[derive(Debug, Clone, Default)]
pub enum OutputSink {
    #[default]
    Inherit,
    Null,
    Capture(CaptureBuffer),
}

/// Shared buffer collecting captured output across commands.
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer(Arc<Mutex<Vec<u8>>>);

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn append(&self, bytes: &[u8]) {
        if let Ok(mut buffer) = self.0.lock() {
            buffer.extend_from_slice(bytes);
        }
    }

    /// Everything captured so far, lossily decoded.
    pub fn contents(&self) -> String {
        self.0
            .lock()
            .map(|buffer| String::from_utf8_lossy(&buffer).into_owned())
            .unwrap_or_default()
    }
}

/// Standard streams for spawned commands. Everything is inherited by default.
#[derive(Debug, Clone, Default)]
pub struct StdioConfig {
    pub stdin: InputSource,
    pub stdout: OutputSink,
    pub stderr: OutputSink,
}

impl InputSource {
    fn stdio(&self) -> Stdio {
        match self {
            InputSource::Inherit => Stdio::inherit(),
            InputSource::Null => Stdio::null(),
            InputSource::Bytes(_) => Stdio::piped(),
        }
    }
}

impl OutputSink {
    fn stdio(&self) -> Stdio {
        match self {
            OutputSink::Inherit => Stdio::inherit(),
            OutputSink::Null => Stdio::null(),
            OutputSink::Capture(_) => Stdio::piped(),
        }
    }

    fn collect(&self, bytes: &[u8]) {
        if let OutputSink::Capture(buffer) = self {
            buffer.append(bytes);
        }
    }
}

/// A single shell command ready to run.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: String,
    pub dir: PathBuf,
    /// Added on top of the inherited environment.
    pub env: BTreeMap<String, String>,
    pub stdio: StdioConfig,
}

/// Runs shell commands on behalf of actions.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), RunError>;
}

/// Runs commands through `sh -e -c` with the invocation's stdio.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl ShellRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), RunError> {
        debug!(
            event = "core.actions.shell_spawn_started",
            command = invocation.command,
            dir = %invocation.dir.display()
        );

        let stdio = &invocation.stdio;
        let mut child = Command::new("sh")
            .arg("-e")
            .arg("-c")
            .arg(&invocation.command)
            .current_dir(&invocation.dir)
            .envs(&invocation.env)
            .stdin(stdio.stdin.stdio())
            .stdout(stdio.stdout.stdio())
            .stderr(stdio.stderr.stdio())
            .spawn()?;

        // Fed from a thread so a chatty child cannot block on a full output pipe
        let feeder = match (&stdio.stdin, child.stdin.take()) {
            (InputSource::Bytes(bytes), Some(mut pipe)) => {
                let bytes = bytes.clone();
                Some(thread::spawn(move || pipe.write_all(&bytes)))
            }
            _ => None,
        };

        let output = child.wait_with_output()?;
        if let Some(feeder) = feeder
            && let Ok(Err(e)) = feeder.join()
        {
            debug!(event = "core.actions.stdin_write_failed", error = %e);
        }

        stdio.stdout.collect(&output.stdout);
        stdio.stderr.collect(&output.stderr);

        if output.status.success() {
            return Ok(());
        }

        match output.status.code() {
            Some(code) => Err(RunError::Exit(code)),
            None => Err(RunError::Signal),
        }
    }
}

/// Progress of an action run, for the caller to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionEvent {
    Started { action: String, dir: PathBuf },
    Command { action: String, command: String },
    Finished { action: String },
}

#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    pub action_name: String,
    pub context: TemplateContext,
    pub env: BTreeMap<String, String>,
    pub stdio: StdioConfig,
}

impl ExecuteOptions {
    pub fn new(action_name: &str, context: TemplateContext) -> Self {
        Self {
            action_name: action_name.to_string(),
            context,
            env: BTreeMap::new(),
            stdio: StdioConfig::default(),
        }
    }

    pub fn with_stdio(mut self, stdio: StdioConfig) -> Self {
        self.stdio = stdio;
        self
    }
}

/// Run the named action's commands in order, stopping at the first failure.
///
/// The `dir` template is rendered once before any command runs; a relative
/// result is taken relative to the worktree. `on_event` sees each step as it
/// happens.
pub fn execute_action(
    config: &ArborConfig,
    runner: &dyn CommandRunner,
    options: &ExecuteOptions,
    on_event: &mut dyn FnMut(&ActionEvent),
) -> Result<(), ActionError> {
    let name = options.action_name.as_str();
    let action = config
        .find_action(name)
        .ok_or_else(|| ActionError::NotFound {
            name: name.to_string(),
        })?;

    let worktree_path = Path::new(&options.context.worktree_path);
    let dir = match &action.dir {
        Some(template) => {
            let rendered = render(template, &format!("{name}.dir"), &options.context)?;
            worktree_path.join(rendered.trim())
        }
        None => worktree_path.to_path_buf(),
    };

    info!(
        event = "core.actions.execute_started",
        action = name,
        dir = %dir.display(),
        commands = action.cmds.len()
    );
    on_event(&ActionEvent::Started {
        action: name.to_string(),
        dir: dir.clone(),
    });

    for (index, template) in action.cmds.iter().enumerate() {
        let command = render(template, &format!("{name}.cmds[{index}]"), &options.context)?;
        on_event(&ActionEvent::Command {
            action: name.to_string(),
            command: command.clone(),
        });

        let invocation = Invocation {
            command: command.clone(),
            dir: dir.clone(),
            env: options.env.clone(),
            stdio: options.stdio.clone(),
        };

        if let Err(e) = runner.run(&invocation) {
            error!(
                event = "core.actions.command_failed",
                action = name,
                command = command,
                error = %e
            );
            return Err(ActionError::CommandFailed {
                action: name.to_string(),
                command,
                message: e.to_string(),
            });
        }
    }

    info!(event = "core.actions.execute_completed", action = name);
    on_event(&ActionEvent::Finished {
        action: name.to_string(),
    });
    Ok(())
}

/// Run a single literal command in `dir`.
pub fn run_raw_command(
    runner: &dyn CommandRunner,
    command: &str,
    dir: &Path,
    env: &BTreeMap<String, String>,
    stdio: &StdioConfig,
) -> Result<(), ActionError> {
    info!(
        event = "core.actions.raw_command_started",
        command = command,
        dir = %dir.display()
    );

    let invocation = Invocation {
        command: command.to_string(),
        dir: dir.to_path_buf(),
        env: env.clone(),
        stdio: stdio.clone(),
    };

    runner.run(&invocation).map_err(|e| {
        error!(
            event = "core.actions.raw_command_failed",
            command = command,
            error = %e
        );
        ActionError::RawCommandFailed {
            command: command.to_string(),
            message: e.to_string(),
        }
    })?;

    info!(event = "core.actions.raw_command_completed", command = command);
    Ok(())
}
