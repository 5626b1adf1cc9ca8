//! Post-creation actions: templated shell commands from config.

pub mod errors;
pub mod executor;
pub mod template;

pub use errors::{ActionError, RunError};
pub use executor::{
    ActionEvent, CaptureBuffer, CommandRunner, ExecuteOptions, InputSource, Invocation,
    OutputSink, ShellRunner, StdioConfig, execute_action, run_raw_command,
};
pub use template::{TemplateContext, render};
