//! arbor-core: Core library for git worktree lifecycle management
//!
//! Creates worktrees from GitHub pull requests, issues and local branches,
//! resolves conflicts with existing state, rolls back partial creations,
//! and runs templated post-creation actions.
//!
//! # Main Entry Points
//!
//! - [`worktree`] - Classify, resolve, create, remove and list worktrees
//! - [`actions`] - Render and execute configured actions
//! - [`config`] - Configuration management
//! - [`git`] - Git capability interface and its CLI-backed implementation
//! - [`forge`] - GitHub metadata via `gh`

pub mod actions;
pub mod config;
pub mod errors;
pub mod events;
pub mod forge;
pub mod git;
pub mod logging;
pub mod worktree;

// Re-export commonly used types at crate root for convenience
pub use actions::{
    ActionError, ActionEvent, CommandRunner, ExecuteOptions, ShellRunner, StdioConfig,
    TemplateContext,
};
pub use config::{ActionConfig, ArborConfig};
pub use errors::{ArborError, ArborResult, ConfigError};
pub use forge::ForgeError;
pub use git::{GitBackend, GitCli, GitError};
pub use worktree::{
    CreateOutcome, Creator, Decision, RemoveOutcome, WorktreeError, WorktreeKind,
    WorktreeListItem, WorktreeRequest,
};

// Re-export logging initialization
pub use logging::init_logging;
