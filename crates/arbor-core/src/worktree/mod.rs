//! Worktree lifecycle: classify conflicts, resolve them, create with
//! rollback, remove, and enumerate.

pub mod classify;
pub mod create;
pub mod errors;
pub mod list;
pub mod parse;
pub mod remove;
pub mod resolve;
pub mod types;

pub use classify::{classify, describe_plan};
pub use create::{CreateProgress, CreationTransaction, Creator};
pub use errors::WorktreeError;
pub use list::{find_by_name, list_worktrees};
pub use parse::{Target, parse_target, sanitize_branch_name};
pub use remove::remove;
pub use resolve::{Prompter, resolve};
pub use types::{
    BARE_DIR, CleanupStep, ConflictSignature, CreateOutcome, Decision, RemoveOutcome, Resolution,
    ResolveOptions, RollbackReport, WorktreeKind, WorktreeListItem, WorktreeLocation,
    WorktreeRequest,
};
