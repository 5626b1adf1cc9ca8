//! Configuration type definitions for arbor.
//!
//! These types are deserialized from TOML config files.
//!
//! # Example Configuration
//!
//! ```toml
//! worktree_dir = "~/code/worktrees"
//!
//! [[actions]]
//! name = "claude"
//! cmds = ["claude {{ CLI_ARGS }}"]
//!
//! [[actions]]
//! name = "tmux"
//! dir = "{{ WorktreePath }}"
//! cmds = [
//!     "tmux new-session -d -s {{ WorktreeName }}",
//!     "tmux attach -t {{ WorktreeName }}",
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration loaded from TOML config files.
///
/// Loaded from:
/// 1. User config: `~/.arbor/config.toml`
/// 2. Project config: `./.arbor/config.toml`
///
/// Project config values override user config values.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ArborConfig {
    /// Root directory under which `<repo>/<worktree>` directories are created.
    /// Supports a leading `~/`. Default: `~/github/worktree`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree_dir: Option<String>,

    /// Named post-creation actions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionConfig>,
}

/// A named sequence of templated shell commands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionConfig {
    pub name: String,

    /// Working directory template. Defaults to the worktree path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    #[serde(default)]
    pub cmds: Vec<String>,
}

impl ArborConfig {
    /// Absolute worktree root with `~/` expanded.
    pub fn worktree_root(&self) -> PathBuf {
        let raw = self
            .worktree_dir
            .as_deref()
            .unwrap_or(super::defaults::DEFAULT_WORKTREE_DIR);
        super::defaults::expand_home(raw)
    }

    pub fn find_action(&self, name: &str) -> Option<&ActionConfig> {
        self.actions.iter().find(|action| action.name == name)
    }

    pub fn action_names(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.name.as_str()).collect()
    }
}
