//! # Configuration System
//!
//! Hierarchical TOML configuration for arbor.
//!
//! ## Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.arbor/config.toml` (global user preferences)
//! 3. **Project config** - `./.arbor/config.toml` (project-specific overrides)
//! 4. **Environment** - `ARBOR_WORKTREE_DIR`
//! 5. **CLI arguments** - Command-line flags (highest priority)
//!
//! ## Loading Configuration
//!
//! ```rust,no_run
//! use arbor_core::config::ArborConfig;
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ArborConfig::load_hierarchy()?;
//!     let root = config.worktree_root();
//!     println!("worktrees live in {}", root.display());
//!     Ok(())
//! }
//! ```

pub mod defaults;
pub mod loading;
pub mod types;
pub mod validation;

pub use types::{ActionConfig, ArborConfig};
pub use validation::validate_config;

impl ArborConfig {
    /// Load configuration from the hierarchy of config files.
    ///
    /// See [`loading::load_hierarchy`] for details.
    pub fn load_hierarchy() -> Result<Self, crate::errors::ConfigError> {
        loading::load_hierarchy()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), crate::errors::ConfigError> {
        validation::validate_config(self)
    }
}
