//! Configuration loading and merging logic.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.arbor/config.toml` (global user preferences)
//! 3. **Project config** - `./.arbor/config.toml` (project-specific overrides)
//! 4. **Environment** - `ARBOR_WORKTREE_DIR`
//! 5. **CLI arguments** - Command-line flags (highest priority)

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::defaults::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, WORKTREE_DIR_ENV};
use crate::config::types::ArborConfig;
use crate::config::validation::validate_config;
use crate::errors::ConfigError;

/// Load configuration from the hierarchy of config files.
///
/// Missing config files are not errors; unreadable or malformed ones are.
pub fn load_hierarchy() -> Result<ArborConfig, ConfigError> {
    let user_path = user_config_path();
    let project_path = std::env::current_dir()?
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME);

    let config = load_from_paths(user_path.as_deref(), Some(&project_path))?;
    let config = apply_env_overrides(config, std::env::var(WORKTREE_DIR_ENV).ok());

    validate_config(&config)?;

    Ok(config)
}

/// Load and merge the given config files, skipping those that do not exist.
pub fn load_from_paths(
    user_path: Option<&Path>,
    project_path: Option<&Path>,
) -> Result<ArborConfig, ConfigError> {
    let mut config = ArborConfig::default();

    for path in [user_path, project_path].into_iter().flatten() {
        match load_config_file(path) {
            Ok(file_config) => {
                if let Err(ConfigError::InvalidConfiguration { message }) =
                    validate_config(&file_config)
                {
                    return Err(ConfigError::InvalidConfiguration {
                        message: format!("{}: {message}", path.display()),
                    });
                }
                debug!(
                    event = "core.config.file_loaded",
                    path = %path.display(),
                    actions = file_config.actions.len()
                );
                config = merge_configs(config, file_config);
            }
            Err(e) if e.is_not_found() => {
                debug!(event = "core.config.file_missing", path = %path.display());
            }
            Err(e) => return Err(e),
        }
    }

    Ok(config)
}

/// Path of the user config file, if a home directory exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load a configuration file from the given path.
pub fn load_config_file(path: &Path) -> Result<ArborConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::IoError { source: e }
        } else {
            ConfigError::ConfigReadError {
                path: path.display().to_string(),
                message: e.to_string(),
            }
        }
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::ConfigParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Merge two configurations, with override_config taking precedence.
///
/// Actions are merged by name: an override action replaces the base action
/// of the same name in place, new names are appended.
pub fn merge_configs(base: ArborConfig, override_config: ArborConfig) -> ArborConfig {
    let mut actions = base.actions;
    for action in override_config.actions {
        match actions.iter_mut().find(|a| a.name == action.name) {
            Some(existing) => *existing = action,
            None => actions.push(action),
        }
    }

    ArborConfig {
        worktree_dir: override_config.worktree_dir.or(base.worktree_dir),
        actions,
    }
}

/// Apply `ARBOR_WORKTREE_DIR` when set to a non-empty value.
pub fn apply_env_overrides(mut config: ArborConfig, worktree_dir: Option<String>) -> ArborConfig {
    if let Some(dir) = worktree_dir.filter(|d| !d.trim().is_empty()) {
        debug!(event = "core.config.env_override", key = WORKTREE_DIR_ENV, value = %dir);
        config.worktree_dir = Some(dir);
    }
    config
}
