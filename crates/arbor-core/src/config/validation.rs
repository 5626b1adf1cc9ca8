use std::collections::HashSet;

use crate::config::types::ArborConfig;
use crate::errors::ConfigError;

/// Validate a merged configuration.
///
/// Action names must be non-empty and unique, and every action needs at
/// least one command.
pub fn validate_config(config: &ArborConfig) -> Result<(), ConfigError> {
    if let Some(dir) = &config.worktree_dir
        && dir.trim().is_empty()
    {
        return Err(ConfigError::InvalidConfiguration {
            message: "worktree_dir cannot be empty".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for action in &config.actions {
        if action.name.trim().is_empty() {
            return Err(ConfigError::InvalidConfiguration {
                message: "action name cannot be empty".to_string(),
            });
        }
        if !seen.insert(action.name.as_str()) {
            return Err(ConfigError::InvalidConfiguration {
                message: format!("duplicate action '{}'", action.name),
            });
        }
        if action.cmds.is_empty() {
            return Err(ConfigError::InvalidConfiguration {
                message: format!("action '{}' has no cmds", action.name),
            });
        }
    }

    Ok(())
}
