use crate::errors::ArborError;

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Action '{name}' not found in config")]
    NotFound { name: String },

    #[error("Failed to render template '{name}': {message}")]
    Template { name: String, message: String },

    #[error("Action '{action}' failed: command `{command}` {message}")]
    CommandFailed {
        action: String,
        command: String,
        message: String,
    },

    #[error("Command `{command}` {message}")]
    RawCommandFailed { command: String, message: String },
}

impl ArborError for ActionError {
    fn error_code(&self) -> &'static str {
        match self {
            ActionError::NotFound { .. } => "ACTION_NOT_FOUND",
            ActionError::Template { .. } => "ACTION_TEMPLATE_ERROR",
            ActionError::CommandFailed { .. } => "ACTION_COMMAND_FAILED",
            ActionError::RawCommandFailed { .. } => "COMMAND_FAILED",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            ActionError::NotFound { .. } | ActionError::Template { .. }
        )
    }
}

/// Why a single shell command did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("could not be started: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("exited with status {0}")]
    Exit(i32),

    #[error("was terminated by a signal")]
    Signal,
}
