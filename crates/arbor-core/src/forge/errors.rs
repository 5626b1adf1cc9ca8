use crate::errors::ArborError;

#[derive(Debug, thiserror::Error)]
pub enum ForgeError {
    #[error("GitHub CLI (gh) not found. Install it from https://cli.github.com")]
    GhNotInstalled,

    #[error("`{command}` failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("Failed to parse {what} from gh output: {message}")]
    ParseFailed { what: String, message: String },
}

impl ArborError for ForgeError {
    fn error_code(&self) -> &'static str {
        match self {
            ForgeError::GhNotInstalled => "GH_NOT_INSTALLED",
            ForgeError::CommandFailed { .. } => "GH_COMMAND_FAILED",
            ForgeError::ParseFailed { .. } => "GH_PARSE_FAILED",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(self, ForgeError::GhNotInstalled)
    }
}
