use crate::errors::ArborError;

#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("Not in a git repository")]
    NotInRepository,

    #[error("Repository not found at path: {path}")]
    RepositoryNotFound { path: String },

    #[error("Invalid {label}: {message}")]
    InvalidArgument { label: String, message: String },

    #[error("`{command}` failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("Repository at {path} has no working directory")]
    BareRepository { path: String },

    #[error("Git2 library error: {source}")]
    Git2Error {
        #[from]
        source: git2::Error,
    },

    #[error("IO error during git operation: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl ArborError for GitError {
    fn error_code(&self) -> &'static str {
        match self {
            GitError::NotInRepository => "NOT_IN_REPOSITORY",
            GitError::RepositoryNotFound { .. } => "REPOSITORY_NOT_FOUND",
            GitError::InvalidArgument { .. } => "INVALID_GIT_ARGUMENT",
            GitError::CommandFailed { .. } => "GIT_COMMAND_FAILED",
            GitError::BareRepository { .. } => "BARE_REPOSITORY",
            GitError::Git2Error { .. } => "GIT2_ERROR",
            GitError::IoError { .. } => "GIT_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            GitError::NotInRepository | GitError::InvalidArgument { .. }
        )
    }
}
