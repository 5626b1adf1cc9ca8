use std::error::Error;

/// Base trait for all application errors
pub trait ArborError: Error + Send + Sync + 'static {
    /// Error code for programmatic handling
    fn error_code(&self) -> &'static str;

    /// Whether this error should be logged as an error or warning
    fn is_user_error(&self) -> bool {
        false
    }
}

/// Common result type for the application
pub type ArborResult<T> = Result<T, Box<dyn ArborError>>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {message}")]
    ConfigReadError { path: String, message: String },

    #[error("Failed to parse config file '{path}': {message}")]
    ConfigParseError { path: String, message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Could not determine home directory")]
    HomeDirNotFound,

    #[error("IO error reading config: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl ArborError for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::ConfigReadError { .. } => "CONFIG_READ_ERROR",
            ConfigError::ConfigParseError { .. } => "CONFIG_PARSE_ERROR",
            ConfigError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
            ConfigError::HomeDirNotFound => "HOME_DIR_NOT_FOUND",
            ConfigError::IoError { .. } => "CONFIG_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            ConfigError::ConfigParseError { .. } | ConfigError::InvalidConfiguration { .. }
        )
    }
}

impl ConfigError {
    /// Whether this error only means a config file was absent.
    pub fn is_not_found(&self) -> bool {
        match self {
            ConfigError::IoError { source } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
