pub mod cli;
pub mod errors;
#[cfg(test)]
pub mod fake;
pub mod operations;
pub mod traits;
pub mod types;

// Re-export commonly used types and functions
pub use cli::{GitCli, validate_git_arg};
pub use errors::GitError;
pub use operations::{normalize_path, paths_equal, repository_root};
pub use traits::GitBackend;
pub use types::WorktreeEntry;
