//! Default values and path expansion for configuration.

use std::path::PathBuf;

/// Default worktree root when none is configured.
pub const DEFAULT_WORKTREE_DIR: &str = "~/github/worktree";

/// Environment variable overriding `worktree_dir`.
pub const WORKTREE_DIR_ENV: &str = "ARBOR_WORKTREE_DIR";

/// Directory name holding arbor config files (`~/.arbor`, `./.arbor`).
pub const CONFIG_DIR_NAME: &str = ".arbor";

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Expand a leading `~` or `~/` to the home directory.
///
/// Falls back to the system temp directory when no home directory can be
/// determined, so callers always get a usable path.
pub fn expand_home(raw: &str) -> PathBuf {
    let rest = if raw == "~" {
        Some("")
    } else {
        raw.strip_prefix("~/")
    };

    match rest {
        Some(rest) => {
            let home = match dirs::home_dir() {
                Some(home) => home,
                None => {
                    eprintln!(
                        "Warning: Could not find home directory. Set HOME environment variable. \
                        Using fallback directory."
                    );
                    std::env::temp_dir()
                }
            };
            if rest.is_empty() {
                home
            } else {
                home.join(rest)
            }
        }
        None => PathBuf::from(raw),
    }
}
