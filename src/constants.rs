// src/constants.rs

/// Directory name used under the user's config and state directories.
pub const APP_DIR_NAME: &str = "muxpick";

/// The main configuration file (in ~/.config/muxpick/).
pub const CONFIG_FILENAME: &str = "muxpick.yaml";

/// Optional overrides merged on top of the main configuration.
pub const USER_CONFIG_FILENAME: &str = "muxpick.user.yaml";

/// Cache files are named `recon-<module>.json`.
pub const CACHE_FILE_PREFIX: &str = "recon-";

/// Maximum cache age, in seconds, when `--cache-age` is not given.
pub const DEFAULT_CACHE_AGE_SECS: u64 = 300;

/// Layout used when nothing more specific applies.
pub const DEFAULT_LAYOUT_NAME: &str = "default";

/// Tag that hides a target unless it is explicitly shown.
pub const HIDDEN_TAG: &str = "hidden";

/// Files or directories that mark a project root when a project module sets no `checks`.
pub const DEFAULT_PROJECT_CHECKS: &[&str] =
    &[".git", ".gitignore", ".hg", ".hgignore", ".svn", ".vscode", ".idea"];

/// Upper bound for a single compositor IPC round trip.
pub const IPC_TIMEOUT_MS: u64 = 100;
