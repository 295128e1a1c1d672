use std::path::{Path, PathBuf};

pub const SESSION_DIR: &str = ".relay";
pub const SESSION_FILE_NAME: &str = "session.json";
/// Overrides the session directory.
pub const RELAY_HOME_ENV: &str = "RELAY_HOME";

#[must_use]
pub fn session_root(home: &Path) -> PathBuf {
    home.join(SESSION_DIR)
}

#[must_use]
pub fn session_file_path(root: &Path) -> PathBuf {
    root.join(SESSION_FILE_NAME)
}

/// `$RELAY_HOME` when set and non-empty, otherwise `~/.relay`.
#[must_use]
pub fn default_session_root() -> Option<PathBuf> {
    if let Some(explicit) = non_empty_env(RELAY_HOME_ENV) {
        return Some(PathBuf::from(explicit));
    }
    home_dir().map(|home| session_root(&home))
}

#[must_use]
pub(crate) fn temp_file_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

fn home_dir() -> Option<PathBuf> {
    non_empty_env("HOME")
        .or_else(|| non_empty_env("USERPROFILE"))
        .map(PathBuf::from)
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
