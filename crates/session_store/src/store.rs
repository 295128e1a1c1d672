use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::SessionStoreError;
use crate::paths::{default_session_root, session_file_path, temp_file_path};
use crate::schema::StoredSession;

/// Local session file for the relay CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store under `root` (the file is `root/session.json`).
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            path: session_file_path(root),
        }
    }

    /// Store at `$RELAY_HOME/session.json` or `~/.relay/session.json`.
    pub fn open_default() -> Result<Self, SessionStoreError> {
        default_session_root()
            .map(|root| Self::new(&root))
            .ok_or(SessionStoreError::NoHomeDirectory)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the session. A missing file is an empty session.
    pub fn load(&self) -> Result<StoredSession, SessionStoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(source) if source.kind() == ErrorKind::NotFound => {
                return Ok(StoredSession::default())
            }
            Err(source) => {
                return Err(SessionStoreError::io(
                    "reading session file",
                    &self.path,
                    source,
                ))
            }
        };
        if raw.trim().is_empty() {
            return Ok(StoredSession::default());
        }

        let session: StoredSession = serde_json::from_str(&raw)
            .map_err(|source| SessionStoreError::json_parse(&self.path, source))?;
        validate_rfc3339(&self.path, "expires_at", session.expires_at.as_deref())?;
        Ok(session)
    }

    /// Replaces the session file atomically.
    pub fn save(&self, session: &StoredSession) -> Result<(), SessionStoreError> {
        validate_rfc3339(&self.path, "expires_at", session.expires_at.as_deref())?;
        let mut encoded = serde_json::to_string_pretty(session)
            .map_err(|source| SessionStoreError::json_serialize(&self.path, source))?;
        encoded.push('\n');

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| {
                SessionStoreError::io("creating session directory", parent, source)
            })?;
        }

        let temp_path = temp_file_path(&self.path);
        let result = write_private_file(&temp_path, encoded.as_bytes()).and_then(|()| {
            fs::rename(&temp_path, &self.path)
                .map_err(|source| SessionStoreError::io("replacing session file", &self.path, source))
        });
        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result
    }

    /// Empties the stored tokens and user id.
    pub fn clear(&self) -> Result<(), SessionStoreError> {
        self.save(&StoredSession::default())
    }

    pub fn is_logged_in(&self) -> Result<bool, SessionStoreError> {
        Ok(self.load()?.is_logged_in())
    }
}

fn write_private_file(path: &Path, contents: &[u8]) -> Result<(), SessionStoreError> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .map_err(|source| SessionStoreError::io("creating temporary session file", path, source))?;
    file.write_all(contents)
        .map_err(|source| SessionStoreError::io("writing temporary session file", path, source))?;
    file.sync_all()
        .map_err(|source| SessionStoreError::io("syncing temporary session file", path, source))
}

pub(crate) fn validate_rfc3339(
    path: &Path,
    field: &'static str,
    value: Option<&str>,
) -> Result<(), SessionStoreError> {
    let Some(value) = value else {
        return Ok(());
    };
    if OffsetDateTime::parse(value, &Rfc3339).is_err() {
        return Err(SessionStoreError::InvalidTimestamp {
            path: path.to_path_buf(),
            field,
            value: value.to_string(),
        });
    }

    Ok(())
}
