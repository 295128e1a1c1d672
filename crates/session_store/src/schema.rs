use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

use crate::error::SessionStoreError;

/// Tokens are treated as expired this long before their recorded expiry.
pub const EXPIRY_SKEW: Duration = Duration::seconds(30);

/// Persisted auth session.
///
/// Empty strings mean "absent" so a cleared file still parses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub user_id: String,
    /// RFC3339 expiry of `access_token`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

impl StoredSession {
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            user_id: user_id.into(),
            expires_at: None,
        }
    }

    /// Records the expiry reported by the auth service as unix seconds.
    pub fn with_expires_at_unix(mut self, unix_seconds: i64) -> Result<Self, SessionStoreError> {
        let expires_at = OffsetDateTime::from_unix_timestamp(unix_seconds)
            .map_err(|_| SessionStoreError::ExpiryOutOfRange(unix_seconds))?;
        self.expires_at = Some(
            expires_at
                .format(&Rfc3339)
                .map_err(SessionStoreError::ClockFormat)?,
        );
        Ok(self)
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        !self.access_token.trim().is_empty()
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        Some(self.user_id.trim()).filter(|user_id| !user_id.is_empty())
    }

    #[must_use]
    pub fn can_refresh(&self) -> bool {
        !self.refresh_token.trim().is_empty()
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        self.expires_at
            .as_deref()
            .and_then(|value| OffsetDateTime::parse(value, &Rfc3339).ok())
    }

    /// True when a recorded expiry falls within [`EXPIRY_SKEW`] of `now`.
    /// Sessions without an expiry never report expired.
    #[must_use]
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at()
            .is_some_and(|expires_at| expires_at - EXPIRY_SKEW <= now)
    }
}
