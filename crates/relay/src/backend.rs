//! Remote backend wiring: the Supabase connection and its auth calls.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use chat_store::{CancelSignal, ChatStore};
use chat_store_supabase::SupabaseStore;
use session_store::{SessionStore, StoredSession};
use supabase_api::{AuthSession, SignUpResponse, SupabaseError};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::config::RelayConfig;

/// Account operations the CLI needs from the auth service.
pub trait AuthService: Send + Sync {
    fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResponse, SupabaseError>;

    fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, SupabaseError>;

    fn refresh(&self, refresh_token: &str) -> Result<AuthSession, SupabaseError>;

    fn sign_out(&self) -> Result<(), SupabaseError>;

    /// Bearer token for later data requests; `None` falls back to the API key.
    fn use_access_token(&self, access_token: Option<String>);
}

impl AuthService for SupabaseStore {
    fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResponse, SupabaseError> {
        SupabaseStore::sign_up(self, email, password)
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, SupabaseError> {
        SupabaseStore::sign_in(self, email, password)
    }

    fn refresh(&self, refresh_token: &str) -> Result<AuthSession, SupabaseError> {
        SupabaseStore::refresh(self, refresh_token)
    }

    fn sign_out(&self) -> Result<(), SupabaseError> {
        SupabaseStore::sign_out(self)
    }

    fn use_access_token(&self, access_token: Option<String>) {
        self.set_access_token(access_token);
    }
}

/// Both faces of one remote connection.
#[derive(Clone)]
pub struct Backend {
    pub store: Arc<dyn ChatStore>,
    pub auth: Arc<dyn AuthService>,
}

impl Backend {
    pub fn new(store: Arc<dyn ChatStore>, auth: Arc<dyn AuthService>) -> Self {
        Self { store, auth }
    }

    /// Connects to Supabase and authenticates as the saved user, refreshing
    /// an expired session first. Requests still in flight when `cancel` is
    /// set are abandoned.
    pub fn connect(
        config: &RelayConfig,
        sessions: &SessionStore,
        cancel: &CancelSignal,
    ) -> Result<Self> {
        let supabase = SupabaseStore::connect(config.supabase_config()?)
            .context("failed to initialize Supabase client")?
            .with_cancel(Arc::clone(cancel));
        let supabase = Arc::new(supabase);
        let backend = Self::new(
            Arc::clone(&supabase) as Arc<dyn ChatStore>,
            supabase as Arc<dyn AuthService>,
        );
        backend.restore_session(sessions)?;
        Ok(backend)
    }

    /// Applies the saved session to the auth service.
    pub fn restore_session(&self, sessions: &SessionStore) -> Result<()> {
        let session = sessions.load().context("failed to read saved session")?;
        if !session.is_logged_in() {
            return Ok(());
        }

        if session.is_expired(OffsetDateTime::now_utc()) && session.can_refresh() {
            match self.auth.refresh(&session.refresh_token) {
                Ok(grant) => {
                    let refreshed = stored_session(&grant);
                    sessions
                        .save(&refreshed)
                        .context("failed to save refreshed session")?;
                    info!(user_id = %refreshed.user_id, "refreshed expired session");
                    self.auth.use_access_token(Some(refreshed.access_token));
                }
                Err(error) => {
                    warn!(%error, "session refresh failed; continuing with the API key");
                }
            }
            return Ok(());
        }

        debug!("using saved access token");
        self.auth.use_access_token(Some(session.access_token));
        Ok(())
    }
}

/// Local record of an auth grant.
pub fn stored_session(grant: &AuthSession) -> StoredSession {
    let session = StoredSession::new(
        grant.access_token.clone(),
        grant.refresh_token.clone(),
        grant.user.id.clone(),
    );
    let Some(expires_at) = grant.expires_at.or_else(|| {
        grant
            .expires_in
            .map(|seconds| OffsetDateTime::now_utc().unix_timestamp() + seconds)
    }) else {
        return session;
    };
    match session.clone().with_expires_at_unix(expires_at) {
        Ok(session) => session,
        Err(error) => {
            debug!(%error, "ignoring unusable token expiry");
            session
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use supabase_api::AuthUser;

    fn grant(expires_at: Option<i64>, expires_in: Option<i64>) -> AuthSession {
        AuthSession {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            token_type: Some("bearer".to_string()),
            expires_in,
            expires_at,
            user: AuthUser {
                id: "user-1".to_string(),
                email: Some("alice@example.com".to_string()),
            },
        }
    }

    #[test]
    fn grant_expiry_is_recorded() {
        let session = stored_session(&grant(Some(1_705_311_000), None));

        assert_eq!(session.access_token, "access");
        assert_eq!(session.refresh_token, "refresh");
        assert_eq!(session.user_id, "user-1");
        assert_eq!(session.expires_at.as_deref(), Some("2024-01-15T09:30:00Z"));
    }

    #[test]
    fn relative_expiry_is_anchored_to_now() {
        let session = stored_session(&grant(None, Some(3600)));

        assert!(!session.is_expired(OffsetDateTime::now_utc()));
        assert!(session.expires_at.is_some());
    }

    #[test]
    fn out_of_range_expiry_is_dropped() {
        let session = stored_session(&grant(Some(i64::MAX), None));
        assert_eq!(session.expires_at, None);
    }
}
