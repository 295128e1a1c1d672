#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};

use chat_store::ChatStore;
use chat_store_mock::MemoryStore;
use relay::backend::{AuthService, Backend};
use relay::commands::Context;
use relay::prompt::ScriptedPrompter;
use relay_chat::{ChatOutput, RecordingOutput};
use session_store::{SessionStore, StoredSession};
use supabase_api::{ApiError, AuthSession, AuthUser, SignUpResponse, StatusCode, SupabaseError};
use tempfile::TempDir;

pub const USER_ID: &str = "c0ffee00-0000-4000-8000-000000000001";
pub const EMAIL: &str = "alice@example.com";
pub const PASSWORD: &str = "correct horse";

#[derive(Default)]
pub struct AuthTrace {
    pub registered: Vec<String>,
    pub sign_ins: Vec<String>,
    pub refreshes: Vec<String>,
    pub sign_outs: usize,
    pub tokens: Vec<Option<String>>,
    pub fail_sign_out: bool,
    pub fail_refresh: bool,
}

/// Auth service with one account and scripted failures.
#[derive(Default)]
pub struct FakeAuth {
    trace: Mutex<AuthTrace>,
}

impl FakeAuth {
    pub fn trace(&self) -> MutexGuard<'_, AuthTrace> {
        match self.trace.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn with_account(self) -> Self {
        self.trace().registered.push(EMAIL.to_string());
        self
    }
}

fn grant(access_token: &str) -> AuthSession {
    AuthSession {
        access_token: access_token.to_string(),
        refresh_token: format!("{access_token}-refresh"),
        token_type: Some("bearer".to_string()),
        expires_in: Some(3600),
        expires_at: None,
        user: AuthUser {
            id: USER_ID.to_string(),
            email: Some(EMAIL.to_string()),
        },
    }
}

fn status(status: StatusCode, code: &str, message: &str) -> SupabaseError {
    let mut error = ApiError::from_message(message);
    error.code = Some(code.to_string());
    SupabaseError::Status(status, error)
}

impl AuthService for FakeAuth {
    fn sign_up(&self, email: &str, _password: &str) -> Result<SignUpResponse, SupabaseError> {
        let mut trace = self.trace();
        if trace.registered.iter().any(|known| known == email) {
            return Err(status(
                StatusCode::UNPROCESSABLE_ENTITY,
                "user_already_exists",
                "User already registered",
            ));
        }
        trace.registered.push(email.to_string());
        Ok(SignUpResponse {
            user: Some(AuthUser {
                id: USER_ID.to_string(),
                email: Some(email.to_string()),
            }),
            session: None,
        })
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, SupabaseError> {
        let mut trace = self.trace();
        trace.sign_ins.push(email.to_string());
        if password != PASSWORD || !trace.registered.iter().any(|known| known == email) {
            return Err(status(
                StatusCode::BAD_REQUEST,
                "invalid_credentials",
                "Invalid login credentials",
            ));
        }
        Ok(grant("fresh-token"))
    }

    fn refresh(&self, refresh_token: &str) -> Result<AuthSession, SupabaseError> {
        let mut trace = self.trace();
        trace.refreshes.push(refresh_token.to_string());
        if trace.fail_refresh {
            return Err(status(
                StatusCode::BAD_REQUEST,
                "refresh_token_not_found",
                "Invalid Refresh Token",
            ));
        }
        Ok(grant("refreshed-token"))
    }

    fn sign_out(&self) -> Result<(), SupabaseError> {
        let mut trace = self.trace();
        trace.sign_outs += 1;
        if trace.fail_sign_out {
            return Err(SupabaseError::Auth("network unreachable".to_string()));
        }
        Ok(())
    }

    fn use_access_token(&self, access_token: Option<String>) {
        self.trace().tokens.push(access_token);
    }
}

pub struct Harness {
    pub home: TempDir,
    pub store: Arc<MemoryStore>,
    pub auth: Arc<FakeAuth>,
    pub output: Arc<RecordingOutput>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_auth(FakeAuth::default().with_account())
    }

    pub fn with_auth(auth: FakeAuth) -> Self {
        Self {
            home: tempfile::tempdir().expect("tempdir"),
            store: Arc::new(MemoryStore::new()),
            auth: Arc::new(auth),
            output: Arc::new(RecordingOutput::new()),
        }
    }

    pub fn sessions(&self) -> SessionStore {
        SessionStore::new(self.home.path())
    }

    pub fn log_in(&self) {
        self.sessions()
            .save(&StoredSession::new("saved-token", "saved-refresh", USER_ID))
            .expect("save session");
    }

    pub fn backend(&self) -> Backend {
        Backend::new(
            Arc::clone(&self.store) as Arc<dyn ChatStore>,
            Arc::clone(&self.auth) as Arc<dyn AuthService>,
        )
    }

    /// Context wired to the in-memory store, restoring the saved session on
    /// connect like the real backend does.
    pub fn context<'a>(&'a self, prompter: &'a mut ScriptedPrompter) -> Context<'a> {
        let output: Arc<dyn ChatOutput> = Arc::clone(&self.output) as Arc<dyn ChatOutput>;
        Context::new(self.sessions(), output, prompter, move |sessions| {
            let backend = self.backend();
            backend.restore_session(sessions)?;
            Ok(backend)
        })
    }

    pub fn lines(&self) -> Vec<String> {
        self.output.non_empty_lines()
    }
}
