//! Subcommand implementations.
//!
//! Commands print their own user-facing outcome. A failure that has already
//! been shown is returned as [`Reported`] so `main` only sets the exit code.

pub mod auth;
pub mod join;
pub mod profile;
pub mod rooms;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use relay_chat::{ChatOutput, Style, DEFAULT_POLL_INTERVAL};
use session_store::{SessionStore, StoredSession};

use crate::backend::Backend;
use crate::prompt::Prompter;

/// A failure whose message was already written to the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reported;

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("command failed")
    }
}

impl std::error::Error for Reported {}

type Connector<'a> = Box<dyn Fn(&SessionStore) -> Result<Backend> + 'a>;

/// Everything a command touches besides its arguments.
pub struct Context<'a> {
    pub sessions: SessionStore,
    pub output: Arc<dyn ChatOutput>,
    pub prompter: &'a mut dyn Prompter,
    pub poll_interval: Duration,
    connector: Connector<'a>,
}

impl<'a> Context<'a> {
    pub fn new(
        sessions: SessionStore,
        output: Arc<dyn ChatOutput>,
        prompter: &'a mut dyn Prompter,
        connector: impl Fn(&SessionStore) -> Result<Backend> + 'a,
    ) -> Self {
        Self {
            sessions,
            output,
            prompter,
            poll_interval: DEFAULT_POLL_INTERVAL,
            connector: Box::new(connector),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn style(&self) -> Style {
        self.output.style()
    }

    pub fn say(&self, line: &str) {
        self.output.write_line(line);
    }

    pub fn success(&self, line: &str) {
        self.say(&self.style().green(line));
    }

    pub fn notice(&self, line: &str) {
        self.say(&self.style().yellow(line));
    }

    /// Prints `message` in red and returns the matching [`Reported`] error.
    pub fn fail(&self, message: &str) -> anyhow::Error {
        self.say(&self.style().red(message));
        Reported.into()
    }

    /// Connects, printing the failure.
    pub fn connect(&self) -> Result<Backend> {
        self.try_connect()
            .map_err(|error| self.fail(&format!("{error:#}")))
    }

    /// Connects without printing anything.
    pub fn try_connect(&self) -> Result<Backend> {
        (self.connector)(&self.sessions)
    }

    pub fn load_session(&self) -> Result<StoredSession> {
        self.sessions
            .load()
            .map_err(|error| self.fail(&format!("Failed to read session: {error}")))
    }

    pub fn save_session(&self, session: &StoredSession) -> Result<()> {
        self.sessions
            .save(session)
            .map_err(|error| self.fail(&format!("Failed to save session: {error}")))
    }

    /// The saved session, or a printed login hint when there is none.
    pub fn require_login(&self, action: &str) -> Result<StoredSession> {
        let session = self.load_session()?;
        if session.is_logged_in() {
            return Ok(session);
        }
        let style = self.style();
        self.notice(&format!("You must be logged in to {action}."));
        self.say(&format!(
            "Run {} or {} first.",
            style.bold("relay login"),
            style.bold("relay register")
        ));
        Err(Reported.into())
    }

    pub fn require_user_id(&self, session: &StoredSession) -> Result<String> {
        session
            .user_id()
            .map(str::to_owned)
            .ok_or_else(|| self.fail("Session error. Please log in again."))
    }

    pub fn ask(&mut self, label: &str) -> Result<String> {
        self.prompter
            .line(label)
            .map_err(|error| self.fail(&format!("Failed to read {label}: {error}")))
    }

    pub fn ask_secret(&mut self, label: &str) -> Result<String> {
        self.prompter
            .secret(label)
            .map_err(|error| self.fail(&format!("Failed to read {label}: {error}")))
    }
}
