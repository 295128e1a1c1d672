//! Minimal backend-agnostic contract for the relay chat data store.
//!
//! This crate defines only the row types, query shape and error taxonomy shared
//! by the chat session and its store backends. It excludes transport details,
//! authentication and session orchestration concerns.

use std::fmt;
use std::sync::{atomic::AtomicBool, Arc};

/// Shared cancellation flag for long-running loops.
pub type CancelSignal = Arc<AtomicBool>;

/// Error returned by store operations.
///
/// `SchemaMismatch` is kept apart from `Transport` so callers can retry a
/// simpler query when the remote schema lacks an optional relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store rejected the shape of the query (for example an embedded
    /// relation the schema does not define).
    SchemaMismatch(String),
    /// A unique constraint rejected the write.
    Conflict(String),
    /// Any other failure reaching or executing against the store.
    Transport(String),
}

impl StoreError {
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::SchemaMismatch(message) | Self::Conflict(message) | Self::Transport(message) => {
                message
            }
        }
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchemaMismatch(message) => write!(f, "schema mismatch: {message}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::Transport(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for StoreError {}

/// One chat room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub created_at: Option<String>,
    pub created_by: Option<String>,
}

/// One stored message as returned by a fetch.
///
/// `profile_username` is populated only when the query asked for the embedded
/// profile relation and the backend supports it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageRow {
    pub content: String,
    pub created_at: String,
    pub user_id: Option<String>,
    pub profile_username: Option<String>,
}

/// Payload for inserting a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub room_id: String,
    pub user_id: String,
    pub content: String,
}

/// One user profile row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Message fetch for a single room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageQuery {
    pub room_id: String,
    /// Exclusive lower bound on `created_at`.
    pub after: Option<String>,
    pub order: SortOrder,
    pub limit: Option<usize>,
    pub include_profiles: bool,
}

impl MessageQuery {
    /// Messages strictly newer than `after`, oldest first.
    #[must_use]
    pub fn since(room_id: impl Into<String>, after: Option<&str>) -> Self {
        Self {
            room_id: room_id.into(),
            after: after.map(str::to_owned),
            order: SortOrder::Ascending,
            limit: None,
            include_profiles: false,
        }
    }

    /// The `limit` newest messages, newest first.
    #[must_use]
    pub fn latest(room_id: impl Into<String>, limit: usize) -> Self {
        Self {
            room_id: room_id.into(),
            after: None,
            order: SortOrder::Descending,
            limit: Some(limit),
            include_profiles: false,
        }
    }

    #[must_use]
    pub fn with_profiles(mut self, include_profiles: bool) -> Self {
        self.include_profiles = include_profiles;
        self
    }
}

/// Blocking store contract consumed by the chat session and the CLI.
///
/// Implementations must be safe to call from several threads at once.
pub trait ChatStore: Send + Sync {
    fn find_room(&self, name: &str) -> Result<Option<Room>, StoreError>;

    fn list_rooms(&self) -> Result<Vec<Room>, StoreError>;

    fn create_room(&self, name: &str, created_by: &str) -> Result<(), StoreError>;

    fn fetch_messages(&self, query: &MessageQuery) -> Result<Vec<MessageRow>, StoreError>;

    fn insert_message(&self, message: &NewMessage) -> Result<(), StoreError>;

    fn fetch_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError>;

    /// Batched profile lookup. Ids without a profile row are simply absent.
    fn fetch_profiles(&self, user_ids: &[String]) -> Result<Vec<Profile>, StoreError>;

    fn create_profile(&self, profile: &Profile) -> Result<(), StoreError>;

    fn update_username(&self, user_id: &str, username: &str) -> Result<(), StoreError>;
}

impl<T: ChatStore + ?Sized> ChatStore for Arc<T> {
    fn find_room(&self, name: &str) -> Result<Option<Room>, StoreError> {
        (**self).find_room(name)
    }

    fn list_rooms(&self) -> Result<Vec<Room>, StoreError> {
        (**self).list_rooms()
    }

    fn create_room(&self, name: &str, created_by: &str) -> Result<(), StoreError> {
        (**self).create_room(name, created_by)
    }

    fn fetch_messages(&self, query: &MessageQuery) -> Result<Vec<MessageRow>, StoreError> {
        (**self).fetch_messages(query)
    }

    fn insert_message(&self, message: &NewMessage) -> Result<(), StoreError> {
        (**self).insert_message(message)
    }

    fn fetch_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        (**self).fetch_profile(user_id)
    }

    fn fetch_profiles(&self, user_ids: &[String]) -> Result<Vec<Profile>, StoreError> {
        (**self).fetch_profiles(user_ids)
    }

    fn create_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        (**self).create_profile(profile)
    }

    fn update_username(&self, user_id: &str, username: &str) -> Result<(), StoreError> {
        (**self).update_username(user_id, username)
    }
}
