//! Deterministic in-memory implementation of the `chat_store` contract.
//!
//! This crate contains no transport logic and is intended for local
//! development and session-level integration testing. Every call is recorded
//! so tests can assert on round-trip counts, and failures can be injected per
//! operation.

use std::sync::{Mutex, MutexGuard};

use chat_store::{
    ChatStore, MessageQuery, MessageRow, NewMessage, Profile, Room, SortOrder, StoreError,
};

#[derive(Debug, Clone)]
struct StoredMessage {
    room_id: String,
    user_id: String,
    content: String,
    created_at: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    rooms: Vec<Room>,
    messages: Vec<StoredMessage>,
    profiles: Vec<Profile>,
    clock_secs: u64,
    rejects_profile_relation: bool,
    failing_fetches: usize,
    profile_lookups_failing: bool,
    profile_batches_failing: bool,
    inserts_failing: bool,
    message_fetches: Vec<MessageQuery>,
    profile_lookups: Vec<String>,
    profile_batches: Vec<Vec<String>>,
    inserted: Vec<NewMessage>,
}

/// In-memory chat store used by relay tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a room and returns its id.
    pub fn add_room(&self, name: &str) -> String {
        let mut state = self.lock();
        let id = format!("room-{}", state.rooms.len() + 1);
        let created_at = state.tick();
        state.rooms.push(Room {
            id: id.clone(),
            name: name.to_string(),
            created_at: Some(created_at),
            created_by: None,
        });
        id
    }

    pub fn add_profile(&self, user_id: &str, username: Option<&str>) {
        self.lock().profiles.push(Profile {
            id: user_id.to_string(),
            username: username.map(str::to_owned),
        });
    }

    /// Appends a message stamped with the next store clock value and returns
    /// that `created_at`.
    pub fn push_message(&self, room_id: &str, user_id: &str, content: &str) -> String {
        let mut state = self.lock();
        let created_at = state.tick();
        state.messages.push(StoredMessage {
            room_id: room_id.to_string(),
            user_id: user_id.to_string(),
            content: content.to_string(),
            created_at: created_at.clone(),
        });
        created_at
    }

    pub fn push_message_at(&self, room_id: &str, user_id: &str, content: &str, created_at: &str) {
        self.lock().messages.push(StoredMessage {
            room_id: room_id.to_string(),
            user_id: user_id.to_string(),
            content: content.to_string(),
            created_at: created_at.to_string(),
        });
    }

    /// Makes enriched fetches fail with [`StoreError::SchemaMismatch`].
    pub fn reject_profile_relation(&self, rejects: bool) {
        self.lock().rejects_profile_relation = rejects;
    }

    /// Fails the next `count` message fetches with a transport error.
    pub fn fail_next_fetches(&self, count: usize) {
        self.lock().failing_fetches = count;
    }

    pub fn set_profile_lookups_failing(&self, failing: bool) {
        self.lock().profile_lookups_failing = failing;
    }

    pub fn set_profile_batches_failing(&self, failing: bool) {
        self.lock().profile_batches_failing = failing;
    }

    pub fn set_inserts_failing(&self, failing: bool) {
        self.lock().inserts_failing = failing;
    }

    #[must_use]
    pub fn message_fetches(&self) -> Vec<MessageQuery> {
        self.lock().message_fetches.clone()
    }

    #[must_use]
    pub fn profile_lookups(&self) -> Vec<String> {
        self.lock().profile_lookups.clone()
    }

    #[must_use]
    pub fn profile_batches(&self) -> Vec<Vec<String>> {
        self.lock().profile_batches.clone()
    }

    #[must_use]
    pub fn inserted_messages(&self) -> Vec<NewMessage> {
        self.lock().inserted.clone()
    }

    #[must_use]
    pub fn profiles(&self) -> Vec<Profile> {
        self.lock().profiles.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        lock_unpoisoned(&self.state)
    }
}

impl MemoryState {
    fn tick(&mut self) -> String {
        self.clock_secs += 1;
        clock_timestamp(self.clock_secs)
    }

    fn username_for(&self, user_id: &str) -> Option<String> {
        self.profiles
            .iter()
            .find(|profile| profile.id == user_id)
            .and_then(|profile| profile.username.clone())
    }
}

impl ChatStore for MemoryStore {
    fn find_room(&self, name: &str) -> Result<Option<Room>, StoreError> {
        Ok(self.lock().rooms.iter().find(|room| room.name == name).cloned())
    }

    fn list_rooms(&self) -> Result<Vec<Room>, StoreError> {
        Ok(self.lock().rooms.clone())
    }

    fn create_room(&self, name: &str, created_by: &str) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.rooms.iter().any(|room| room.name == name) {
            return Err(StoreError::Conflict(format!(
                "duplicate key value violates unique constraint \"rooms_name_key\" ({name})"
            )));
        }
        let id = format!("room-{}", state.rooms.len() + 1);
        let created_at = state.tick();
        state.rooms.push(Room {
            id,
            name: name.to_string(),
            created_at: Some(created_at),
            created_by: Some(created_by.to_string()),
        });
        Ok(())
    }

    fn fetch_messages(&self, query: &MessageQuery) -> Result<Vec<MessageRow>, StoreError> {
        let mut state = self.lock();
        state.message_fetches.push(query.clone());

        if state.failing_fetches > 0 {
            state.failing_fetches -= 1;
            return Err(StoreError::transport("simulated fetch failure"));
        }
        if query.include_profiles && state.rejects_profile_relation {
            return Err(StoreError::SchemaMismatch(
                "Could not find a relationship between 'messages' and 'profiles'".to_string(),
            ));
        }

        let mut matching: Vec<&StoredMessage> = state
            .messages
            .iter()
            .filter(|message| message.room_id == query.room_id)
            .filter(|message| {
                query
                    .after
                    .as_deref()
                    .map_or(true, |after| message.created_at.as_str() > after)
            })
            .collect();
        matching.sort_by(|left, right| left.created_at.cmp(&right.created_at));
        if query.order == SortOrder::Descending {
            matching.reverse();
        }
        if let Some(limit) = query.limit {
            matching.truncate(limit);
        }

        Ok(matching
            .into_iter()
            .map(|message| MessageRow {
                content: message.content.clone(),
                created_at: message.created_at.clone(),
                user_id: Some(message.user_id.clone()),
                profile_username: if query.include_profiles {
                    state.username_for(&message.user_id)
                } else {
                    None
                },
            })
            .collect())
    }

    fn insert_message(&self, message: &NewMessage) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.inserts_failing {
            return Err(StoreError::transport("simulated insert failure"));
        }
        state.inserted.push(message.clone());
        let created_at = state.tick();
        state.messages.push(StoredMessage {
            room_id: message.room_id.clone(),
            user_id: message.user_id.clone(),
            content: message.content.clone(),
            created_at,
        });
        Ok(())
    }

    fn fetch_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        let mut state = self.lock();
        state.profile_lookups.push(user_id.to_string());
        if state.profile_lookups_failing {
            return Err(StoreError::transport("simulated profile lookup failure"));
        }
        Ok(state
            .profiles
            .iter()
            .find(|profile| profile.id == user_id)
            .cloned())
    }

    fn fetch_profiles(&self, user_ids: &[String]) -> Result<Vec<Profile>, StoreError> {
        let mut state = self.lock();
        state.profile_batches.push(user_ids.to_vec());
        if state.profile_batches_failing {
            return Err(StoreError::transport("simulated profile batch failure"));
        }
        Ok(state
            .profiles
            .iter()
            .filter(|profile| user_ids.contains(&profile.id))
            .cloned()
            .collect())
    }

    fn create_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        let mut state = self.lock();
        let taken = state.profiles.iter().any(|existing| {
            existing.id == profile.id
                || (profile.username.is_some() && existing.username == profile.username)
        });
        if taken {
            return Err(StoreError::Conflict(
                "duplicate key value violates unique constraint \"profiles_username_key\""
                    .to_string(),
            ));
        }
        state.profiles.push(profile.clone());
        Ok(())
    }

    fn update_username(&self, user_id: &str, username: &str) -> Result<(), StoreError> {
        let mut state = self.lock();
        let taken = state.profiles.iter().any(|existing| {
            existing.id != user_id && existing.username.as_deref() == Some(username)
        });
        if taken {
            return Err(StoreError::Conflict(
                "duplicate key value violates unique constraint \"profiles_username_key\""
                    .to_string(),
            ));
        }
        if let Some(profile) = state.profiles.iter_mut().find(|profile| profile.id == user_id) {
            profile.username = Some(username.to_string());
        }
        Ok(())
    }
}

/// Store clock rendered the way the remote store stamps rows.
fn clock_timestamp(secs: u64) -> String {
    format!(
        "2024-01-15T{:02}:{:02}:{:02}Z",
        9 + secs / 3600,
        (secs / 60) % 60,
        secs % 60
    )
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
