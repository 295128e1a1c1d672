//! Supabase-backed implementation of the shared `chat_store` contract.
//!
//! This adapter owns a small tokio runtime and drives the async
//! `supabase_api` transport from the blocking `ChatStore` calls the chat
//! session makes on its worker threads. It also exposes the GoTrue auth calls
//! the CLI needs, so one connection serves both.

mod rows;

use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use chat_store::{
    CancelSignal, ChatStore, MessageQuery, MessageRow, NewMessage, Profile, Room, SortOrder, StoreError,
};
use serde_json::json;
use supabase_api::{
    AuthSession, Direction, Filter, Select, SignUpResponse, SupabaseClient, SupabaseConfig,
    SupabaseError,
};
use tokio::runtime::Runtime;

use crate::rows::{
    MessageRecord, ProfileRecord, RoomRecord, MESSAGE_COLUMNS, MESSAGE_COLUMNS_WITH_PROFILE,
    PROFILE_COLUMNS, ROOM_COLUMNS,
};

pub const ROOMS_TABLE: &str = "rooms";
pub const MESSAGES_TABLE: &str = "messages";
pub const PROFILES_TABLE: &str = "profiles";

/// How often an in-flight request checks the cancel signal.
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Blocking Supabase connection.
pub struct SupabaseStore {
    client: RwLock<SupabaseClient>,
    runtime: Runtime,
    cancel: Option<CancelSignal>,
}

impl SupabaseStore {
    /// Creates a store using real Supabase transport.
    pub fn connect(config: SupabaseConfig) -> Result<Self, SupabaseError> {
        let client = SupabaseClient::new(config)?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("relay-supabase")
            .enable_all()
            .build()
            .map_err(|error| {
                SupabaseError::Runtime(format!("failed to initialize tokio runtime: {error}"))
            })?;
        Ok(Self {
            client: RwLock::new(client),
            runtime,
            cancel: None,
        })
    }

    /// Abandons in-flight requests with [`SupabaseError::Cancelled`] once
    /// `cancel` is set.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Snapshot of the client; requests already in flight keep the token they
    /// started with.
    pub fn client(&self) -> SupabaseClient {
        self.client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Switches subsequent requests to the given user token (or back to the
    /// API key when `None`).
    pub fn set_access_token(&self, access_token: Option<String>) {
        self.client
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set_access_token(access_token);
    }

    pub fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResponse, SupabaseError> {
        self.block_on(self.client().sign_up(email, password))
    }

    pub fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, SupabaseError> {
        self.block_on(self.client().sign_in_with_password(email, password))
    }

    pub fn refresh(&self, refresh_token: &str) -> Result<AuthSession, SupabaseError> {
        self.block_on(self.client().refresh_session(refresh_token))
    }

    pub fn sign_out(&self) -> Result<(), SupabaseError> {
        self.block_on(self.client().sign_out())
    }

    fn block_on<T, F>(&self, future: F) -> Result<T, SupabaseError>
    where
        F: Future<Output = Result<T, SupabaseError>>,
    {
        let output = self
            .runtime
            .block_on(await_or_cancel(future, self.cancel.as_ref()))?;
        output
    }
}

impl ChatStore for SupabaseStore {
    fn find_room(&self, name: &str) -> Result<Option<Room>, StoreError> {
        let select = Select::from(ROOMS_TABLE)
            .columns(ROOM_COLUMNS)
            .eq("name", name)
            .limit(1);
        let rows: Vec<RoomRecord> = self
            .block_on(self.client().select(&select))
            .map_err(map_store_error)?;
        Ok(rows.into_iter().next().map(Room::from))
    }

    fn list_rooms(&self) -> Result<Vec<Room>, StoreError> {
        let select = Select::from(ROOMS_TABLE)
            .columns(ROOM_COLUMNS)
            .order("created_at", Direction::Ascending);
        let rows: Vec<RoomRecord> = self
            .block_on(self.client().select(&select))
            .map_err(map_store_error)?;
        Ok(rows.into_iter().map(Room::from).collect())
    }

    fn create_room(&self, name: &str, created_by: &str) -> Result<(), StoreError> {
        let body = json!({ "name": name, "created_by": created_by });
        self.block_on(self.client().insert::<serde_json::Value, _>(ROOMS_TABLE, &body))
            .map_err(map_store_error)?;
        Ok(())
    }

    fn fetch_messages(&self, query: &MessageQuery) -> Result<Vec<MessageRow>, StoreError> {
        let rows: Vec<MessageRecord> = self
            .block_on(self.client().select(&message_select(query)))
            .map_err(map_store_error)?;
        Ok(rows.into_iter().map(MessageRow::from).collect())
    }

    fn insert_message(&self, message: &NewMessage) -> Result<(), StoreError> {
        let body = json!({
            "room_id": message.room_id,
            "user_id": message.user_id,
            "content": message.content,
        });
        self.block_on(self.client().insert::<serde_json::Value, _>(MESSAGES_TABLE, &body))
            .map_err(map_store_error)?;
        Ok(())
    }

    fn fetch_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        let select = Select::from(PROFILES_TABLE)
            .columns(PROFILE_COLUMNS)
            .eq("id", user_id)
            .limit(1);
        let rows: Vec<ProfileRecord> = self
            .block_on(self.client().select(&select))
            .map_err(map_store_error)?;
        Ok(rows.into_iter().next().map(Profile::from))
    }

    fn fetch_profiles(&self, user_ids: &[String]) -> Result<Vec<Profile>, StoreError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let select = Select::from(PROFILES_TABLE)
            .columns(PROFILE_COLUMNS)
            .in_list("id", user_ids);
        let rows: Vec<ProfileRecord> = self
            .block_on(self.client().select(&select))
            .map_err(map_store_error)?;
        Ok(rows.into_iter().map(Profile::from).collect())
    }

    fn create_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        let body = json!({ "id": profile.id, "username": profile.username });
        self.block_on(self.client().insert::<serde_json::Value, _>(PROFILES_TABLE, &body))
            .map_err(map_store_error)?;
        Ok(())
    }

    fn update_username(&self, user_id: &str, username: &str) -> Result<(), StoreError> {
        let body = json!({ "username": username });
        self.block_on(
            self.client()
                .update(PROFILES_TABLE, &[Filter::eq("id", user_id)], &body),
        )
        .map_err(map_store_error)
    }
}

/// PostgREST read for one [`MessageQuery`].
pub fn message_select(query: &MessageQuery) -> Select {
    let columns = if query.include_profiles {
        MESSAGE_COLUMNS_WITH_PROFILE
    } else {
        MESSAGE_COLUMNS
    };
    let direction = match query.order {
        SortOrder::Ascending => Direction::Ascending,
        SortOrder::Descending => Direction::Descending,
    };

    let mut select = Select::from(MESSAGES_TABLE)
        .columns(columns)
        .eq("room_id", &query.room_id);
    if let Some(after) = &query.after {
        select = select.gt("created_at", after);
    }
    select = select.order("created_at", direction);
    if let Some(limit) = query.limit {
        select = select.limit(limit);
    }
    select
}

async fn await_or_cancel<F>(
    future: F,
    cancel: Option<&CancelSignal>,
) -> Result<F::Output, SupabaseError>
where
    F: Future,
{
    let Some(cancel) = cancel else {
        return Ok(future.await);
    };

    let mut future = Box::pin(future);
    loop {
        if cancel.load(Ordering::Acquire) {
            return Err(SupabaseError::Cancelled);
        }
        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            return Ok(output);
        }
    }
}

/// Folds transport errors into the store taxonomy.
pub fn map_store_error(error: SupabaseError) -> StoreError {
    if error.is_missing_relationship() {
        return StoreError::SchemaMismatch(error_message(&error));
    }
    if error.is_unique_violation() {
        return StoreError::Conflict(error_message(&error));
    }
    StoreError::Transport(error.to_string())
}

fn error_message(error: &SupabaseError) -> String {
    error
        .api_error()
        .map(|api| api.message.clone())
        .unwrap_or_else(|| error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;
    use supabase_api::{ApiError, StatusCode};

    fn pairs(select: &Select) -> Vec<(String, String)> {
        select.query_pairs()
    }

    fn status_error(code: Option<&str>, message: &str) -> SupabaseError {
        SupabaseError::Status(
            StatusCode::BAD_REQUEST,
            ApiError {
                code: code.map(str::to_owned),
                message: message.to_owned(),
                details: None,
                hint: None,
            },
        )
    }

    #[test]
    fn since_query_filters_after_watermark_ascending() {
        let select = message_select(
            &MessageQuery::since("room-1", Some("2024-01-15T09:30:00Z")).with_profiles(true),
        );

        assert_eq!(select.table(), MESSAGES_TABLE);
        assert_eq!(
            pairs(&select),
            vec![
                ("select".to_owned(), MESSAGE_COLUMNS_WITH_PROFILE.to_owned()),
                ("room_id".to_owned(), "eq.room-1".to_owned()),
                ("created_at".to_owned(), "gt.2024-01-15T09:30:00Z".to_owned()),
                ("order".to_owned(), "created_at.asc".to_owned()),
            ]
        );
    }

    #[test]
    fn latest_query_is_descending_and_limited_without_profiles() {
        let select = message_select(&MessageQuery::latest("room-1", 20));

        assert_eq!(
            pairs(&select),
            vec![
                ("select".to_owned(), MESSAGE_COLUMNS.to_owned()),
                ("room_id".to_owned(), "eq.room-1".to_owned()),
                ("order".to_owned(), "created_at.desc".to_owned()),
                ("limit".to_owned(), "20".to_owned()),
            ]
        );
    }

    #[test]
    fn store_errors_are_classified() {
        assert!(matches!(
            map_store_error(status_error(Some("PGRST200"), "no relation")),
            StoreError::SchemaMismatch(message) if message == "no relation"
        ));
        assert!(matches!(
            map_store_error(status_error(Some("23505"), "duplicate key")),
            StoreError::Conflict(_)
        ));
        assert!(matches!(
            map_store_error(status_error(None, "permission denied")),
            StoreError::Transport(message) if message.contains("permission denied")
        ));
    }

    fn test_runtime() -> Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("runtime")
    }

    #[test]
    fn uncancelled_requests_complete() {
        let cancel: CancelSignal = Arc::new(AtomicBool::new(false));
        let output = test_runtime().block_on(await_or_cancel(
            async {
                tokio::time::sleep(Duration::from_millis(60)).await;
                7
            },
            Some(&cancel),
        ));
        assert_eq!(output.ok(), Some(7));
    }

    #[test]
    fn cancel_abandons_a_hung_request() {
        let cancel: CancelSignal = Arc::new(AtomicBool::new(false));
        let trigger = Arc::clone(&cancel);
        let setter = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            trigger.store(true, Ordering::Release);
        });

        let started = Instant::now();
        let runtime = test_runtime();
        let _guard = runtime.enter();
        let output = runtime.block_on(await_or_cancel(
            tokio::time::sleep(Duration::from_secs(30)),
            Some(&cancel),
        ));
        setter.join().expect("setter thread");

        assert!(matches!(output, Err(SupabaseError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
