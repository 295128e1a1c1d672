//! Message queries for one room.
//!
//! Every fetch first asks for the embedded `profiles(username)` relation. When
//! the store reports a schema mismatch the same window is fetched again
//! without it, and the feed stops asking for the relation from then on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chat_store::{ChatStore, MessageQuery, MessageRow, StoreError};
use tracing::debug;

pub struct MessageFeed {
    store: Arc<dyn ChatStore>,
    room_id: String,
    embed_profiles: AtomicBool,
}

impl MessageFeed {
    #[must_use]
    pub fn new(store: Arc<dyn ChatStore>, room_id: impl Into<String>) -> Self {
        Self {
            store,
            room_id: room_id.into(),
            embed_profiles: AtomicBool::new(true),
        }
    }

    #[must_use]
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    #[must_use]
    pub fn embeds_profiles(&self) -> bool {
        self.embed_profiles.load(Ordering::Acquire)
    }

    /// The `limit` most recent messages, oldest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<MessageRow>, StoreError> {
        let mut rows = self.fetch(MessageQuery::latest(&self.room_id, limit))?;
        rows.reverse();
        Ok(rows)
    }

    /// Messages strictly newer than `watermark`, oldest first.
    pub fn since(&self, watermark: Option<&str>) -> Result<Vec<MessageRow>, StoreError> {
        self.fetch(MessageQuery::since(&self.room_id, watermark))
    }

    fn fetch(&self, query: MessageQuery) -> Result<Vec<MessageRow>, StoreError> {
        if !self.embeds_profiles() {
            return self.store.fetch_messages(&query.with_profiles(false));
        }

        match self.store.fetch_messages(&query.clone().with_profiles(true)) {
            Err(StoreError::SchemaMismatch(message)) => {
                debug!(room_id = %self.room_id, %message, "profile relation unavailable; using plain message query");
                self.embed_profiles.store(false, Ordering::Release);
                self.store.fetch_messages(&query.with_profiles(false))
            }
            result => result,
        }
    }
}
