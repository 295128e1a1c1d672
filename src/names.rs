//! User id to display-name resolution.
//!
//! Resolution never fails: lookups that error or find no username fall back to
//! a placeholder derived from the id, and that placeholder is cached so a
//! failing store is not asked again for the rest of the session.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use chat_store::{ChatStore, MessageRow};
use tracing::debug;

/// Display name for messages without an author id.
pub const UNKNOWN_USER: &str = "Unknown User";
/// Characters of the id kept in a placeholder name.
pub const PLACEHOLDER_ID_CHARS: usize = 8;

/// `User-` followed by the first eight characters of the id.
#[must_use]
pub fn placeholder_name(user_id: &str) -> String {
    let prefix: String = user_id.chars().take(PLACEHOLDER_ID_CHARS).collect();
    format!("User-{prefix}")
}

/// Memoizing resolver shared by the backfill and the poller.
pub struct NameResolver {
    store: Arc<dyn ChatStore>,
    cache: RwLock<HashMap<String, String>>,
}

impl NameResolver {
    #[must_use]
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn cached(&self, user_id: &str) -> Option<String> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .cloned()
    }

    pub fn resolve(&self, user_id: &str) -> String {
        if user_id.is_empty() {
            return UNKNOWN_USER.to_string();
        }
        if let Some(name) = self.cached(user_id) {
            return name;
        }

        let name = match self.store.fetch_profile(user_id) {
            Ok(profile) => profile
                .and_then(|profile| profile.username)
                .filter(|username| !username.is_empty())
                .unwrap_or_else(|| placeholder_name(user_id)),
            Err(error) => {
                debug!(user_id, %error, "profile lookup failed; using placeholder name");
                placeholder_name(user_id)
            }
        };
        self.remember(user_id, name)
    }

    /// Fills the cache for every author in `rows` with at most one batched
    /// profile query. A failed batch leaves the cache untouched.
    pub fn preload(&self, rows: &[MessageRow]) {
        let mut missing = Vec::new();
        let mut seen = HashSet::new();
        for row in rows {
            let Some(user_id) = row.user_id.as_deref().filter(|id| !id.is_empty()) else {
                continue;
            };
            if let Some(username) = row.profile_username.as_deref().filter(|name| !name.is_empty())
            {
                self.remember(user_id, username.to_string());
                continue;
            }
            if self.cached(user_id).is_none() && seen.insert(user_id) {
                missing.push(user_id.to_string());
            }
        }
        if missing.is_empty() {
            return;
        }

        let profiles = match self.store.fetch_profiles(&missing) {
            Ok(profiles) => profiles,
            Err(error) => {
                debug!(count = missing.len(), %error, "profile preload failed");
                return;
            }
        };

        let mut found: HashMap<String, String> = profiles
            .into_iter()
            .map(|profile| {
                let name = profile
                    .username
                    .filter(|username| !username.is_empty())
                    .unwrap_or_else(|| placeholder_name(&profile.id));
                (profile.id, name)
            })
            .collect();
        for user_id in missing {
            let name = found
                .remove(&user_id)
                .unwrap_or_else(|| placeholder_name(&user_id));
            self.remember(&user_id, name);
        }
    }

    /// Display name for one fetched row, preferring the embedded profile.
    pub fn display_name_for(&self, row: &MessageRow) -> String {
        let user_id = row.user_id.as_deref().unwrap_or_default();
        match row.profile_username.as_deref().filter(|name| !name.is_empty()) {
            Some(username) => {
                if !user_id.is_empty() {
                    self.remember(user_id, username.to_string());
                }
                username.to_string()
            }
            None => self.resolve(user_id),
        }
    }

    // First write wins so concurrent resolvers agree on one name.
    fn remember(&self, user_id: &str, name: String) -> String {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(user_id.to_string())
            .or_insert(name)
            .clone()
    }
}
