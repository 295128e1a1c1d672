//! Wire rows for the `rooms`, `messages` and `profiles` tables.

use chat_store::{MessageRow, Profile, Room};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub(crate) const ROOM_COLUMNS: &str = "id,name,created_at,created_by";
pub(crate) const MESSAGE_COLUMNS: &str = "content,created_at,user_id";
pub(crate) const MESSAGE_COLUMNS_WITH_PROFILE: &str = "content,created_at,user_id,profiles(username)";
pub(crate) const PROFILE_COLUMNS: &str = "id,username";

#[derive(Debug, Deserialize)]
pub(crate) struct RoomRecord {
    #[serde(deserialize_with = "id_string")]
    id: String,
    name: String,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default, deserialize_with = "optional_id_string")]
    created_by: Option<String>,
}

impl From<RoomRecord> for Room {
    fn from(record: RoomRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            created_at: record.created_at,
            created_by: record.created_by,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageRecord {
    content: String,
    created_at: String,
    #[serde(default, deserialize_with = "optional_id_string")]
    user_id: Option<String>,
    /// Embedded relation; an object for a to-one join, an array otherwise.
    #[serde(default)]
    profiles: Option<Value>,
}

impl From<MessageRecord> for MessageRow {
    fn from(record: MessageRecord) -> Self {
        let profile_username = record.profiles.as_ref().and_then(embedded_username);
        Self {
            content: record.content,
            created_at: record.created_at,
            user_id: record.user_id,
            profile_username,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileRecord {
    #[serde(deserialize_with = "id_string")]
    id: String,
    #[serde(default)]
    username: Option<String>,
}

impl From<ProfileRecord> for Profile {
    fn from(record: ProfileRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
        }
    }
}

fn embedded_username(value: &Value) -> Option<String> {
    let profile = match value {
        Value::Array(items) => items.first()?,
        other => other,
    };
    profile
        .get("username")
        .and_then(Value::as_str)
        .filter(|username| !username.is_empty())
        .map(str::to_owned)
}

// Ids are uuids in the reference schema, but bigint keys are common too.
fn value_to_id(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_id(value).ok_or_else(|| serde::de::Error::custom("expected a string or numeric id"))
}

fn optional_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(value_to_id))
}
