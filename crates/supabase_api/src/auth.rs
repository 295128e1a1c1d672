use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SupabaseError;

/// Body for password sign-up and sign-in.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EmailCredentials {
    pub email: String,
    pub password: String,
}

/// Body for the refresh-token grant.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RefreshGrant {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Token grant returned by GoTrue.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Unix seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

/// Sign-up result. GoTrue returns a full session when email confirmation is
/// disabled and only the user otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpResponse {
    pub user: Option<AuthUser>,
    pub session: Option<AuthSession>,
}

impl SignUpResponse {
    pub fn from_value(value: Value) -> Result<Self, SupabaseError> {
        if value.get("access_token").is_some() {
            let session: AuthSession = serde_json::from_value(value)?;
            return Ok(Self {
                user: Some(session.user.clone()),
                session: Some(session),
            });
        }

        if let Some(user) = value.get("user").filter(|user| !user.is_null()) {
            let user: AuthUser = serde_json::from_value(user.clone())?;
            return Ok(Self {
                user: Some(user),
                session: None,
            });
        }

        if value.get("id").is_some() {
            let user: AuthUser = serde_json::from_value(value)?;
            return Ok(Self {
                user: Some(user),
                session: None,
            });
        }

        Ok(Self {
            user: None,
            session: None,
        })
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|user| user.id.as_str())
    }
}
