use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Error as JsonError;

/// PostgREST error code for an embedded relation the schema cache lacks.
pub const PGRST_NO_RELATIONSHIP: &str = "PGRST200";
/// PostgREST error code for an ambiguous embedded relation.
pub const PGRST_AMBIGUOUS_RELATIONSHIP: &str = "PGRST201";
/// Postgres `unique_violation`.
pub const PG_UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug)]
pub enum SupabaseError {
    MissingUrl,
    MissingApiKey,
    MissingAccessToken,
    InvalidBaseUrl(String),
    InvalidHeader(String),
    Request(reqwest::Error),
    Status(StatusCode, ApiError),
    Serde(JsonError),
    Auth(String),
    Runtime(String),
    /// The caller's cancel signal fired before the response arrived.
    Cancelled,
}

/// Error body returned by PostgREST or GoTrue, folded into one shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiError {
    pub code: Option<String>,
    pub message: String,
    pub details: Option<String>,
    pub hint: Option<String>,
}

// PostgREST sends `{code, message, details, hint}`. GoTrue sends either
// `{code, error_code, msg}` or the OAuth-style `{error, error_description}`.
#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    details: Option<serde_json::Value>,
    #[serde(default)]
    hint: Option<String>,
}

impl ErrorPayload {
    fn into_api_error(self) -> Option<ApiError> {
        let message = [
            self.message.as_deref(),
            self.msg.as_deref(),
            self.error_description.as_deref(),
            self.error.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find_map(non_empty_string)?
        .to_owned();

        let code = self
            .error_code
            .as_deref()
            .and_then(non_empty_string)
            .map(str::to_owned)
            .or_else(|| match self.code {
                Some(serde_json::Value::String(code)) if !code.is_empty() => Some(code),
                _ => None,
            })
            .or_else(|| {
                self.error_description
                    .as_ref()
                    .and(self.error.as_deref())
                    .and_then(non_empty_string)
                    .map(str::to_owned)
            });

        let details = match self.details {
            Some(serde_json::Value::String(details)) => Some(details),
            Some(serde_json::Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        };

        Some(ApiError {
            code,
            message,
            details,
            hint: self.hint,
        })
    }
}

impl ApiError {
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    fn code_is(&self, expected: &str) -> bool {
        self.code.as_deref() == Some(expected)
    }

    fn message_contains(&self, needle: &str) -> bool {
        self.message.to_ascii_lowercase().contains(needle)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl SupabaseError {
    /// Parsed error body, when the failure came from an HTTP status.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Status(_, error) => Some(error),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status(status, _) => Some(*status),
            _ => None,
        }
    }

    /// The query embedded a relation the remote schema does not define.
    pub fn is_missing_relationship(&self) -> bool {
        self.api_error().is_some_and(|error| {
            error.code_is(PGRST_NO_RELATIONSHIP)
                || error.code_is(PGRST_AMBIGUOUS_RELATIONSHIP)
                || error.message_contains("relationship")
        })
    }

    /// A unique constraint rejected the write.
    pub fn is_unique_violation(&self) -> bool {
        self.api_error().is_some_and(|error| {
            error.code_is(PG_UNIQUE_VIOLATION)
                || error.message_contains("duplicate")
                || error.message_contains("unique")
        })
    }

    /// GoTrue refused a sign-up because the email is taken.
    pub fn is_already_registered(&self) -> bool {
        self.api_error().is_some_and(|error| {
            error.code_is("user_already_exists")
                || error.code_is("email_exists")
                || error.message_contains("already registered")
                || error.message_contains("already exists")
        })
    }

    /// GoTrue refused a password grant.
    pub fn is_invalid_credentials(&self) -> bool {
        self.api_error().is_some_and(|error| {
            error.code_is("invalid_credentials")
                || error.code_is("invalid_grant")
                || error.message_contains("invalid login credentials")
        })
    }
}

impl fmt::Display for SupabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingUrl => write!(f, "Supabase URL is required"),
            Self::MissingApiKey => write!(f, "Supabase API key is required"),
            Self::MissingAccessToken => write!(f, "access token is required"),
            Self::InvalidBaseUrl(value) => write!(f, "invalid base URL: {value}"),
            Self::InvalidHeader(message) => write!(f, "invalid header: {message}"),
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(status, error) => write!(f, "HTTP {status} {error}"),
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::Auth(message) => write!(f, "{message}"),
            Self::Runtime(message) => write!(f, "runtime error: {message}"),
            Self::Cancelled => write!(f, "request cancelled"),
        }
    }
}

impl std::error::Error for SupabaseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(error) => Some(error),
            Self::Serde(error) => Some(error),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SupabaseError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for SupabaseError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

/// Parse a PostgREST or GoTrue error body.
///
/// Bodies that are not a recognized JSON error fall back to the raw text, or
/// the status reason when the body is empty.
pub fn parse_api_error(status: StatusCode, body: &str) -> ApiError {
    if let Some(error) = serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .and_then(ErrorPayload::into_api_error)
    {
        return error;
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        ApiError::from_message(status.canonical_reason().unwrap_or("request failed"))
    } else {
        ApiError::from_message(trimmed)
    }
}

pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    parse_api_error(status, body).message
}

fn non_empty_string(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
