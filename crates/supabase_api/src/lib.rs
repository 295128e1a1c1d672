//! Transport-only Supabase client primitives.
//!
//! This crate owns request building and response parsing for the two Supabase
//! services the relay client talks to: PostgREST table access under
//! `/rest/v1` and GoTrue auth under `/auth/v1`. It contains no session
//! persistence and no chat semantics.
//!
//! Errors keep the parsed PostgREST/GoTrue error body so callers can tell an
//! unknown embedded relation ([`SupabaseError::is_missing_relationship`]) or a
//! unique-constraint violation ([`SupabaseError::is_unique_violation`]) apart
//! from ordinary failures.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod query;
pub mod url;

pub use auth::{AuthSession, AuthUser, SignUpResponse};
pub use client::SupabaseClient;
pub use config::SupabaseConfig;
pub use error::{ApiError, SupabaseError};
pub use query::{Direction, Filter, Select};
pub use crate::url::normalize_base_url;
pub use reqwest::StatusCode;
