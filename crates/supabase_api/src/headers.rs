use std::collections::BTreeMap;

use crate::config::SupabaseConfig;
use crate::error::SupabaseError;

pub const HEADER_APIKEY: &str = "apikey";
pub const HEADER_AUTHORIZATION: &str = "authorization";
pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_USER_AGENT: &str = "user-agent";
pub const HEADER_PREFER: &str = "prefer";

/// `Prefer` value asking PostgREST to echo written rows.
pub const PREFER_RETURN_REPRESENTATION: &str = "return=representation";
/// `Prefer` value asking PostgREST for an empty write response.
pub const PREFER_RETURN_MINIMAL: &str = "return=minimal";

/// Build a deterministic header map for Supabase requests.
pub fn build_headers(
    config: &SupabaseConfig,
    user_agent: Option<&str>,
) -> Result<BTreeMap<String, String>, SupabaseError> {
    let api_key = config.api_key.trim();
    if api_key.is_empty() {
        return Err(SupabaseError::MissingApiKey);
    }

    let mut headers = BTreeMap::new();
    headers.insert(HEADER_APIKEY.to_owned(), api_key.to_owned());
    headers.insert(
        HEADER_AUTHORIZATION.to_owned(),
        format!("Bearer {}", config.bearer_token()),
    );
    headers.insert(HEADER_ACCEPT.to_owned(), "application/json".to_owned());
    headers.insert(
        HEADER_CONTENT_TYPE.to_owned(),
        "application/json".to_owned(),
    );

    let ua = match (user_agent, config.user_agent.as_deref()) {
        (Some(explicit), _) if !explicit.trim().is_empty() => explicit.trim().to_owned(),
        (_, Some(explicit)) if !explicit.trim().is_empty() => explicit.trim().to_owned(),
        _ => default_user_agent(),
    };
    headers.insert(HEADER_USER_AGENT.to_owned(), ua);

    for (key, value) in &config.extra_headers {
        headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_owned());
    }

    Ok(headers)
}

pub fn default_user_agent() -> String {
    format!("relay/{}", env!("CARGO_PKG_VERSION"))
}
