use ::url::Url;

use crate::error::SupabaseError;

/// Path prefix of the PostgREST service.
pub const REST_PATH: &str = "rest/v1";
/// Path prefix of the GoTrue service.
pub const AUTH_PATH: &str = "auth/v1";

/// Normalize a project URL to the bare project origin.
///
/// Normalization rules:
/// 1) surrounding whitespace and trailing `/` are removed
/// 2) a pasted `/rest/v1` or `/auth/v1` suffix is dropped
/// 3) the result must parse as an `http` or `https` URL
pub fn normalize_base_url(input: &str) -> Result<String, SupabaseError> {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(SupabaseError::MissingUrl);
    }

    let mut base = trimmed;
    for suffix in [REST_PATH, AUTH_PATH] {
        if let Some(stripped) = base.strip_suffix(suffix) {
            if stripped.ends_with('/') {
                base = stripped.trim_end_matches('/');
            }
        }
    }

    let parsed = Url::parse(base).map_err(|error| {
        SupabaseError::InvalidBaseUrl(format!("{base}: {error}"))
    })?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(SupabaseError::InvalidBaseUrl(base.to_string()));
    }

    Ok(base.to_string())
}

/// Endpoint for one PostgREST table.
pub fn rest_url(base_url: &str, table: &str) -> String {
    format!("{base_url}/{REST_PATH}/{table}")
}

/// Endpoint for one GoTrue route, e.g. `signup` or `token`.
pub fn auth_url(base_url: &str, route: &str) -> String {
    format!("{base_url}/{AUTH_PATH}/{route}")
}
