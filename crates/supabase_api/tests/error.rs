use reqwest::StatusCode;

use supabase_api::error::{parse_api_error, parse_error_message};
use supabase_api::{ApiError, SupabaseError};

#[test]
fn parse_api_error_reads_postgrest_bodies() {
    let body = r#"{"code":"23505","details":"Key (username)=(alice) already exists.","hint":null,"message":"duplicate key value violates unique constraint \"profiles_username_key\""}"#;

    let error = parse_api_error(StatusCode::CONFLICT, body);
    assert_eq!(error.code.as_deref(), Some("23505"));
    assert_eq!(
        error.details.as_deref(),
        Some("Key (username)=(alice) already exists.")
    );
    assert!(error.message.starts_with("duplicate key value"));
}

#[test]
fn parse_api_error_reads_gotrue_bodies() {
    let body = r#"{"code":422,"error_code":"user_already_exists","msg":"User already registered"}"#;
    let error = parse_api_error(StatusCode::UNPROCESSABLE_ENTITY, body);
    assert_eq!(error.code.as_deref(), Some("user_already_exists"));
    assert_eq!(error.message, "User already registered");

    let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
    let error = parse_api_error(StatusCode::BAD_REQUEST, body);
    assert_eq!(error.code.as_deref(), Some("invalid_grant"));
    assert_eq!(error.message, "Invalid login credentials");
}

#[test]
fn parse_error_message_falls_back_to_raw_body_then_reason() {
    assert_eq!(
        parse_error_message(StatusCode::BAD_GATEWAY, "upstream down"),
        "upstream down"
    );
    assert_eq!(
        parse_error_message(StatusCode::SERVICE_UNAVAILABLE, ""),
        "Service Unavailable"
    );
}

#[test]
fn missing_relationship_is_detected_by_code_or_message() {
    let by_code = SupabaseError::Status(
        StatusCode::BAD_REQUEST,
        ApiError {
            code: Some("PGRST200".to_owned()),
            message: "Could not find".to_owned(),
            details: None,
            hint: None,
        },
    );
    let by_message = SupabaseError::Status(
        StatusCode::BAD_REQUEST,
        ApiError::from_message(
            "Could not find a relationship between 'messages' and 'profiles' in the schema cache",
        ),
    );
    let unrelated = SupabaseError::Status(
        StatusCode::BAD_REQUEST,
        ApiError::from_message("column messages.foo does not exist"),
    );

    assert!(by_code.is_missing_relationship());
    assert!(by_message.is_missing_relationship());
    assert!(!unrelated.is_missing_relationship());
    assert!(!SupabaseError::MissingUrl.is_missing_relationship());
}

#[test]
fn unique_violation_and_auth_helpers_classify_errors() {
    let unique = SupabaseError::Status(
        StatusCode::CONFLICT,
        ApiError {
            code: Some("23505".to_owned()),
            message: "conflict".to_owned(),
            details: None,
            hint: None,
        },
    );
    assert!(unique.is_unique_violation());

    let registered = SupabaseError::Status(
        StatusCode::UNPROCESSABLE_ENTITY,
        ApiError::from_message("User already registered"),
    );
    assert!(registered.is_already_registered());
    assert!(!registered.is_unique_violation());

    let credentials = SupabaseError::Status(
        StatusCode::BAD_REQUEST,
        ApiError::from_message("Invalid login credentials"),
    );
    assert!(credentials.is_invalid_credentials());
}

#[test]
fn status_errors_display_status_and_message() {
    let error = SupabaseError::Status(StatusCode::BAD_REQUEST, ApiError::from_message("bad"));
    assert_eq!(error.to_string(), "HTTP 400 Bad Request bad");
}
