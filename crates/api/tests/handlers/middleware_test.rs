use axum::{
    http::{header::AUTHORIZATION, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Router,
};
use chrono::Utc;
use officehours_api::{
    config::{parse_level, parse_origins},
    middleware::{auth, error_handling::map_error},
};
use officehours_core::{
    errors::{BookingError, ErrorKind},
    models::user::{Role, User},
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use tokio_test::{assert_err, assert_ok};
use tracing::Level;

#[rstest]
#[case(BookingError::invalid("slot id is required"), StatusCode::BAD_REQUEST)]
#[case(BookingError::Unauthenticated("Invalid Token".into()), StatusCode::UNAUTHORIZED)]
#[case(BookingError::forbidden("Not authorized"), StatusCode::FORBIDDEN)]
#[case(BookingError::not_found("Resource not found"), StatusCode::NOT_FOUND)]
#[case(BookingError::conflict("slot is already booked"), StatusCode::CONFLICT)]
#[case(BookingError::Unavailable(eyre::eyre!("Database error")), StatusCode::SERVICE_UNAVAILABLE)]
#[case(
    BookingError::Internal(Box::new(std::io::Error::new(std::io::ErrorKind::Other, "Internal error"))),
    StatusCode::INTERNAL_SERVER_ERROR
)]
fn test_error_status_mapping(#[case] error: BookingError, #[case] status: StatusCode) {
    let response = map_error(error);

    assert_eq!(response.status(), status);
}

#[test]
fn test_status_for_covers_every_kind() {
    use officehours_api::middleware::error_handling::status_for;

    assert_eq!(status_for(ErrorKind::Conflict), StatusCode::CONFLICT);
    assert_eq!(status_for(ErrorKind::Unavailable), StatusCode::SERVICE_UNAVAILABLE);
}

#[test]
fn test_hash_password() {
    let password = "Secret@123";
    let hashed = assert_ok!(auth::hash_password(password));

    assert_ne!(hashed, password);
    assert!(hashed.starts_with("$argon2"));
}

#[test]
fn test_verify_password() {
    let hashed = auth::hash_password("Secret@123").unwrap();

    assert!(auth::verify_password("Secret@123", &hashed));
    assert!(!auth::verify_password("Wrong@1234", &hashed));
    assert!(!auth::verify_password("Secret@123", "not-a-phc-string"));
}

fn user(role: Role) -> User {
    User {
        id: 42,
        username: "ProfessorP1".to_string(),
        email: "professorp1@test.com".to_string(),
        password_hash: String::new(),
        role,
        last_login: None,
        created_at: Utc::now(),
    }
}

#[test]
fn test_token_round_trip() {
    let token = assert_ok!(auth::create_token("secret", &user(Role::Professor), 1));
    let claims = assert_ok!(auth::decode_token("secret", &token));

    assert_eq!(claims.sub, "42");
    assert_eq!(claims.role, Role::Professor);
    assert!(claims.exp > claims.iat);
}

#[test]
fn test_expired_token_is_unauthenticated() {
    let token = auth::create_token("secret", &user(Role::Student), -2).unwrap();
    let err = assert_err!(auth::decode_token("secret", &token));

    assert_eq!(err.kind(), ErrorKind::Unauthenticated);
}

#[rstest]
#[case(i64::MAX)]
#[case(i64::MIN)]
#[case(100_000_000_000)]
fn test_oversized_token_lifetime_is_an_error(#[case] ttl_hours: i64) {
    assert_err!(auth::create_token("secret", &user(Role::Student), ttl_hours));
}

#[rstest]
#[case(None, "Auth token required")]
#[case(Some("Token abc"), "Invalid Authorization format")]
#[case(Some("Bearer "), "Invalid Authorization format")]
fn test_bearer_token_errors(#[case] header: Option<&str>, #[case] message: &str) {
    let mut headers = HeaderMap::new();
    if let Some(value) = header {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    }

    let err = auth::bearer_token(&headers).unwrap_err();

    assert_eq!(err.public_message(), message);
}

#[test]
fn test_bearer_token_extracts_token() {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));

    assert_eq!(auth::bearer_token(&headers).unwrap(), "abc.def.ghi");
}

#[rstest]
#[case("debug", Level::DEBUG)]
#[case("WARN", Level::WARN)]
#[case("chatty", Level::INFO)]
fn test_parse_level(#[case] raw: &str, #[case] level: Level) {
    assert_eq!(parse_level(raw), level);
}

#[test]
fn test_parse_origins_skips_blanks() {
    assert_eq!(
        parse_origins("http://localhost:3000, ,https://app.test"),
        vec!["http://localhost:3000".to_string(), "https://app.test".to_string()]
    );
}

#[tokio::test]
async fn test_timeout_maps_to_unavailable() {
    use std::time::Duration;

    use axum_test::TestServer;
    use officehours_api::with_timeout;
    use serde_json::{json, Value};

    let slow = Router::new().route(
        "/slow",
        get(|| async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            "done"
        }),
    );
    let server = TestServer::new(with_timeout(slow, Duration::from_millis(10))).unwrap();

    let response = server.get("/slow").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body = response.json::<Value>();
    assert_eq!(body["kind"], json!("unavailable"));
    assert_eq!(body["status"], json!("error"));
}
