//! CLI tests against a mock API.
//!
//! Each test gets its own wiremock server and credentials file, so tests
//! run in parallel without sharing a session.

mod common;

use common::Harness;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn expired() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({
        "detail": "Given token not valid for any token type",
        "code": "token_not_valid"
    }))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_persists_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .and(body_json(json!({"username": "alice", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": "A1",
            "refresh": "R1",
            "user": {"id": 1, "username": "alice"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cli = Harness::new(&server);
    let stdout = cli
        .run_success(&["login", "--username", "alice", "--password", "pw"])
        .await;

    assert!(stdout.contains("Logged in successfully"));
    assert_eq!(
        cli.stored(),
        Some(json!({"access_token": "A1", "refresh_token": "R1"}))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "No active account found with the given credentials"
        })))
        .mount(&server)
        .await;

    let cli = Harness::new(&server);
    let stderr = cli
        .run_failure(&["login", "--username", "alice", "--password", "nope"])
        .await;

    assert!(stderr.contains("Failed to login"));
    assert!(stderr.contains("No active account found"));
    assert!(cli.stored().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_without_session() {
    let server = MockServer::start().await;
    let cli = Harness::new(&server);

    let stdout = cli.run_success(&["status"]).await;

    assert!(stdout.contains("not logged in"));
    assert!(stdout.contains(&cli.api_url));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_commands_require_login() {
    let server = MockServer::start().await;
    let cli = Harness::new(&server);

    let stderr = cli.run_failure(&["weather", "current", "London"]).await;

    assert!(stderr.contains("Not logged in"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_expired_token_renewed_across_invocations() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/weather/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(expired())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .and(body_json(json!({"refresh": "R1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/weather/"))
        .and(query_param("city", "London"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "city": "London",
            "country": "GB",
            "temperature": 15,
            "description": "overcast clouds",
            "humidity": 72,
            "wind_speed": 3.6,
            "pressure": 1015
        })))
        .expect(2)
        .mount(&server)
        .await;

    let cli = Harness::new(&server);
    cli.seed("A1", "R1");

    let stdout = cli.run_success(&["weather", "current", "London"]).await;
    assert!(stdout.contains("London, GB"));
    assert!(stdout.contains("15.0 °C"));
    assert_eq!(
        cli.stored(),
        Some(json!({"access_token": "A2", "refresh_token": "R1"}))
    );

    // The renewed token is picked up by the next process.
    cli.run_success(&["weather", "current", "London"]).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_renewal_clears_store() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/profile/"))
        .respond_with(expired())
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Token is blacklisted",
            "code": "token_not_valid"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cli = Harness::new(&server);
    cli.seed("A1", "R1");

    let stderr = cli.run_failure(&["profile"]).await;

    assert!(stderr.contains("session expired"));
    assert!(stderr.contains("jwtpipe login"));
    assert!(cli.stored().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_refresh_command() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "A2", "refresh": "R2"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cli = Harness::new(&server);
    cli.seed("A1", "R1");

    let stdout = cli.run_success(&["refresh"]).await;

    assert!(stdout.contains("Access token renewed"));
    assert_eq!(
        cli.stored(),
        Some(json!({"access_token": "A2", "refresh_token": "R2"}))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_logout_clears_even_when_server_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let cli = Harness::new(&server);
    cli.seed("A1", "R1");

    let stdout = cli.run_success(&["logout"]).await;

    assert!(stdout.contains("Logged out"));
    assert!(!cli.store_path().exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_raw_request_with_body_and_headers() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/auth/profile/update/"))
        .and(header("authorization", "Bearer A1"))
        .and(header("x-request-id", "42"))
        .and(body_json(json!({"first_name": "Alice"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Profile updated successfully",
            "user": {"id": 1, "username": "alice", "first_name": "Alice"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cli = Harness::new(&server);
    cli.seed("A1", "R1");

    let stdout = cli
        .run_success(&[
            "request",
            "put",
            "/auth/profile/update/",
            "--data",
            r#"{"first_name": "Alice"}"#,
            "-H",
            "X-Request-Id: 42",
            "-H",
            "Authorization: Bearer forged",
        ])
        .await;

    let printed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(printed["user"]["first_name"], "Alice");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_weather_history_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/weather/history/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 2,
                "city": "Paris",
                "country": "FR",
                "temperature": 18.5,
                "description": "clear sky",
                "humidity": 40,
                "wind_speed": 2.0,
                "pressure": 1020,
                "searched_at": "2025-03-01T12:30:00Z"
            },
            {
                "id": 1,
                "city": "London",
                "temperature": 11.0,
                "searched_at": "2025-02-28T08:00:00Z"
            }
        ])))
        .mount(&server)
        .await;

    let cli = Harness::new(&server);
    cli.seed("A1", "R1");

    let stdout = cli
        .run_success(&["weather", "history", "--limit", "1", "--json"])
        .await;

    let printed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(printed.as_array().unwrap().len(), 1);
    assert_eq!(printed[0]["city"], "Paris");
}
