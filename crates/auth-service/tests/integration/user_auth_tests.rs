//! E2E tests for login and registration.
//!
//! ## Test Naming
//!
//! Tests follow the convention: `test_<feature>_<scenario>_<expected_result>`

use auth_service::repositories::UserRepository;
use auth_test_utils::*;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn login(
    server: &TestAuthServer,
    username_or_email: &str,
    password: &str,
) -> Result<reqwest::Response, anyhow::Error> {
    Ok(reqwest::Client::new()
        .post(format!("{}/api/auth/login", server.url()))
        .json(&json!({
            "usernameOrEmail": username_or_email,
            "password": password,
        }))
        .send()
        .await?)
}

async fn register(server: &TestAuthServer, body: Value) -> Result<reqwest::Response, anyhow::Error> {
    Ok(reqwest::Client::new()
        .post(format!("{}/api/auth/register", server.url()))
        .json(&body)
        .send()
        .await?)
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_admin_issues_tokens_with_role_and_id() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server
        .seed_user(alice_identity(), TEST_PASSWORD_ALICE)
        .await;

    let response = login(&server, TEST_USERNAME_ALICE, TEST_PASSWORD_ALICE).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await?;
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["expiresIn"], 3_600_000);
    assert_eq!(body["user"]["id"], 42);
    assert_eq!(body["user"]["role"], "ADMIN");

    let access = body["accessToken"].as_str().expect("accessToken");
    access
        .assert_valid_jwt()
        .assert_access_token()
        .assert_for_subject("alice")
        .assert_has_role("ADMIN")
        .assert_user_id(42)
        .assert_expires_in(3600);

    let refresh = body["refreshToken"].as_str().expect("refreshToken");
    refresh
        .assert_valid_jwt()
        .assert_refresh_token()
        .assert_for_subject("alice")
        .assert_user_id(42);

    Ok(())
}

#[tokio::test]
async fn test_login_by_email_succeeds() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.seed_user(bob_identity(), TEST_PASSWORD_BOB).await;

    let response = login(&server, TEST_EMAIL_BOB, TEST_PASSWORD_BOB).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await?;
    assert_eq!(body["user"]["username"], "bob");
    assert_eq!(body["user"]["role"], "USER");
    Ok(())
}

#[tokio::test]
async fn test_login_records_last_login() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.seed_user(bob_identity(), TEST_PASSWORD_BOB).await;

    login(&server, TEST_USERNAME_BOB, TEST_PASSWORD_BOB).await?;

    let record = server.users().find_by_id(TEST_USER_BOB_ID).await;
    assert!(record.and_then(|r| r.identity.last_login).is_some());
    Ok(())
}

#[tokio::test]
async fn test_login_wrong_password_and_unknown_user_look_the_same() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.seed_user(bob_identity(), TEST_PASSWORD_BOB).await;

    let wrong_password = login(&server, TEST_USERNAME_BOB, "not-bobs-password").await?;
    let unknown_user = login(&server, "mallory", "whatever-password").await?;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);

    let a: Value = wrong_password.json().await?;
    let b: Value = unknown_user.json().await?;
    assert_eq!(a, b);
    assert_eq!(a["error"]["code"], "INVALID_CREDENTIALS");
    Ok(())
}

#[tokio::test]
async fn test_login_inactive_user_rejected() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.seed_user(bob_identity(), TEST_PASSWORD_BOB).await;
    server.users().deactivate(TEST_USER_BOB_ID).await;

    let response = login(&server, TEST_USERNAME_BOB, TEST_PASSWORD_BOB).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_login_malformed_body_rejected() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let response = reqwest::Client::new()
        .post(format!("{}/api/auth/login", server.url()))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;

    assert!(response.status().is_client_error());
    Ok(())
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_happy_path_creates_user_role() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let response = register(
        &server,
        json!({
            "username": "carol",
            "email": "carol@example.com",
            "password": "carol-password",
            "fullName": "Carol Newcomer"
        }),
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await?;
    assert_eq!(body["user"]["username"], "carol");
    assert_eq!(body["user"]["role"], "USER");
    body["accessToken"]
        .as_str()
        .expect("accessToken")
        .assert_has_role("USER")
        .assert_for_subject("carol");

    // The new account can log in straight away.
    let response = login(&server, "carol", "carol-password").await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_register_duplicate_username_conflicts() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.seed_user(bob_identity(), TEST_PASSWORD_BOB).await;

    let response = register(
        &server,
        json!({
            "username": "bob",
            "email": "another-bob@example.com",
            "password": "password-123",
            "fullName": "Bob Again"
        }),
    )
    .await?;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "CREDENTIAL_TAKEN");
    assert_eq!(body["error"]["message"], "Username is already taken");
    Ok(())
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.seed_user(bob_identity(), TEST_PASSWORD_BOB).await;

    let response = register(
        &server,
        json!({
            "username": "robert",
            "email": TEST_EMAIL_BOB,
            "password": "password-123",
            "fullName": "Robert"
        }),
    )
    .await?;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["message"], "Email is already registered");
    Ok(())
}

#[tokio::test]
async fn test_register_invalid_input_is_bad_request() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let short_password = register(
        &server,
        json!({
            "username": "dave",
            "email": "dave@example.com",
            "password": "short",
            "fullName": "Dave"
        }),
    )
    .await?;
    assert_eq!(short_password.status(), StatusCode::BAD_REQUEST);

    let bad_email = register(
        &server,
        json!({
            "username": "dave",
            "email": "not-an-email",
            "password": "long-enough-password",
            "fullName": "Dave"
        }),
    )
    .await?;
    assert_eq!(bad_email.status(), StatusCode::BAD_REQUEST);

    let found = server.users().find_by_username("dave").await?;
    assert!(found.is_none(), "Rejected registrations must not persist");
    Ok(())
}
