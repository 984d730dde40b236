//! E2E tests for validate, profile and logout.

use auth_test_utils::*;
use jsonwebtoken::Algorithm;
use reqwest::StatusCode;
use serde_json::Value;

async fn validate(server: &TestAuthServer, authorization: Option<&str>) -> Result<bool, anyhow::Error> {
    let mut request = reqwest::Client::new().get(format!("{}/api/auth/validate", server.url()));
    if let Some(value) = authorization {
        request = request.header("Authorization", value);
    }
    let response = request.send().await?;
    assert_eq!(response.status(), StatusCode::OK, "validate always answers 200");
    Ok(response.json().await?)
}

// ============================================================================
// Validate
// ============================================================================

#[tokio::test]
async fn test_validate_accepts_issued_access_token() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let token = server.access_token_for(&alice_identity())?;

    assert!(validate(&server, Some(&format!("Bearer {token}"))).await?);
    Ok(())
}

#[tokio::test]
async fn test_validate_rejects_bad_headers_and_tokens() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let token = server.access_token_for(&alice_identity())?;

    let refresh = TestTokenBuilder::refresh().sign_with_test_secret();
    let expired = TestTokenBuilder::new().expired(1).sign_with_test_secret();
    let wrong_secret = TestTokenBuilder::new().sign(WRONG_JWT_SECRET);
    let hs512 = TestTokenBuilder::new()
        .with_algorithm(Algorithm::HS512)
        .sign_with_test_secret();
    let unsigned = unsigned_token(&TestTokenBuilder::new().build());
    let future = TestTokenBuilder::new()
        .issued_at(chrono::Utc::now().timestamp() + 3600)
        .expires_in(7200)
        .sign_with_test_secret();

    assert!(!validate(&server, None).await?);
    assert!(!validate(&server, Some(&token)).await?, "missing Bearer prefix");
    assert!(!validate(&server, Some(&format!("Basic {token}"))).await?);
    assert!(!validate(&server, Some(&format!("bearer {token}"))).await?);
    for bad in [refresh, expired, wrong_secret, hs512, unsigned, future] {
        assert!(!validate(&server, Some(&format!("Bearer {bad}"))).await?);
    }
    Ok(())
}

// ============================================================================
// Profile
// ============================================================================

#[tokio::test]
async fn test_profile_returns_current_identity() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let alice = server
        .seed_user(alice_identity(), TEST_PASSWORD_ALICE)
        .await;
    let token = server.access_token_for(&alice)?;

    let response = reqwest::Client::new()
        .get(format!("{}/api/auth/profile", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await?;
    assert_eq!(body["id"], 42);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["fullName"], "Alice Admin");
    assert_eq!(body["role"], "ADMIN");
    Ok(())
}

#[tokio::test]
async fn test_profile_without_header_unauthorized() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let response = reqwest::get(format!("{}/api/auth/profile", server.url())).await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
    Ok(())
}

#[tokio::test]
async fn test_profile_expired_and_tampered_look_the_same() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server
        .seed_user(alice_identity(), TEST_PASSWORD_ALICE)
        .await;

    let expired = TestTokenBuilder::new().expired(30).sign_with_test_secret();
    let tampered = tamper_claim(
        &TestTokenBuilder::new()
            .with_role("USER")
            .sign_with_test_secret(),
        "role",
        serde_json::json!("ADMIN"),
    );

    let mut bodies = Vec::new();
    for token in [expired, tampered] {
        let response = reqwest::Client::new()
            .get(format!("{}/api/auth/profile", server.url()))
            .bearer_auth(&token)
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        bodies.push(response.json::<Value>().await?);
    }

    assert_eq!(bodies[0], bodies[1]);
    Ok(())
}

#[tokio::test]
async fn test_profile_for_unknown_user_not_found() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let token = server.access_token_for(&bob_identity())?;

    let response = reqwest::Client::new()
        .get(format!("{}/api/auth/profile", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["message"], "User not found");
    Ok(())
}

// ============================================================================
// Logout
// ============================================================================

#[tokio::test]
async fn test_logout_acknowledges_and_token_stays_valid() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let token = server.access_token_for(&alice_identity())?;

    let response = reqwest::Client::new()
        .post(format!("{}/api/auth/logout", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await?, "Logged out successfully");

    // Nothing is revoked server-side.
    assert!(validate(&server, Some(&format!("Bearer {token}"))).await?);
    Ok(())
}

#[tokio::test]
async fn test_logout_without_bearer_unauthorized() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let response = reqwest::Client::new()
        .post(format!("{}/api/auth/logout", server.url()))
        .header("Authorization", "Token abc")
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
