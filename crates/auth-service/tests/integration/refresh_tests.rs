//! E2E tests for refresh token rotation.

use auth_service::models::Role;
use auth_test_utils::*;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn login_alice(server: &TestAuthServer) -> Result<Value, anyhow::Error> {
    server
        .seed_user(alice_identity(), TEST_PASSWORD_ALICE)
        .await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/auth/login", server.url()))
        .json(&json!({
            "usernameOrEmail": TEST_USERNAME_ALICE,
            "password": TEST_PASSWORD_ALICE,
        }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(response.json().await?)
}

async fn refresh(server: &TestAuthServer, token: &str) -> Result<reqwest::Response, anyhow::Error> {
    Ok(reqwest::Client::new()
        .post(format!("{}/api/auth/refresh", server.url()))
        .json(&json!({ "refreshToken": token }))
        .send()
        .await?)
}

#[tokio::test]
async fn test_refresh_issues_new_pair_for_same_subject() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let session = login_alice(&server).await?;
    let refresh_token = session["refreshToken"].as_str().expect("refreshToken");

    let response = refresh(&server, refresh_token).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await?;
    assert_eq!(body["user"]["id"], 42);
    body["accessToken"]
        .as_str()
        .expect("accessToken")
        .assert_access_token()
        .assert_for_subject("alice")
        .assert_has_role("ADMIN")
        .assert_user_id(42);
    body["refreshToken"]
        .as_str()
        .expect("refreshToken")
        .assert_refresh_token()
        .assert_for_subject("alice");

    Ok(())
}

#[tokio::test]
async fn test_refresh_old_refresh_token_remains_usable() -> Result<(), anyhow::Error> {
    // Rotation is stateless: nothing is revoked.
    let server = TestAuthServer::spawn().await?;
    let session = login_alice(&server).await?;
    let refresh_token = session["refreshToken"].as_str().expect("refreshToken");

    assert_eq!(refresh(&server, refresh_token).await?.status(), StatusCode::OK);
    assert_eq!(refresh(&server, refresh_token).await?.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_refresh_picks_up_role_change() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let session = login_alice(&server).await?;
    let refresh_token = session["refreshToken"].as_str().expect("refreshToken");

    let mut demoted = alice_identity();
    demoted.role = Role::User;
    server.seed_user(demoted, TEST_PASSWORD_ALICE).await;

    let body: Value = refresh(&server, refresh_token).await?.json().await?;
    body["accessToken"]
        .as_str()
        .expect("accessToken")
        .assert_has_role("USER");
    Ok(())
}

#[tokio::test]
async fn test_refresh_with_access_token_rejected() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let session = login_alice(&server).await?;
    let access_token = session["accessToken"].as_str().expect("accessToken");

    let response = refresh(&server, access_token).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "INVALID_REFRESH_TOKEN");
    Ok(())
}

#[tokio::test]
async fn test_refresh_with_forged_tokens_rejected() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server
        .seed_user(alice_identity(), TEST_PASSWORD_ALICE)
        .await;

    let wrong_secret = TestTokenBuilder::refresh().sign(WRONG_JWT_SECRET);
    let expired = TestTokenBuilder::refresh().expired(60).sign_with_test_secret();
    let tampered = tamper_claim(
        &TestTokenBuilder::refresh()
            .for_user("bob")
            .sign_with_test_secret(),
        "sub",
        json!("alice"),
    );

    for token in [wrong_secret, expired, tampered, "garbage".to_string()] {
        let response = refresh(&server, &token).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "token: {token}");
    }
    Ok(())
}

#[tokio::test]
async fn test_refresh_for_deleted_user_not_found() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let session = login_alice(&server).await?;
    let refresh_token = session["refreshToken"].as_str().expect("refreshToken");

    server.users().delete(TEST_USER_ALICE_ID).await;

    let response = refresh(&server, refresh_token).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "IDENTITY_NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn test_refresh_for_deactivated_user_not_found() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let session = login_alice(&server).await?;
    let refresh_token = session["refreshToken"].as_str().expect("refreshToken");

    server.users().deactivate(TEST_USER_ALICE_ID).await;

    let response = refresh(&server, refresh_token).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}
