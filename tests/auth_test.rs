mod common;

use sea_orm::{ConnectionTrait, Statement};
use serde_json::Value;

#[tokio::test]
async fn register_verify_login_flow() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let email = common::unique_email("alice");

    // Register
    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "name": "Alice",
            "email": email,
            "password": "password_123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert!(body["success"].as_bool().unwrap());
    assert_eq!(body["data"]["requiresVerification"], true);
    assert_eq!(body["data"]["email"], email);

    // Login before verification resends a code and fails with 403
    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&serde_json::json!({ "email": email, "password": "password_123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["requiresVerification"], true);
    assert_eq!(body["email"], email);

    // Verify with the stored code
    let otp = common::fetch_otp(&app.db, &email).await;
    let resp = app
        .client
        .post(app.url("/auth/verify-otp"))
        .json(&serde_json::json!({ "email": email, "otp": otp }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let token = body["data"]["token"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["user"]["isVerified"], true);
    // Sensitive columns never serialize
    assert!(body["data"]["user"].get("passwordHash").is_none());
    assert!(body["data"]["user"].get("verificationOtp").is_none());

    // Current user
    let resp = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["email"], email);
    assert_eq!(body["data"]["name"], "Alice");

    // Login now succeeds
    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&serde_json::json!({ "email": email, "password": "password_123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["token"].as_str().is_some());
}

#[tokio::test]
async fn register_verified_email_conflicts() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let (email, _token) = common::create_verified_user(&app, "bob").await;

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "name": "Bob Again",
            "email": email,
            "password": "password_456"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn reregister_unverified_email_resends_code() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let email = common::unique_email("carol");

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "name": "Carol",
            "email": email,
            "password": "password_123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    // Same email again while unverified: refreshed, not a conflict
    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "name": "Carol Updated",
            "email": email,
            "password": "different_password"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["success"].as_bool().unwrap());

    // The refreshed password is the one that counts
    let otp = common::fetch_otp(&app.db, &email).await;
    let resp = app
        .client
        .post(app.url("/auth/verify-otp"))
        .json(&serde_json::json!({ "email": email, "otp": otp }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&serde_json::json!({ "email": email, "password": "different_password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn verify_wrong_otp_fails() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let email = common::unique_email("dave");

    app.client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "name": "Dave",
            "email": email,
            "password": "password_123"
        }))
        .send()
        .await
        .unwrap();

    // Derive a code guaranteed to differ from the stored one
    let otp = common::fetch_otp(&app.db, &email).await;
    let wrong = if otp == "999999" { "100000" } else { "999999" };

    let resp = app
        .client
        .post(app.url("/auth/verify-otp"))
        .json(&serde_json::json!({ "email": email, "otp": wrong }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Invalid OTP");
}

#[tokio::test]
async fn verify_expired_otp_fails() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let email = common::unique_email("erin");

    app.client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "name": "Erin",
            "email": email,
            "password": "password_123"
        }))
        .send()
        .await
        .unwrap();

    let otp = common::fetch_otp(&app.db, &email).await;

    // Age the code past its validity window
    app.db
        .execute(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "UPDATE users SET otp_expiry = NOW() - INTERVAL '1 minute' WHERE email = $1",
            vec![email.clone().into()],
        ))
        .await
        .unwrap();

    let resp = app
        .client
        .post(app.url("/auth/verify-otp"))
        .json(&serde_json::json!({ "email": email, "otp": otp }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("expired"));

    // A resend issues a usable replacement
    let resp = app
        .client
        .post(app.url("/auth/resend-otp"))
        .json(&serde_json::json!({ "email": email }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let otp = common::fetch_otp(&app.db, &email).await;
    let resp = app
        .client
        .post(app.url("/auth/verify-otp"))
        .json(&serde_json::json!({ "email": email, "otp": otp }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn verify_twice_conflicts() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let (email, _token) = common::create_verified_user(&app, "frank").await;

    let resp = app
        .client
        .post(app.url("/auth/verify-otp"))
        .json(&serde_json::json!({ "email": email, "otp": "123456" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("already verified"));
}

#[tokio::test]
async fn login_bad_credentials_are_uniform() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let (email, _token) = common::create_verified_user(&app, "grace").await;

    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&serde_json::json!({ "email": email, "password": "wrong_password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let wrong_password: Value = resp.json().await.unwrap();

    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&serde_json::json!({
            "email": common::unique_email("nobody"),
            "password": "wrong_password"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let unknown_email: Value = resp.json().await.unwrap();

    // Unknown account and wrong password are indistinguishable
    assert_eq!(wrong_password["error"], unknown_email["error"]);
}

#[tokio::test]
async fn login_email_is_case_insensitive() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let (email, _token) = common::create_verified_user(&app, "heidi").await;

    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&serde_json::json!({
            "email": format!("  {} ", email.to_uppercase()),
            "password": "test_password_123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn change_password_flow() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let (email, token) = common::create_verified_user(&app, "ivan").await;

    // Wrong current password is rejected
    let resp = app
        .client
        .put(app.url("/user/password"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "currentPassword": "not_my_password",
            "newPassword": "new_password_456"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = app
        .client
        .put(app.url("/user/password"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "currentPassword": "test_password_123",
            "newPassword": "new_password_456"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&serde_json::json!({ "email": email, "password": "new_password_456" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn delete_account_removes_everything() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let (_email, token) = common::create_verified_user(&app, "judy").await;

    common::create_question(
        &app,
        &token,
        serde_json::json!({
            "title": "Two Sum",
            "link": "https://leetcode.com/problems/two-sum/"
        }),
    )
    .await;

    // Wrong password keeps the account
    let resp = app
        .client
        .delete(app.url("/user/account"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = app
        .client
        .delete(app.url("/user/account"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "password": "test_password_123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // The token now points at a deleted account
    let resp = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn protected_routes_require_token() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };

    let resp = app.client.get(app.url("/auth/me")).send().await.unwrap();
    assert_eq!(resp.status(), 401);

    let resp = app
        .client
        .get(app.url("/questions"))
        .bearer_auth("not.a.jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };

    let resp = app.client.get(app.url("/auth/me")).send().await.unwrap();
    let headers = resp.headers();
    assert_eq!(
        headers
            .get("x-content-type-options")
            .and_then(|v| v.to_str().ok()),
        Some("nosniff")
    );
    assert_eq!(
        headers.get("x-frame-options").and_then(|v| v.to_str().ok()),
        Some("DENY")
    );
}
