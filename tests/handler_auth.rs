mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};
use sqlx::PgPool;
use std::sync::Arc;

use common::{
    RecordingMailer, TEST_PASSWORD, bearer, create_test_state_with, create_user, make_server,
    server_for, token_for,
};
use tour_booking::config::RunMode;
use tour_booking::domain::entities::Role;

fn signup_payload(email: &str) -> Value {
    json!({
        "name": "Laura Wilson",
        "email": email,
        "password": "pass1234",
        "passwordConfirm": "pass1234",
        "role": "admin"
    })
}

#[sqlx::test]
async fn test_signup_issues_session(pool: PgPool) {
    let (server, _) = make_server(pool);

    let response = server
        .post("/api/v1/users/signup")
        .json(&signup_payload("Laura@Example.io"))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let cookie = response.header("set-cookie");
    let cookie = cookie.to_str().unwrap();
    assert!(cookie.starts_with("jwt="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));

    let body: Value = response.json();
    assert_eq!(body["status"], "success");
    assert!(body["token"].as_str().unwrap().len() > 20);
    let user = &body["data"]["user"];
    assert_eq!(user["email"], "laura@example.io");
    assert_eq!(user["role"], "user");
    assert!(user.get("password").is_none());
    assert!(user.get("active").is_none());
}

#[sqlx::test]
async fn test_development_cookie_is_not_secure(pool: PgPool) {
    let state = create_test_state_with(pool, RunMode::Development, Arc::default());
    let server = server_for(state);

    let response = server
        .post("/api/v1/users/signup")
        .json(&signup_payload("laura@example.io"))
        .await;

    let cookie = response.header("set-cookie");
    assert!(!cookie.to_str().unwrap().contains("Secure"));
}

#[sqlx::test]
async fn test_signup_duplicate_email(pool: PgPool) {
    create_user(&pool, "Laura Wilson", "laura@example.io", Role::User).await;
    let (server, _) = make_server(pool);

    let response = server
        .post("/api/v1/users/signup")
        .json(&signup_payload("LAURA@example.io"))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(
        body["message"],
        "Duplicate field value: laura@example.io. Please use another value!"
    );
}

#[sqlx::test]
async fn test_login(pool: PgPool) {
    create_user(&pool, "Laura Wilson", "laura@example.io", Role::User).await;
    let (server, _) = make_server(pool);

    let response = server
        .post("/api/v1/users/login")
        .json(&json!({ "email": "laura@example.io", "password": TEST_PASSWORD }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["user"]["name"], "Laura Wilson");

    let response = server
        .post("/api/v1/users/login")
        .json(&json!({ "email": "laura@example.io", "password": "wrong-password" }))
        .await;
    response.assert_status_unauthorized();
    let body: Value = response.json();
    assert_eq!(body["message"], "Incorrect email or password");

    let response = server
        .post("/api/v1/users/login")
        .json(&json!({ "email": "nobody@example.io", "password": TEST_PASSWORD }))
        .await;
    response.assert_status_unauthorized();
}

#[sqlx::test]
async fn test_session_via_bearer_and_cookie(pool: PgPool) {
    let user = create_user(&pool, "Laura Wilson", "laura@example.io", Role::User).await;
    let token = token_for(user.id);
    let (server, _) = make_server(pool);

    let response = server
        .get("/api/v1/users/me")
        .add_header("Authorization", bearer(&token))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["data"]["email"], "laura@example.io");

    let response = server
        .get("/api/v1/users/me")
        .add_header("Cookie", format!("theme=dark; jwt={token}"))
        .await;
    response.assert_status_ok();
}

#[sqlx::test]
async fn test_logout_cookie_is_not_a_session(pool: PgPool) {
    let (server, _) = make_server(pool);

    let response = server.get("/api/v1/users/logout").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "success" }));
    let cookie = response.header("set-cookie");
    let cookie = cookie.to_str().unwrap();
    assert!(cookie.starts_with("jwt=loggedout"));
    assert!(cookie.contains("Max-Age=10"));

    let response = server
        .get("/api/v1/users/me")
        .add_header("Cookie", "jwt=loggedout")
        .await;
    response.assert_status_unauthorized();
}

#[sqlx::test]
async fn test_token_of_deleted_user(pool: PgPool) {
    let user = create_user(&pool, "Laura Wilson", "laura@example.io", Role::User).await;
    let token = token_for(user.id);
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();
    let (server, _) = make_server(pool);

    let response = server
        .get("/api/v1/users/me")
        .add_header("Authorization", bearer(&token))
        .await;

    response.assert_status_unauthorized();
    let body: Value = response.json();
    assert_eq!(
        body["message"],
        "The user belonging to this token does no longer exist."
    );
}

#[sqlx::test]
async fn test_token_issued_before_password_change(pool: PgPool) {
    let user = create_user(&pool, "Laura Wilson", "laura@example.io", Role::User).await;
    let token = token_for(user.id);
    sqlx::query("UPDATE users SET password_changed_at = NOW() + INTERVAL '1 minute' WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();
    let (server, _) = make_server(pool);

    let response = server
        .get("/api/v1/users/me")
        .add_header("Authorization", bearer(&token))
        .await;

    response.assert_status_unauthorized();
    let body: Value = response.json();
    assert_eq!(
        body["message"],
        "User recently changed password! Please log in again."
    );
}

#[sqlx::test]
async fn test_forgot_and_reset_password(pool: PgPool) {
    create_user(&pool, "Laura Wilson", "laura@example.io", Role::User).await;
    let (server, mailer) = make_server(pool);

    let response = server
        .post("/api/v1/users/forgotPassword")
        .json(&json!({ "email": "laura@example.io" }))
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "success", "message": "Token sent to email!" }));

    let email = mailer.last().unwrap();
    assert_eq!(email.to, "laura@example.io");
    assert!(email.text.contains("http://tours.test/api/v1/users/resetPassword/"));
    let token = mailer.last_reset_token().unwrap();
    assert_eq!(token.len(), 64);

    let response = server
        .patch(&format!("/api/v1/users/resetPassword/{token}"))
        .json(&json!({ "password": "newpass123", "passwordConfirm": "newpass123" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["token"].is_string());

    let response = server
        .post("/api/v1/users/login")
        .json(&json!({ "email": "laura@example.io", "password": "newpass123" }))
        .await;
    response.assert_status_ok();

    // One use only
    let response = server
        .patch(&format!("/api/v1/users/resetPassword/{token}"))
        .json(&json!({ "password": "another123", "passwordConfirm": "another123" }))
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["message"], "Token is invalid or has expired");
}

#[sqlx::test]
async fn test_forgot_password_unknown_email(pool: PgPool) {
    let (server, mailer) = make_server(pool);

    let response = server
        .post("/api/v1/users/forgotPassword")
        .json(&json!({ "email": "nobody@example.io" }))
        .await;

    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["message"], "There is no user with that email address.");
    assert!(mailer.last().is_none());
}

#[sqlx::test]
async fn test_forgot_password_mail_failure_clears_token(pool: PgPool) {
    let user = create_user(&pool, "Laura Wilson", "laura@example.io", Role::User).await;
    let state = create_test_state_with(
        pool.clone(),
        RunMode::Production,
        Arc::new(RecordingMailer::failing()),
    );
    let server = server_for(state);

    let response = server
        .post("/api/v1/users/forgotPassword")
        .json(&json!({ "email": "laura@example.io" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["status"], "error");
    assert_eq!(
        body["message"],
        "There was an error sending the email. Try again later!"
    );

    let stored: Option<String> =
        sqlx::query_scalar("SELECT password_reset_token FROM users WHERE id = $1")
            .bind(user.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(stored.is_none());
}

#[sqlx::test]
async fn test_expired_reset_token(pool: PgPool) {
    create_user(&pool, "Laura Wilson", "laura@example.io", Role::User).await;
    let (server, mailer) = make_server(pool.clone());

    server
        .post("/api/v1/users/forgotPassword")
        .json(&json!({ "email": "laura@example.io" }))
        .await
        .assert_status_ok();
    let token = mailer.last_reset_token().unwrap();
    sqlx::query("UPDATE users SET password_reset_expires = NOW() - INTERVAL '1 minute'")
        .execute(&pool)
        .await
        .unwrap();

    let response = server
        .patch(&format!("/api/v1/users/resetPassword/{token}"))
        .json(&json!({ "password": "newpass123", "passwordConfirm": "newpass123" }))
        .await;

    response.assert_status_bad_request();
}

#[sqlx::test]
async fn test_update_my_password(pool: PgPool) {
    let user = create_user(&pool, "Laura Wilson", "laura@example.io", Role::User).await;
    let token = token_for(user.id);
    let (server, _) = make_server(pool);

    let response = server
        .patch("/api/v1/users/updateMyPassword")
        .add_header("Authorization", bearer(&token))
        .json(&json!({
            "passwordCurrent": "not-my-password",
            "password": "newpass123",
            "passwordConfirm": "newpass123"
        }))
        .await;
    response.assert_status_unauthorized();
    let body: Value = response.json();
    assert_eq!(body["message"], "Your current password is wrong.");

    let response = server
        .patch("/api/v1/users/updateMyPassword")
        .add_header("Authorization", bearer(&token))
        .json(&json!({
            "passwordCurrent": TEST_PASSWORD,
            "password": "newpass123",
            "passwordConfirm": "newpass123"
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let fresh = body["token"].as_str().unwrap().to_string();
    assert!(body["data"]["user"]["passwordChangedAt"].is_string());

    let response = server
        .get("/api/v1/users/me")
        .add_header("Authorization", bearer(&fresh))
        .await;
    response.assert_status_ok();

    let response = server
        .post("/api/v1/users/login")
        .json(&json!({ "email": "laura@example.io", "password": "newpass123" }))
        .await;
    response.assert_status_ok();
}
