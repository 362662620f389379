//! Admin user endpoints against a real database.
//!
//! Run with `DATABASE_URL` pointing at a disposable Postgres server:
//! `cargo test -- --ignored`

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use commerce_api_server::{
    app, middleware::auth::API_TOKEN_HEADER, services::user_service::hash_api_token,
};
use common::{empty_request, json_request, seed_admin, seed_user, send};

#[sqlx::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn partial_update_only_touches_provided_fields(pool: PgPool) {
    seed_admin(&pool).await;
    let user_id = seed_user(&pool, "a@example.com", "A", "B").await;

    let (status, body) = send(
        app(pool.clone()),
        json_request(
            "POST",
            &format!("/admin/users/{user_id}"),
            &json!({ "first_name": "Marcellus" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["first_name"], "Marcellus");
    assert_eq!(body["user"]["last_name"], "B");
    assert_eq!(body["user"]["role"], "member");
    assert_eq!(body["user"]["metadata"], json!({ "team": "ops", "legacy": true }));
}

#[sqlx::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn metadata_merges_and_empty_values_delete_keys(pool: PgPool) {
    seed_admin(&pool).await;
    let user_id = seed_user(&pool, "a@example.com", "A", "B").await;

    let (status, body) = send(
        app(pool.clone()),
        json_request(
            "POST",
            &format!("/admin/users/{user_id}"),
            &json!({ "metadata": { "legacy": "", "region": "eu" } }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["metadata"], json!({ "team": "ops", "region": "eu" }));
}

#[sqlx::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn invalid_role_leaves_user_unchanged(pool: PgPool) {
    seed_admin(&pool).await;
    let user_id = seed_user(&pool, "a@example.com", "A", "B").await;

    let (status, _) = send(
        app(pool.clone()),
        json_request(
            "POST",
            &format!("/admin/users/{user_id}"),
            &json!({ "first_name": "Changed", "role": "owner" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (first_name, role): (String, String) =
        sqlx::query_as("SELECT first_name, role FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(first_name, "A");
    assert_eq!(role, "member");
}

#[sqlx::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn api_token_is_stored_hashed_and_hidden(pool: PgPool) {
    seed_admin(&pool).await;
    let user_id = seed_user(&pool, "a@example.com", "A", "B").await;

    let (status, body) = send(
        app(pool.clone()),
        json_request(
            "POST",
            &format!("/admin/users/{user_id}"),
            &json!({ "api_token": "fresh-token" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["has_api_token"], true);
    assert!(body["user"].get("api_token").is_none());

    let stored: Option<String> = sqlx::query_scalar("SELECT api_token_hash FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, Some(hash_api_token("fresh-token")));
}

#[sqlx::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn reusing_another_users_token_conflicts(pool: PgPool) {
    seed_admin(&pool).await;
    let user_id = seed_user(&pool, "a@example.com", "A", "B").await;

    let (status, body) = send(
        app(pool.clone()),
        json_request(
            "POST",
            &format!("/admin/users/{user_id}"),
            &json!({ "api_token": common::ADMIN_TOKEN }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "invalid_state");
}

#[sqlx::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn unknown_or_deleted_user_is_not_found(pool: PgPool) {
    seed_admin(&pool).await;
    let deleted_id = seed_user(&pool, "gone@example.com", "Gone", "User").await;
    sqlx::query("UPDATE users SET deleted_at = NOW() WHERE id = $1")
        .bind(deleted_id)
        .execute(&pool)
        .await
        .unwrap();

    for user_id in [Uuid::new_v4(), deleted_id] {
        let (status, body) = send(
            app(pool.clone()),
            json_request(
                "POST",
                &format!("/admin/users/{user_id}"),
                &json!({ "first_name": "X" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");
    }
}

#[sqlx::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn concurrent_updates_of_disjoint_fields_both_survive(pool: PgPool) {
    seed_admin(&pool).await;
    let user_id = seed_user(&pool, "a@example.com", "A", "B").await;
    let uri = format!("/admin/users/{user_id}");

    let first = send(
        app(pool.clone()),
        json_request("POST", &uri, &json!({ "first_name": "First" })),
    );
    let last = send(
        app(pool.clone()),
        json_request("POST", &uri, &json!({ "last_name": "Last" })),
    );
    let ((first_status, _), (last_status, _)) = tokio::join!(first, last);
    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(last_status, StatusCode::OK);

    let (status, body) = send(app(pool.clone()), empty_request("GET", &uri)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["first_name"], "First");
    assert_eq!(body["user"]["last_name"], "Last");
}

#[sqlx::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn unknown_token_is_unauthorized(pool: PgPool) {
    let user_id = seed_user(&pool, "a@example.com", "A", "B").await;

    // No admin seeded, so the bearer token matches nobody
    let (status, _) = send(
        app(pool.clone()),
        empty_request("GET", &format!("/admin/users/{user_id}")),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn assigned_token_authenticates_its_owner(pool: PgPool) {
    seed_admin(&pool).await;
    let user_id = seed_user(&pool, "a@example.com", "A", "B").await;
    let uri = format!("/admin/users/{user_id}");

    let (status, _) = send(
        app(pool.clone()),
        json_request("POST", &uri, &json!({ "api_token": "member-token" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let request = Request::builder()
        .method("GET")
        .uri(&uri)
        .header(API_TOKEN_HEADER, "member-token")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(pool.clone()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user_id.to_string());
}

#[sqlx::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn padded_token_is_rejected_and_not_stored(pool: PgPool) {
    seed_admin(&pool).await;
    let user_id = seed_user(&pool, "a@example.com", "A", "B").await;

    let (status, body) = send(
        app(pool.clone()),
        json_request(
            "POST",
            &format!("/admin/users/{user_id}"),
            &json!({ "api_token": " padded " }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["fields"]["api_token"][0]["code"], "invalid_api_token");

    let stored: Option<String> = sqlx::query_scalar("SELECT api_token_hash FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, None);
}

#[sqlx::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn token_of_a_deleted_user_can_be_reassigned(pool: PgPool) {
    seed_admin(&pool).await;
    let former = seed_user(&pool, "former@example.com", "F", "U").await;
    sqlx::query("UPDATE users SET api_token_hash = $1, deleted_at = NOW() WHERE id = $2")
        .bind(hash_api_token("recycled-token"))
        .bind(former)
        .execute(&pool)
        .await
        .unwrap();
    let user_id = seed_user(&pool, "a@example.com", "A", "B").await;

    let (status, body) = send(
        app(pool.clone()),
        json_request(
            "POST",
            &format!("/admin/users/{user_id}"),
            &json!({ "api_token": "recycled-token" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["has_api_token"], true);
}
