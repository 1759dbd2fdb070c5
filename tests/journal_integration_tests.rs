use axum::http::StatusCode;
use sqlx::{Pool, Postgres};
use tower::ServiceExt;
use uuid::Uuid;

mod common;

#[sqlx::test]
async fn test_create_and_list_journal(pool: Pool<Postgres>) {
    let app = common::spawn_app(pool).await;
    let token = common::get_auth_token(&app.router, "journal@example.com").await;

    let response = app
        .router
        .clone()
        .oneshot(common::authed_json_request(
            "POST",
            "/api/v1/journal/create",
            &token,
            serde_json::json!({"content": "  Grateful for small things  "}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = common::body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["journal"]["content"], "Grateful for small things");
    assert!(body["journal"]["createdAt"].is_string());

    let response = app
        .router
        .clone()
        .oneshot(common::authed_request(
            "GET",
            "/api/v1/journal/entries",
            &token,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    let journals = body["journals"].as_array().unwrap();
    assert_eq!(journals.len(), 1);
    // The journal surface exposes only the text and its timestamp.
    let entry = journals[0].as_object().unwrap();
    assert_eq!(entry.len(), 2);
    assert!(entry.contains_key("content"));
    assert!(entry.contains_key("createdAt"));
}

#[sqlx::test]
async fn test_empty_content_rejected(pool: Pool<Postgres>) {
    let app = common::spawn_app(pool).await;
    let token = common::get_auth_token(&app.router, "journal-empty@example.com").await;

    for payload in [
        serde_json::json!({"content": ""}),
        serde_json::json!({"content": "   \n\t "}),
    ] {
        let response = app
            .router
            .clone()
            .oneshot(common::authed_json_request(
                "POST",
                "/api/v1/journal/create",
                &token,
                payload,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = common::body_json(response).await;
        assert_eq!(body["message"], "Journal content is required");
    }
}

#[sqlx::test]
async fn test_entries_sorted_newest_first(pool: Pool<Postgres>) {
    let app = common::spawn_app(pool).await;
    let token = common::get_auth_token(&app.router, "journal-sort@example.com").await;
    let user_id = common::user_id_for(&token);

    for (content, days_ago) in [("oldest", 5), ("middle", 3), ("newest", 1)] {
        sqlx::query(
            "INSERT INTO journal_entries (id, owner, content, created_at) VALUES ($1, $2, $3, now() - make_interval(days => $4))",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(content)
        .bind(days_ago)
        .execute(&app.db)
        .await
        .unwrap();
    }

    let response = app
        .router
        .clone()
        .oneshot(common::authed_request(
            "GET",
            "/api/v1/journal/entries",
            &token,
        ))
        .await
        .unwrap();

    let body = common::body_json(response).await;
    let contents: Vec<&str> = body["journals"]
        .as_array()
        .unwrap()
        .iter()
        .map(|j| j["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["newest", "middle", "oldest"]);
}

#[sqlx::test]
async fn test_journal_requires_auth(pool: Pool<Postgres>) {
    let app = common::spawn_app(pool).await;

    let response = app
        .router
        .oneshot(common::json_request(
            "POST",
            "/api/v1/journal/create",
            serde_json::json!({"content": "c"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
