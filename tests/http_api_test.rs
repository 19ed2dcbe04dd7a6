mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{Blogs, init_tracing, seed_tagged, setup_blog_app, setup_test_db};
use listcrate::{ListResource, QueryParams};
use sea_orm::ConnectionTrait;
use serde_json::Value;
use tower::ServiceExt;

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Option<String>, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let content_range = response
        .headers()
        .get("Content-Range")
        .map(|value| value.to_str().unwrap().to_string());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, content_range, json)
}

async fn setup_app() -> axum::Router {
    let db = setup_test_db().await.expect("Failed to setup test database");
    seed_tagged(&db).await.expect("Failed to seed blogs");
    setup_blog_app(db)
}

#[tokio::test]
async fn test_list_returns_rows_and_meta() {
    let app = setup_app().await;
    let (status, content_range, body) = get(
        &app,
        "/api/v1/blogs?page=2&limit=5&sort=-createdAt&tags=a,b",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_range.as_deref(), Some("blogs 5-9/12"));
    assert_eq!(body["rows"].as_array().unwrap().len(), 5);
    assert_eq!(body["rows"][0]["title"], "Post 6");
    assert_eq!(body["meta"]["currentPage"], 2);
    assert_eq!(body["meta"]["itemsPerPage"], 5);
    assert_eq!(body["meta"]["totalItems"], 12);
    assert_eq!(body["meta"]["totalPages"], 3);
    assert_eq!(body["meta"]["itemCount"], 5);
    assert_eq!(body["meta"]["hasNextPage"], true);
    assert_eq!(body["meta"]["hasPrevPage"], true);
}

#[tokio::test]
async fn test_list_with_bracket_operators_in_query_string() {
    let app = setup_app().await;
    // [>=]200 percent-encoded
    let (status, _, body) = get(&app, "/api/v1/blogs?views=%5B%3E%3D%5D200&sort=views").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["totalItems"], 4);
    assert_eq!(body["rows"][0]["title"], "Other 20");
}

#[tokio::test]
async fn test_search_and_fields() {
    let app = setup_app().await;
    let (status, content_range, body) =
        get(&app, "/api/v1/blogs?q=POST%2011&fields=title,slug").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_range.as_deref(), Some("blogs 0-0/1"));
    let row = body["rows"][0].as_object().unwrap();
    assert_eq!(row["title"], "Post 11");
    assert_eq!(row["slug"], "post-11");
    assert!(row.contains_key("id"));
    assert!(row.contains_key("created_at"));
    assert!(!row.contains_key("content"));
}

#[tokio::test]
async fn test_no_matches_is_an_empty_page() {
    let app = setup_app().await;
    let (status, content_range, body) = get(&app, "/api/v1/blogs?q=hello&fields=title,slug").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_range.as_deref(), Some("blogs */0"));
    assert_eq!(body["rows"], serde_json::json!([]));
    assert_eq!(body["meta"]["totalItems"], 0);
    assert_eq!(body["meta"]["totalPages"], 1);
    assert_eq!(body["meta"]["itemCount"], 0);
}

#[tokio::test]
async fn test_hidden_fields_never_leak() {
    let app = setup_app().await;

    let (_, _, body) = get(&app, "/api/v1/blogs?limit=1").await;
    assert!(!body["rows"][0].as_object().unwrap().contains_key("internal_notes"));

    let (_, _, body) = get(&app, "/api/v1/blogs?fields=title,internalNotes").await;
    assert!(!body["rows"][0].as_object().unwrap().contains_key("internal_notes"));

    // filtering on a hidden column is ignored rather than used as an oracle
    let (_, _, body) = get(&app, "/api/v1/blogs?internalNotes=nope").await;
    assert_eq!(body["meta"]["totalItems"], 16);
}

#[tokio::test]
async fn test_garbage_input_still_answers() {
    let app = setup_app().await;
    let (status, _, body) = get(
        &app,
        "/api/v1/blogs?page=abc&limit=-3&sort=,,&views=%5Bbetween%5D1&nope=1&title%22=x",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["currentPage"], 1);
    assert_eq!(body["meta"]["itemsPerPage"], 1);
    assert_eq!(body["meta"]["totalItems"], 16);
}

#[tokio::test]
async fn test_database_error_is_sanitized() {
    init_tracing();
    let db = setup_test_db().await.unwrap();
    db.execute_unprepared("DROP TABLE blogs").await.unwrap();
    let app = setup_blog_app(db);

    let (status, content_range, body) = get(&app, "/api/v1/blogs").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(content_range.is_none());
    assert_eq!(body["error"], "A database error occurred");
    assert!(!body.to_string().contains("no such table"));
}

#[tokio::test]
async fn test_list_directly_sets_resource_name() {
    let db = setup_test_db().await.unwrap();
    seed_tagged(&db).await.unwrap();

    let page = Blogs::list(&db, QueryParams::new().with("tags", "c")).await.unwrap();
    assert_eq!(page.resource, Some("blogs"));
    assert_eq!(page.meta.total_items, 4);
}

#[test]
fn test_cache_key_is_stable() {
    let forward: QueryParams = serde_json::from_value(serde_json::json!({
        "page": "1",
        "tags": "a,b",
        "q": null
    }))
    .unwrap();
    let backward = QueryParams::new().with("tags", "a,b").with("page", "1");

    assert_eq!(Blogs::cache_key(&forward), Blogs::cache_key(&backward));
    assert!(Blogs::cache_key(&forward).starts_with("blogs_list_"));
}
