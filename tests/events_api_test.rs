mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use careerdesk::api::build_router;
use common::http::{body_json, get, json_request, FilePart};
use common::{app_state, harness_at, t0, Harness, MemoryFileStorage};
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower::ServiceExt;

fn app(h: &Harness) -> Router {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/careerdesk_unused")
        .unwrap();

    build_router(app_state(pool, h, Arc::new(MemoryFileStorage::default())))
}

fn multipart_request(
    method: &str,
    uri: &str,
    fields: &[(&str, &str)],
    image: Option<(&str, &[u8])>,
) -> Request<Body> {
    let file = image.map(|(file_name, bytes)| FilePart {
        field: "image",
        file_name,
        content_type: "image/png",
        bytes,
    });
    common::http::multipart_request(method, uri, fields, file)
}

#[tokio::test]
async fn test_create_event_from_json() {
    let h = harness_at(t0());

    let response = app(&h)
        .oneshot(json_request(
            "POST",
            "/api/events",
            json!({
                "title": "Job Fair",
                "description": "Meet 40 employers",
                "startDate": "2025-03-01T13:00:00Z",
                "endDate": "2025-03-01T18:00:00Z",
                "location": "Noida",
                "category": "Recruitment",
                "capacity": 300
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "upcoming");
    assert_eq!(body["data"]["capacity"], 300);
    assert_eq!(body["data"]["featured"], false);
}

#[tokio::test]
async fn test_create_event_from_multipart_with_image() {
    let h = harness_at(t0());

    let response = app(&h)
        .oneshot(multipart_request(
            "POST",
            "/api/events",
            &[
                ("title", "Walk-in Drive"),
                ("description", "Bring your resume"),
                ("startDate", "2025-03-01T10:00"),
                ("endDate", "2025-03-01T16:00"),
                ("location", "Delhi"),
                ("category", "Recruitment"),
                ("featured", "true"),
            ],
            Some(("banner.png", &b"\x89PNG"[..])),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "ongoing");
    assert_eq!(body["data"]["featured"], true);
    let image_url = body["data"]["imageUrl"].as_str().unwrap();
    assert!(h.files.contains(image_url));
}

#[tokio::test]
async fn test_create_event_missing_fields_is_bad_request() {
    let h = harness_at(t0());

    let response = app(&h)
        .oneshot(json_request("POST", "/api/events", json!({"title": "Only a title"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("required"));
}

#[tokio::test]
async fn test_update_restore_and_list() {
    let h = harness_at(t0());
    let app = app(&h);

    let created = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/events",
            json!({
                "title": "Webinar",
                "description": "Interview tips",
                "startDate": "2025-03-01T13:00:00Z",
                "endDate": "2025-03-01T14:00:00Z",
                "location": "Online",
                "category": "Webinar",
                "status": "cancelled"
            }),
        ))
        .await
        .unwrap();
    let id = body_json(created).await["data"]["id"].as_str().unwrap().to_string();

    h.clock.set(t0() + chrono::Duration::hours(3));

    let restored = app
        .clone()
        .oneshot(multipart_request(
            "PATCH",
            &format!("/api/events/{}", id),
            &[("status", "")],
            None,
        ))
        .await
        .unwrap();
    assert_eq!(restored.status(), StatusCode::OK);
    assert_eq!(body_json(restored).await["data"]["status"], "past");

    let listed = app
        .oneshot(get("/api/events?status=past&page=1&limit=5"))
        .await
        .unwrap();
    assert_eq!(listed.status(), StatusCode::OK);
    let body = body_json(listed).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["limit"], 5);
    assert_eq!(body["totalPages"], 1);
    assert_eq!(body["data"][0]["id"], id);
}

#[tokio::test]
async fn test_delete_unknown_event_is_not_found() {
    let h = harness_at(t0());

    let response = app(&h)
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/events/{}", uuid::Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bulk_with_no_ids_is_bad_request() {
    let h = harness_at(t0());

    let response = app(&h)
        .oneshot(json_request(
            "POST",
            "/api/events/bulk",
            json!({"action": "cancel", "ids": []}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(h.store.writes(), 0);
}

#[tokio::test]
async fn test_bad_query_value_is_json_error() {
    let h = harness_at(t0());

    let response = app(&h)
        .oneshot(get("/api/events?status=postponed"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()["content-type"], "application/json");
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("postponed"));
}

#[tokio::test]
async fn test_huge_page_is_bad_request() {
    let h = harness_at(t0());

    let response = app(&h)
        .oneshot(get(&format!("/api/events?page={}&limit=10", i64::MAX)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "page is out of range");
}
