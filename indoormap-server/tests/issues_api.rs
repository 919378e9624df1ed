//! Indoor issue endpoints against the in-memory store

mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use indoormap_server::db::MemoryStore;
use serde_json::json;

use common::{app, body_json, body_text, delete, get, json, multipart, send};

const REPORT: &[(&str, &str)] = &[
    ("location", "Hall B, level 2"),
    ("latitude", "43.6577"),
    ("longitude", "-79.3788"),
    ("description", "Water on the floor"),
    ("status", "open"),
    ("datetimeOpen", "2024-03-01T09:30:00Z"),
];

async fn create_issue(store: &Arc<MemoryStore>) -> i64 {
    let (status, body) = body_json(
        send(
            app(store.clone()),
            multipart("/app/indoorIssue/add", REPORT, None),
        )
        .await,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["issueId"].as_i64().unwrap()
}

#[tokio::test]
async fn add_with_image_stores_one_image_row() {
    let store = Arc::new(MemoryStore::new());

    let (status, body) = body_json(
        send(
            app(store.clone()),
            multipart("/app/indoorIssue/add", REPORT, Some(b"\xff\xd8\xff\xe0")),
        )
        .await,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully added indoor issue");
    assert_eq!(body["data"]["location"], "Hall B, level 2");
    assert_eq!(body["data"]["latitude"], 43.6577);
    assert_eq!(body["data"]["votes"], 0);

    let id = body["data"]["issueId"].as_i64().unwrap() as i32;
    let images = store.images_for(id).await;
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].issue_id, id);
    assert_eq!(images[0].image, "/9j/4A==");
}

#[tokio::test]
async fn add_without_image_stores_no_image_row() {
    let store = Arc::new(MemoryStore::new());

    let id = create_issue(&store).await as i32;

    assert_eq!(store.issue_count().await, 1);
    assert!(store.images_for(id).await.is_empty());
}

#[tokio::test]
async fn failed_image_insert_leaves_no_issue() {
    let store = Arc::new(MemoryStore::new());
    store.set_fail_image_inserts(true);

    let (status, body) = body_json(
        send(
            app(store.clone()),
            multipart("/app/indoorIssue/add", REPORT, Some(b"jpeg")),
        )
        .await,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");
    assert_eq!(store.issue_count().await, 0);

    let (_, all) = body_json(send(app(store), get("/app/indoorIssue/all")).await).await;
    assert!(all.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn text_image_field_is_not_an_upload() {
    let store = Arc::new(MemoryStore::new());

    let (status, body) = body_json(
        send(
            app(store.clone()),
            multipart(
                "/app/indoorIssue/add",
                &[("location", "Lobby"), ("image", "not-a-file")],
                None,
            ),
        )
        .await,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let id = body["data"]["issueId"].as_i64().unwrap() as i32;
    assert!(store.images_for(id).await.is_empty());
}

#[tokio::test]
async fn add_accepts_date_only_value() {
    let store = Arc::new(MemoryStore::new());

    let (status, body) = body_json(
        send(
            app(store),
            multipart(
                "/app/indoorIssue/add",
                &[("location", "Lobby"), ("datetimeOpen", "2024-03-02")],
                None,
            ),
        )
        .await,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["datetimeOpen"], "2024-03-02T00:00:00Z");
}

#[tokio::test]
async fn add_rejects_non_numeric_latitude() {
    let store = Arc::new(MemoryStore::new());

    let (status, body) = body_json(
        send(
            app(store.clone()),
            multipart(
                "/app/indoorIssue/add",
                &[("location", "Lobby"), ("latitude", "north")],
                None,
            ),
        )
        .await,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid latitude value: 'north'");
    assert_eq!(store.issue_count().await, 0);
}

#[tokio::test]
async fn add_requires_multipart_body() {
    let store = Arc::new(MemoryStore::new());

    let response = send(
        app(store.clone()),
        json(Method::POST, "/app/indoorIssue/add", &json!({"location": "Lobby"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.issue_count().await, 0);
}

#[tokio::test]
async fn get_missing_issue_is_plain_text_404() {
    let store = Arc::new(MemoryStore::new());

    let (status, text) = body_text(send(app(store), get("/app/indoorIssue/77")).await).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(text, "Issue not found");
}

#[tokio::test]
async fn non_integer_id_is_bad_request() {
    let store = Arc::new(MemoryStore::new());

    let (status, body) = body_json(send(app(store), get("/app/indoorIssue/abc")).await).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "id: must be an integer");
}

#[tokio::test]
async fn update_changes_only_supplied_fields() {
    let store = Arc::new(MemoryStore::new());
    let id = create_issue(&store).await;

    let (status, body) = body_json(
        send(
            app(store.clone()),
            json(
                Method::PATCH,
                &format!("/app/indoorIssue/update/{id}"),
                &json!({"status": "closed"}),
            ),
        )
        .await,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully updated indoor issue");
    assert_eq!(body["data"]["status"], "closed");
    assert_eq!(body["data"]["location"], "Hall B, level 2");
    assert_eq!(body["data"]["description"], "Water on the floor");

    let (_, fetched) =
        body_json(send(app(store), get(&format!("/app/indoorIssue/{id}"))).await).await;
    assert_eq!(fetched, body["data"]);
}

#[tokio::test]
async fn update_accepts_zone_less_datetime() {
    let store = Arc::new(MemoryStore::new());
    let id = create_issue(&store).await;

    let (status, body) = body_json(
        send(
            app(store),
            json(
                Method::PATCH,
                &format!("/app/indoorIssue/update/{id}"),
                &json!({"datetimeClosed": "2024-03-02T10:15"}),
            ),
        )
        .await,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["datetimeClosed"], "2024-03-02T10:15:00Z");
    assert_eq!(body["data"]["datetimeOpen"], "2024-03-01T09:30:00Z");
}

#[tokio::test]
async fn update_missing_issue_is_404_and_changes_nothing() {
    let store = Arc::new(MemoryStore::new());
    let id = create_issue(&store).await;

    let (status, body) = body_json(
        send(
            app(store.clone()),
            json(
                Method::PATCH,
                &format!("/app/indoorIssue/update/{}", id + 100),
                &json!({"status": "closed"}),
            ),
        )
        .await,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"message": "Indoor issue not found"}));

    let (_, all) = body_json(send(app(store), get("/app/indoorIssue/all")).await).await;
    assert_eq!(all.as_array().unwrap().len(), 1);
    assert_eq!(all[0]["status"], "open");
}

#[tokio::test]
async fn update_rejects_unknown_and_empty_attributes() {
    let store = Arc::new(MemoryStore::new());
    let id = create_issue(&store).await;
    let uri = format!("/app/indoorIssue/update/{id}");

    let unknown = send(
        app(store.clone()),
        json(Method::PATCH, &uri, &json!({"issue_id; DROP TABLE issues": 1})),
    )
    .await;
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);

    let (status, body) =
        body_json(send(app(store), json(Method::PATCH, &uri, &json!({}))).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "update attributes cannot be empty");
}

#[tokio::test]
async fn filtered_returns_duplicates_for_multiple_matches() {
    let store = Arc::new(MemoryStore::new());
    let flooded = create_issue(&store).await as i32;
    let other = create_issue(&store).await as i32;
    store.tag_issue(flooded, "flood").await;
    store.tag_issue(flooded, "fire").await;
    store.tag_issue(other, "elevator").await;

    let (status, body) = body_json(
        send(
            app(store),
            json(
                Method::POST,
                "/app/indoorIssue/filtered",
                &json!({"category": ["flood", "fire"]}),
            ),
        )
        .await,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row["issueId"] == flooded));
}

#[tokio::test]
async fn filtered_rejects_empty_category_list() {
    let store = Arc::new(MemoryStore::new());

    let (status, body) = body_json(
        send(
            app(store),
            json(
                Method::POST,
                "/app/indoorIssue/filtered",
                &json!({"category": []}),
            ),
        )
        .await,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "category cannot be empty");
}

#[tokio::test]
async fn delete_removes_issue_and_its_image() {
    let store = Arc::new(MemoryStore::new());
    let (_, created) = body_json(
        send(
            app(store.clone()),
            multipart("/app/indoorIssue/add", REPORT, Some(b"jpeg")),
        )
        .await,
    )
    .await;
    let id = created["data"]["issueId"].as_i64().unwrap();

    let (status, body) = body_json(
        send(
            app(store.clone()),
            delete(&format!("/app/indoorIssue/delete/{id}")),
        )
        .await,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully deleted indoor issue");
    assert_eq!(body["data"]["issueId"], id);
    assert!(store.images_for(id as i32).await.is_empty());

    let (status, _) =
        body_text(send(app(store), get(&format!("/app/indoorIssue/{id}"))).await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_missing_issue_echoes_id() {
    let store = Arc::new(MemoryStore::new());

    let (status, body) =
        body_json(send(app(store), delete("/app/indoorIssue/delete/9")).await).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"message": "Indoor issue not found", "id": 9}));
}
