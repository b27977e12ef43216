//! Integration tests for FirestoreCacheStore using wiremock.

use uvmap_uv::{CacheStore, Coordinates, FirestoreCacheStore, ReadingRecord, StoreError};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DOCS: &str = "/v1/projects/demo/databases/(default)/documents";

fn store_for(server: &MockServer) -> FirestoreCacheStore {
    FirestoreCacheStore::new(&format!("{}{}", server.uri(), DOCS), "uvData", None).unwrap()
}

fn document(id: &str, uv: serde_json::Value, comment: Option<&str>) -> serde_json::Value {
    let mut fields = serde_json::json!({
        "uv": uv,
        "timestamp": { "integerValue": "1728000000000" },
        "dateString": { "stringValue": "4/10/2024, 0:00:00" },
        "lat": { "doubleValue": -27.376139 },
        "lng": { "doubleValue": -70.323444 }
    });
    if let Some(comment) = comment {
        fields["comment"] = serde_json::json!({ "stringValue": comment });
    }
    serde_json::json!({
        "name": format!("projects/demo/databases/(default)/documents/uvData/{}", id),
        "fields": fields,
        "createTime": "2024-10-04T00:00:00Z",
        "updateTime": "2024-10-04T00:00:00Z"
    })
}

#[tokio::test]
async fn test_get_existing_document() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{}/uvData/k1", DOCS)))
        .respond_with(ResponseTemplate::new(200).set_body_json(document(
            "k1",
            serde_json::json!({ "doubleValue": 7.5 }),
            Some("despejado"),
        )))
        .mount(&server)
        .await;

    let record = store_for(&server).get("k1").await.unwrap().unwrap();

    assert_eq!(record.uv, 7.5);
    assert_eq!(record.captured_at_ms, 1_728_000_000_000);
    assert_eq!(record.lat, -27.376139);
    assert_eq!(record.comment.as_deref(), Some("despejado"));
}

#[tokio::test]
async fn test_get_missing_document_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{}/uvData/missing", DOCS)))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": { "code": 404, "status": "NOT_FOUND" }
        })))
        .mount(&server)
        .await;

    assert!(store_for(&server).get("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_server_error_is_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = store_for(&server).get("k1").await;
    assert!(matches!(result, Err(StoreError::Unavailable(_))));
}

#[tokio::test]
async fn test_put_patches_typed_fields() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path(format!("{}/uvData/-27.376139--70.323444-160000", DOCS)))
        .and(body_partial_json(serde_json::json!({
            "fields": {
                "uv": { "doubleValue": 7.5 },
                "timestamp": { "integerValue": "1728000000000" },
                "comment": { "stringValue": "nota" }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let record = ReadingRecord::new(7.5, Coordinates::new(-27.376139, -70.323444), 1_728_000_000_000)
        .with_comment("nota");
    store_for(&server)
        .put("-27.376139--70.323444-160000", &record)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_missing_document_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(format!("{}/uvData/gone", DOCS)))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    store_for(&server).delete("gone").await.unwrap();
}

#[tokio::test]
async fn test_list_follows_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{}/uvData", DOCS)))
        .and(query_param("pageToken", "next"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "documents": [document("b", serde_json::json!({ "integerValue": "3" }), None)]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{}/uvData", DOCS)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "documents": [document("a", serde_json::json!({ "doubleValue": 1.5 }), Some("x"))],
            "nextPageToken": "next"
        })))
        .mount(&server)
        .await;

    let mut all = store_for(&server).list_all().await.unwrap();
    all.sort_by(|a, b| a.id.cmp(&b.id));

    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, "a");
    assert_eq!(all[0].record.comment.as_deref(), Some("x"));
    assert_eq!(all[1].id, "b");
    assert_eq!(all[1].record.uv, 3.0);
}

#[tokio::test]
async fn test_api_key_is_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{}/uvData/k1", DOCS)))
        .and(query_param("key", "web-key"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let store = FirestoreCacheStore::new(
        &format!("{}{}", server.uri(), DOCS),
        "uvData",
        Some("web-key".to_string()),
    )
    .unwrap();
    assert!(store.get("k1").await.unwrap().is_none());
}
