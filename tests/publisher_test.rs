//! Integration tests for the WordPress publisher using wiremock

use postgen::config::PublishConfig;
use postgen::models::NormalizedContent;
use postgen::publisher::{self, PublishError, Publisher, WordPressPublisher};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn content() -> NormalizedContent {
    NormalizedContent {
        title: "A Fine Post Title".to_string(),
        body: "Paragraph one.\n\nParagraph two.".to_string(),
        meta_description: "Paragraph one.".to_string(),
        tags: vec!["technology".to_string()],
        focus_keyword: "technology".to_string(),
        category: None,
    }
}

fn config(server: &MockServer) -> PublishConfig {
    PublishConfig {
        wordpress_url: server.uri(),
        wordpress_user: "bot".to_string(),
        wordpress_app_password: "secret".to_string(),
        ..PublishConfig::default()
    }
}

/// Existing terms are reused, the post is created with status "publish"
#[tokio::test]
async fn test_publish_with_existing_terms() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/categories"))
        .and(query_param("search", "Uncategorized"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Uncategorized" }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/tags"))
        .and(query_param("search", "technology"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 7, "name": "technology" }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(body_partial_json(json!({
            "title": "A Fine Post Title",
            "status": "publish",
            "categories": [1],
            "tags": [7],
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 123 })))
        .mount(&server)
        .await;

    let publisher_impl = WordPressPublisher::new(&config(&server)).unwrap();
    let draft = publisher::assemble(&content(), &config(&server), None, None);

    let document_id = publisher_impl.publish(&draft).await.unwrap();
    assert_eq!(document_id.0, "123");
}

/// Missing terms are created before the post
#[tokio::test]
async fn test_publish_creates_missing_terms() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/categories"))
        .and(body_partial_json(json!({ "name": "Uncategorized" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 9 })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/tags"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 11 })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(body_partial_json(json!({ "categories": [9], "tags": [11] })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 124 })))
        .mount(&server)
        .await;

    let publisher_impl = WordPressPublisher::new(&config(&server)).unwrap();
    let draft = publisher::assemble(&content(), &config(&server), None, None);

    let document_id = publisher_impl.publish(&draft).await.unwrap();
    assert_eq!(document_id.0, "124");
}

/// auto_publish=false produces a draft post
#[tokio::test]
async fn test_draft_status_when_auto_publish_disabled() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Uncategorized" }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 7, "name": "technology" }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(body_partial_json(json!({ "status": "draft" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 125 })))
        .mount(&server)
        .await;

    let mut cfg = config(&server);
    cfg.auto_publish = false;
    let publisher_impl = WordPressPublisher::new(&cfg).unwrap();
    let draft = publisher::assemble(&content(), &cfg, None, None);

    publisher_impl.publish(&draft).await.unwrap();
}

/// WordPress rejections surface status and message
#[tokio::test]
async fn test_rejection_classified() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/categories"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "rest_cannot_create",
            "message": "Sorry, you are not allowed to do that."
        })))
        .mount(&server)
        .await;

    let publisher_impl = WordPressPublisher::new(&config(&server)).unwrap();
    let draft = publisher::assemble(&content(), &config(&server), None, None);

    match publisher_impl.publish(&draft).await {
        Err(PublishError::Rejected { status, message }) => {
            assert_eq!(status, 401);
            assert!(message.contains("not allowed"));
        }
        other => panic!("unexpected: {other:?}"),
    }
}
