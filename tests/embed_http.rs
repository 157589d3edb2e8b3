//! Wire-level tests for the HTTP embedding client against a mock endpoint.

use httpmock::prelude::*;
use serde_json::json;

use docferry::embed::{EmbeddingClient, EmbeddingConfig, HttpEmbeddingClient};
use docferry::types::FerryError;

fn client_for(server: &MockServer, width: usize, api_key: Option<&str>) -> HttpEmbeddingClient {
    HttpEmbeddingClient::new(EmbeddingConfig {
        base_url: server.url("/v1"),
        model: "titan-embed-text".to_string(),
        width,
        api_key: api_key.map(str::to_string),
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn posts_model_and_inputs_and_reorders_by_index() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/embeddings")
                .header("authorization", "Bearer test-key")
                .json_body(json!({
                    "model": "titan-embed-text",
                    "input": ["first", "second"],
                }));
            then.status(200).json_body(json!({
                "data": [
                    {"embedding": [0.0, 1.0, 0.0], "index": 1},
                    {"embedding": [1.0, 0.0, 0.0], "index": 0},
                ],
            }));
        })
        .await;

    let client = client_for(&server, 3, Some("test-key"));
    let vectors = client
        .embed(&["first".to_string(), "second".to_string()])
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(vectors.len(), 2);
    assert_eq!(vectors[0], vec![1.0, 0.0, 0.0], "entries resorted by index");
    assert_eq!(vectors[1], vec![0.0, 1.0, 0.0]);
}

#[tokio::test]
async fn server_errors_become_embedding_errors_with_the_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/embeddings");
            then.status(503).body("model overloaded");
        })
        .await;

    let client = client_for(&server, 3, None);
    let err = client.embed(&["text".to_string()]).await.unwrap_err();

    match err {
        FerryError::Embedding(message) => {
            assert!(message.contains("503"), "got: {message}");
            assert!(message.contains("model overloaded"), "got: {message}");
        }
        other => panic!("expected Embedding error, got {other:?}"),
    }
}

#[tokio::test]
async fn a_missing_vector_fails_the_whole_batch() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/embeddings");
            then.status(200).json_body(json!({
                "data": [{"embedding": [1.0, 0.0, 0.0], "index": 0}],
            }));
        })
        .await;

    let client = client_for(&server, 3, None);
    let err = client
        .embed(&["first".to_string(), "second".to_string()])
        .await
        .unwrap_err();

    match err {
        FerryError::Embedding(message) => {
            assert!(message.contains("1 vectors for 2 inputs"), "got: {message}");
        }
        other => panic!("expected Embedding error, got {other:?}"),
    }
}

#[tokio::test]
async fn an_unexpected_width_is_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/embeddings");
            then.status(200).json_body(json!({
                "data": [{"embedding": [1.0, 0.0], "index": 0}],
            }));
        })
        .await;

    let client = client_for(&server, 3, None);
    let err = client.embed(&["text".to_string()]).await.unwrap_err();

    match err {
        FerryError::Embedding(message) => {
            assert!(message.contains("width 2"), "got: {message}");
        }
        other => panic!("expected Embedding error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_response_bodies_are_embedding_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/embeddings");
            then.status(200).body("not json at all");
        })
        .await;

    let client = client_for(&server, 3, None);
    let err = client.embed(&["text".to_string()]).await.unwrap_err();
    assert!(matches!(err, FerryError::Embedding(_)));
}

#[tokio::test]
async fn an_empty_batch_never_calls_the_endpoint() {
    // No mock is registered: any request to the server would 404 and the
    // 404 would surface as an error below.
    let server = MockServer::start_async().await;
    let client = client_for(&server, 3, None);

    let vectors = client.embed(&[]).await.unwrap();
    assert!(vectors.is_empty());
}

#[tokio::test]
async fn trailing_slash_in_the_base_url_is_tolerated() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/embeddings");
            then.status(200).json_body(json!({
                "data": [{"embedding": [0.5, 0.5, 0.5], "index": 0}],
            }));
        })
        .await;

    let client = HttpEmbeddingClient::new(EmbeddingConfig {
        base_url: format!("{}/", server.url("/v1")),
        model: "titan-embed-text".to_string(),
        width: 3,
        api_key: None,
        timeout_secs: 5,
    })
    .unwrap();

    client.embed(&["text".to_string()]).await.unwrap();
    mock.assert_async().await;
}
