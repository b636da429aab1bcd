use mockito::Matcher;

use kinabalu::application::ports::{Embedder, EmbedderError};
use kinabalu::infrastructure::llm::OpenAiEmbedder;

fn embedder(server: &mockito::Server) -> OpenAiEmbedder {
    OpenAiEmbedder::new(
        reqwest::Client::new(),
        "sk-test".to_string(),
        "text-embedding-3-small".to_string(),
    )
    .with_base_url(server.url())
}

#[tokio::test]
async fn given_out_of_order_results_when_embedding_then_restores_input_order() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/embeddings")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::PartialJsonString(
            r#"{"model": "text-embedding-3-small"}"#.to_string(),
        ))
        .with_status(200)
        .with_body(
            r#"{"data": [
                {"index": 1, "embedding": [2.0]},
                {"index": 0, "embedding": [1.0]}
            ]}"#,
        )
        .create_async()
        .await;

    let embeddings = embedder(&server).embed_batch(&["a", "b"]).await.unwrap();

    mock.assert_async().await;
    assert_eq!(embeddings[0].values, vec![1.0]);
    assert_eq!(embeddings[1].values, vec![2.0]);
}

#[tokio::test]
async fn given_invalid_api_key_when_embedding_then_returns_api_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/embeddings")
        .with_status(401)
        .with_body(r#"{"error": "invalid key"}"#)
        .create_async()
        .await;

    let result = embedder(&server).embed("test text").await;

    assert!(matches!(result, Err(EmbedderError::ApiRequestFailed(_))));
}
