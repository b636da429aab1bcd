use mockito::Matcher;
use serde_json::json;

use kinabalu::application::ports::{Embedder, EmbedderError};
use kinabalu::infrastructure::auth::{AwsCredentials, SigV4Signer};
use kinabalu::infrastructure::llm::EndpointEmbedder;

fn embedder(server: &mockito::Server, signer: Option<SigV4Signer>) -> EndpointEmbedder {
    let url = format!("{}/endpoints/embed/invocations", server.url());
    EndpointEmbedder::new(reqwest::Client::new(), &url, signer).unwrap()
}

#[tokio::test]
async fn given_batch_when_embedding_then_posts_text_inputs_and_reads_vectors() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/endpoints/embed/invocations")
        .match_body(Matcher::Json(json!({ "text_inputs": ["first", "second"] })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"embedding": [[0.1, 0.2], [0.3, 0.4]]}"#)
        .create_async()
        .await;

    let embeddings = embedder(&server, None)
        .embed_batch(&["first", "second"])
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(embeddings.len(), 2);
    assert_eq!(embeddings[1].values, vec![0.3, 0.4]);
}

#[tokio::test]
async fn given_signer_when_embedding_then_request_carries_sigv4_authorization() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/endpoints/embed/invocations")
        .match_header(
            "authorization",
            Matcher::Regex(
                "^AWS4-HMAC-SHA256 Credential=AKID/\\d{8}/us-east-1/sagemaker/".to_string(),
            ),
        )
        .match_header("x-amz-date", Matcher::Any)
        .with_status(200)
        .with_body(r#"{"embedding": [[1.0]]}"#)
        .create_async()
        .await;
    let signer = SigV4Signer::new(
        AwsCredentials::new("AKID", "secret", None),
        "us-east-1",
        "sagemaker",
    );

    let embedding = embedder(&server, Some(signer)).embed("hello").await.unwrap();

    mock.assert_async().await;
    assert_eq!(embedding.values, vec![1.0]);
}

#[tokio::test]
async fn given_throttling_when_embedding_then_returns_rate_limited() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/endpoints/embed/invocations")
        .with_status(429)
        .create_async()
        .await;

    let result = embedder(&server, None).embed("hello").await;

    assert!(matches!(result, Err(EmbedderError::RateLimited)));
}

#[tokio::test]
async fn given_server_error_when_embedding_then_returns_api_failure() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/endpoints/embed/invocations")
        .with_status(500)
        .with_body("model crashed")
        .create_async()
        .await;

    let result = embedder(&server, None).embed("hello").await;

    assert!(matches!(
        result,
        Err(EmbedderError::ApiRequestFailed(msg)) if msg.contains("model crashed")
    ));
}

#[tokio::test]
async fn given_wrong_vector_count_when_embedding_then_returns_invalid_response() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/endpoints/embed/invocations")
        .with_status(200)
        .with_body(r#"{"embedding": [[0.1]]}"#)
        .create_async()
        .await;

    let result = embedder(&server, None).embed_batch(&["a", "b"]).await;

    assert!(matches!(result, Err(EmbedderError::InvalidResponse(_))));
}

#[test]
fn given_region_and_name_when_building_url_then_targets_sagemaker_runtime() {
    assert_eq!(
        EndpointEmbedder::sagemaker_url("eu-west-1", "gpt-j-embed"),
        "https://runtime.sagemaker.eu-west-1.amazonaws.com/endpoints/gpt-j-embed/invocations"
    );
}
