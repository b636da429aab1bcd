use futures::StreamExt;
use mockito::Matcher;
use serde_json::json;

use kinabalu::application::ports::{InferenceClient, InferenceClientError};
use kinabalu::infrastructure::llm::{GenerationParameters, HttpInferenceClient};

fn parameters() -> GenerationParameters {
    GenerationParameters {
        do_sample: true,
        max_new_tokens: 200,
        temperature: None,
        typical_p: 0.2,
        seed: 1,
    }
}

#[tokio::test]
async fn given_prompt_when_generating_then_posts_inputs_with_parameters() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/generate")
        .match_body(Matcher::PartialJson(json!({
            "inputs": "question: hi",
            "parameters": { "do_sample": true, "max_new_tokens": 200, "seed": 1 }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"generated_text": "hello there"}"#)
        .create_async()
        .await;
    let client = HttpInferenceClient::new(reqwest::Client::new(), &server.url(), parameters());

    let answer = client.generate("question: hi").await.unwrap();

    mock.assert_async().await;
    assert_eq!(answer, "hello there");
}

#[tokio::test]
async fn given_trailing_slash_in_url_when_generating_then_still_hits_generate() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/generate")
        .with_status(200)
        .with_body(r#"{"generated_text": "ok"}"#)
        .create_async()
        .await;
    let url = format!("{}/", server.url());
    let client = HttpInferenceClient::new(reqwest::Client::new(), &url, parameters());

    client.generate("prompt").await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn given_overloaded_server_when_generating_then_returns_rate_limited() {
    let mut server = mockito::Server::new_async().await;
    server.mock("POST", "/generate").with_status(429).create_async().await;
    let client = HttpInferenceClient::new(reqwest::Client::new(), &server.url(), parameters());

    let result = client.generate("prompt").await;

    assert!(matches!(result, Err(InferenceClientError::RateLimited)));
}

#[tokio::test]
async fn given_unexpected_body_when_generating_then_returns_invalid_response() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/generate")
        .with_status(200)
        .with_body(r#"{"token": "partial"}"#)
        .create_async()
        .await;
    let client = HttpInferenceClient::new(reqwest::Client::new(), &server.url(), parameters());

    let result = client.generate("prompt").await;

    assert!(matches!(result, Err(InferenceClientError::InvalidResponse(_))));
}

#[test]
fn given_no_temperature_when_serializing_parameters_then_field_is_omitted() {
    let value = serde_json::to_value(parameters()).unwrap();
    assert!(value.get("temperature").is_none());
    assert_eq!(value["typical_p"].as_f64().map(|v| (v * 10.0).round()), Some(2.0));
}

fn sse_token(text: &str, special: bool) -> String {
    format!(
        "data:{}\n\n",
        json!({
            "index": 1,
            "token": { "id": 7, "text": text, "logprob": -0.1, "special": special },
            "generated_text": null,
            "details": null
        })
    )
}

#[tokio::test]
async fn given_sse_frames_when_streaming_then_yields_token_texts_in_order() {
    let mut server = mockito::Server::new_async().await;
    let body = format!(
        "{}{}: keep-alive\n\n{}{}",
        sse_token("The", false),
        sse_token(" sky", false),
        sse_token(" is blue", false),
        sse_token("</s>", true),
    );
    let mock = server
        .mock("POST", "/generate_stream")
        .match_body(Matcher::PartialJson(json!({
            "inputs": "question: sky?",
            "parameters": { "max_new_tokens": 200 }
        })))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await;
    let client = HttpInferenceClient::new(reqwest::Client::new(), &server.url(), parameters());

    let tokens: Vec<String> = client
        .generate_stream("question: sky?")
        .await
        .unwrap()
        .map(|token| token.unwrap())
        .collect()
        .await;

    mock.assert_async().await;
    assert_eq!(tokens, vec!["The", " sky", " is blue"]);
}

#[tokio::test]
async fn given_error_frame_when_streaming_then_yields_request_failure() {
    let mut server = mockito::Server::new_async().await;
    let body = format!(
        "{}data:{}\n\n",
        sse_token("The", false),
        json!({ "error": "Request failed during generation", "error_type": "generation" })
    );
    server
        .mock("POST", "/generate_stream")
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;
    let client = HttpInferenceClient::new(reqwest::Client::new(), &server.url(), parameters());

    let items: Vec<_> = client.generate_stream("prompt").await.unwrap().collect().await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_deref().unwrap(), "The");
    assert!(matches!(
        &items[1],
        Err(InferenceClientError::ApiRequestFailed(msg)) if msg.contains("during generation")
    ));
}

#[tokio::test]
async fn given_overloaded_server_when_streaming_then_fails_before_any_token() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/generate_stream")
        .with_status(429)
        .create_async()
        .await;
    let client = HttpInferenceClient::new(reqwest::Client::new(), &server.url(), parameters());

    let result = client.generate_stream("prompt").await;

    assert!(matches!(result, Err(InferenceClientError::RateLimited)));
}
