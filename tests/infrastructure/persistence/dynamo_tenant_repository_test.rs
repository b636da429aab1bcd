use mockito::Matcher;
use serde_json::json;

use kinabalu::application::ports::{RepositoryError, TenantRepository};
use kinabalu::domain::TenantId;
use kinabalu::infrastructure::auth::{AwsCredentials, SigV4Signer};
use kinabalu::infrastructure::persistence::DynamoTenantRepository;

const GET_ITEM: &str = "DynamoDB_20120810.GetItem";
const UPDATE_ITEM: &str = "DynamoDB_20120810.UpdateItem";

fn repository(server: &mockito::Server) -> DynamoTenantRepository {
    let signer = SigV4Signer::new(
        AwsCredentials::new("AKID", "secret", None),
        "us-east-1",
        "dynamodb",
    );
    DynamoTenantRepository::new(reqwest::Client::new(), &server.url(), "tenant_management", signer)
        .unwrap()
}

fn acme() -> TenantId {
    TenantId::new("acme").unwrap()
}

#[tokio::test]
async fn given_stored_tenant_when_getting_then_reads_consistent_balance() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_header("x-amz-target", GET_ITEM)
        .match_header("authorization", Matcher::Regex("/dynamodb/aws4_request".to_string()))
        .match_body(Matcher::PartialJson(json!({
            "TableName": "tenant_management",
            "Key": { "tenantId": { "S": "acme" } },
            "ConsistentRead": true
        })))
        .with_status(200)
        .with_body(r#"{"Item": {"tenantId": {"S": "acme"}, "tokens": {"N": "100"}}}"#)
        .create_async()
        .await;

    let record = repository(&server).get(&acme()).await.unwrap().unwrap();

    mock.assert_async().await;
    assert_eq!(record.tokens, 100);
}

#[tokio::test]
async fn given_missing_item_when_getting_then_returns_none() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/")
        .match_header("x-amz-target", GET_ITEM)
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    assert!(repository(&server).get(&acme()).await.unwrap().is_none());
}

#[tokio::test]
async fn given_item_without_tokens_when_getting_then_balance_is_zero() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/")
        .match_header("x-amz-target", GET_ITEM)
        .with_status(200)
        .with_body(r#"{"Item": {"tenantId": {"S": "acme"}}}"#)
        .create_async()
        .await;

    let record = repository(&server).get(&acme()).await.unwrap().unwrap();

    assert_eq!(record.tokens, 0);
}

#[tokio::test]
async fn given_matching_balance_when_swapping_then_sends_conditional_update() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_header("x-amz-target", UPDATE_ITEM)
        .match_body(Matcher::PartialJson(json!({
            "ConditionExpression": "attribute_exists(tenantId) AND tokens = :expected",
            "ExpressionAttributeValues": {
                ":next": { "N": "40" },
                ":expected": { "N": "100" }
            }
        })))
        .with_status(200)
        .with_body(r#"{"Attributes": {"tokens": {"N": "40"}}}"#)
        .create_async()
        .await;

    let swapped = repository(&server)
        .compare_and_swap(&acme(), 100, 40)
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(swapped);
}

#[tokio::test]
async fn given_failed_condition_when_swapping_then_returns_false() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/")
        .match_header("x-amz-target", UPDATE_ITEM)
        .with_status(400)
        .with_body(
            r#"{"__type": "com.amazonaws.dynamodb.v20120810#ConditionalCheckFailedException", "message": "The conditional request failed"}"#,
        )
        .create_async()
        .await;

    let swapped = repository(&server)
        .compare_and_swap(&acme(), 100, 40)
        .await
        .unwrap();

    assert!(!swapped);
}

#[tokio::test]
async fn given_other_service_error_when_swapping_then_returns_query_failure() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/")
        .match_header("x-amz-target", UPDATE_ITEM)
        .with_status(400)
        .with_body(r#"{"__type": "com.amazonaws.dynamodb.v20120810#ResourceNotFoundException", "message": "no table"}"#)
        .create_async()
        .await;

    let result = repository(&server).compare_and_swap(&acme(), 100, 40).await;

    assert!(matches!(
        result,
        Err(RepositoryError::QueryFailed(msg)) if msg.contains("ResourceNotFound")
    ));
}
