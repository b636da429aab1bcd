use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::application::ports::{RepositoryError, TenantRepository};
use crate::domain::{TenantId, TenantRecord};
use crate::infrastructure::auth::SigV4Signer;

const TARGET_PREFIX: &str = "DynamoDB_20120810";
const CONTENT_TYPE_JSON_1_0: &str = "application/x-amz-json-1.0";
const KEY_ATTRIBUTE: &str = "tenantId";
const CONDITIONAL_CHECK_FAILED: &str = "ConditionalCheckFailedException";

/// Tenant balances in a DynamoDB table keyed by `tenantId`, spoken to over
/// the JSON protocol with SigV4-signed requests.
pub struct DynamoTenantRepository {
    client: Client,
    endpoint: Url,
    table_name: String,
    signer: SigV4Signer,
}

#[derive(Deserialize)]
struct GetItemResponse {
    #[serde(rename = "Item")]
    item: Option<HashMap<String, AttributeValue>>,
}

#[derive(Deserialize)]
struct AttributeValue {
    #[serde(rename = "N")]
    n: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(rename = "__type")]
    error_type: String,
    #[serde(alias = "Message")]
    message: Option<String>,
}

impl DynamoTenantRepository {
    pub fn new(
        client: Client,
        endpoint: &str,
        table_name: impl Into<String>,
        signer: SigV4Signer,
    ) -> Result<Self, RepositoryError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| RepositoryError::ConnectionFailed(format!("invalid endpoint: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            table_name: table_name.into(),
            signer,
        })
    }

    pub fn regional_endpoint(region: &str) -> String {
        format!("https://dynamodb.{}.amazonaws.com", region)
    }

    async fn call(
        &self,
        operation: &str,
        body: serde_json::Value,
    ) -> Result<reqwest::Response, RepositoryError> {
        let payload =
            serde_json::to_vec(&body).map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header("x-amz-target", format!("{}.{}", TARGET_PREFIX, operation))
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON_1_0)
            .body(payload)
            .build()
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        self.signer
            .sign(&mut request)
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        self.client
            .execute(request)
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))
    }

    fn key(tenant_id: &TenantId) -> serde_json::Value {
        json!({ KEY_ATTRIBUTE: { "S": tenant_id.as_str() } })
    }
}

async fn error_from(response: reqwest::Response) -> ErrorResponse {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str(&body).unwrap_or(ErrorResponse {
        error_type: format!("HTTP {}", status),
        message: Some(body),
    })
}

#[async_trait]
impl TenantRepository for DynamoTenantRepository {
    #[instrument(skip(self), fields(table = %self.table_name, tenant_id = %tenant_id))]
    async fn get(&self, tenant_id: &TenantId) -> Result<Option<TenantRecord>, RepositoryError> {
        let response = self
            .call(
                "GetItem",
                json!({
                    "TableName": self.table_name,
                    "Key": Self::key(tenant_id),
                    "ConsistentRead": true,
                }),
            )
            .await?;

        if !response.status().is_success() {
            let error = error_from(response).await;
            return Err(RepositoryError::QueryFailed(format!(
                "{}: {}",
                error.error_type,
                error.message.unwrap_or_default()
            )));
        }

        let parsed: GetItemResponse = response
            .json()
            .await
            .map_err(|e| RepositoryError::MalformedRecord(e.to_string()))?;

        let Some(item) = parsed.item else {
            return Ok(None);
        };

        // A record without a tokens attribute has an empty balance.
        let tokens = match item.get("tokens").and_then(|v| v.n.as_deref()) {
            Some(n) => n
                .parse::<u64>()
                .map_err(|e| RepositoryError::MalformedRecord(format!("tokens {:?}: {}", n, e)))?,
            None => 0,
        };

        Ok(Some(TenantRecord::new(tenant_id.clone(), tokens)))
    }

    #[instrument(skip(self), fields(table = %self.table_name, tenant_id = %tenant_id))]
    async fn compare_and_swap(
        &self,
        tenant_id: &TenantId,
        expected: u64,
        new: u64,
    ) -> Result<bool, RepositoryError> {
        let condition = if expected == 0 {
            "attribute_exists(tenantId) AND (attribute_not_exists(tokens) OR tokens = :expected)"
        } else {
            "attribute_exists(tenantId) AND tokens = :expected"
        };

        let response = self
            .call(
                "UpdateItem",
                json!({
                    "TableName": self.table_name,
                    "Key": Self::key(tenant_id),
                    "UpdateExpression": "SET tokens = :next",
                    "ConditionExpression": condition,
                    "ExpressionAttributeValues": {
                        ":next": { "N": new.to_string() },
                        ":expected": { "N": expected.to_string() },
                    },
                    "ReturnValues": "UPDATED_NEW",
                }),
            )
            .await?;

        if response.status().is_success() {
            return Ok(true);
        }

        let error = error_from(response).await;
        if error.error_type.ends_with(CONDITIONAL_CHECK_FAILED) {
            return Ok(false);
        }

        Err(RepositoryError::QueryFailed(format!(
            "{}: {}",
            error.error_type,
            error.message.unwrap_or_default()
        )))
    }
}
