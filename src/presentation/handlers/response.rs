use std::collections::BTreeMap;
use std::fmt;

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::ports::{ObjectSourceError, RepositoryError};
use crate::application::services::{AnswerError, IndexerError, IngestionError, QuotaError};
use crate::domain::TenantIdError;
use crate::presentation::config::ErrorStatusPolicy;

/// Gateway-style response: status, headers and a JSON-encoded body string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidBalance,
    Contention,
    BadRequest,
    ExternalCallFailure,
    Internal,
}

impl ErrorKind {
    pub fn status(self, policy: ErrorStatusPolicy) -> StatusCode {
        if policy == ErrorStatusPolicy::Fixed {
            return StatusCode::PAYMENT_REQUIRED;
        }

        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidBalance => StatusCode::PAYMENT_REQUIRED,
            ErrorKind::Contention => StatusCode::CONFLICT,
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::ExternalCallFailure => StatusCode::BAD_GATEWAY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn json_headers() -> BTreeMap<String, String> {
    BTreeMap::from([("Content-Type".to_string(), "application/json".to_string())])
}

pub fn build_response<T: Serialize>(body: &T, code: StatusCode) -> ResponseEnvelope {
    match serde_json::to_string(body) {
        Ok(body) => ResponseEnvelope {
            status_code: code.as_u16(),
            headers: json_headers(),
            body,
        },
        Err(e) => {
            tracing::error!(error = %e, "response_serialization_failed");
            build_error_response(
                "failed to serialize response",
                ErrorKind::Internal,
                ErrorStatusPolicy::Mapped,
            )
        }
    }
}

pub fn build_error_response(
    message: impl fmt::Display,
    kind: ErrorKind,
    policy: ErrorStatusPolicy,
) -> ResponseEnvelope {
    let message = message.to_string();
    let body = serde_json::to_string(&ErrorBody { error: &message })
        .unwrap_or_else(|_| r#"{"error":"internal error"}"#.to_string());

    ResponseEnvelope {
        status_code: kind.status(policy).as_u16(),
        headers: json_headers(),
        body,
    }
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            match (
                HeaderName::try_from(name.as_str()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "skipping invalid response header"),
            }
        }
        response
    }
}

impl From<&TenantIdError> for ErrorKind {
    fn from(_: &TenantIdError) -> Self {
        ErrorKind::BadRequest
    }
}

impl From<&RepositoryError> for ErrorKind {
    fn from(error: &RepositoryError) -> Self {
        match error {
            RepositoryError::ConnectionFailed(_) => ErrorKind::ExternalCallFailure,
            _ => ErrorKind::Internal,
        }
    }
}

impl From<&QuotaError> for ErrorKind {
    fn from(error: &QuotaError) -> Self {
        match error {
            QuotaError::NotFound(_) => ErrorKind::NotFound,
            QuotaError::InvalidBalance { .. } => ErrorKind::InvalidBalance,
            QuotaError::Contention { .. } => ErrorKind::Contention,
            QuotaError::Repository(e) => e.into(),
        }
    }
}

impl From<&IngestionError> for ErrorKind {
    fn from(error: &IngestionError) -> Self {
        match error {
            IngestionError::EmptyDocument(_) => ErrorKind::BadRequest,
            IngestionError::Embedding(_)
            | IngestionError::EmbeddingCountMismatch { .. }
            | IngestionError::Storage(_) => ErrorKind::ExternalCallFailure,
        }
    }
}

impl From<&IndexerError> for ErrorKind {
    fn from(error: &IndexerError) -> Self {
        match error {
            IndexerError::InvalidBucket(_)
            | IndexerError::InvalidKey(_)
            | IndexerError::InvalidEncoding(..) => ErrorKind::BadRequest,
            IndexerError::Download(ObjectSourceError::NotFound(_)) => ErrorKind::NotFound,
            IndexerError::Download(ObjectSourceError::DownloadFailed(_)) => {
                ErrorKind::ExternalCallFailure
            }
            IndexerError::Download(_) | IndexerError::Io(..) => ErrorKind::Internal,
            IndexerError::Ingestion(e) => e.into(),
        }
    }
}

impl From<&AnswerError> for ErrorKind {
    fn from(error: &AnswerError) -> Self {
        match error {
            AnswerError::EmptyQuestion => ErrorKind::BadRequest,
            AnswerError::InsufficientQuota { .. } => ErrorKind::InvalidBalance,
            AnswerError::Quota(e) => e.into(),
            AnswerError::Embedding(_) | AnswerError::Search(_) | AnswerError::Inference(_) => {
                ErrorKind::ExternalCallFailure
            }
        }
    }
}

/// Error response for any error that classifies into an [`ErrorKind`].
pub fn error_response<E>(error: &E, policy: ErrorStatusPolicy) -> ResponseEnvelope
where
    E: fmt::Display,
    for<'a> &'a E: Into<ErrorKind>,
{
    build_error_response(error, error.into(), policy)
}
