use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use super::{ErrorKind, ResponseEnvelope, build_error_response, build_response, error_response};
use crate::domain::ObjectLocation;
use crate::presentation::state::AppState;

/// Object-created notification in the S3 event shape.
#[derive(Debug, Deserialize)]
pub struct ObjectCreatedEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<EventRecord>,
}

#[derive(Debug, Deserialize)]
pub struct EventRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct S3Object {
    pub key: String,
}

#[derive(Serialize)]
pub struct ObjectCreatedResponse {
    pub results: Vec<IndexedObjectResponse>,
}

#[derive(Serialize)]
pub struct IndexedObjectResponse {
    pub bucket: String,
    pub key: String,
    pub file_path: String,
    pub chunks: usize,
    pub batches: usize,
}

#[tracing::instrument(skip(state, payload))]
pub async fn object_created_handler(
    State(state): State<AppState>,
    payload: Result<Json<ObjectCreatedEvent>, JsonRejection>,
) -> ResponseEnvelope {
    let event = match payload {
        Ok(Json(event)) => event,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected malformed object-created event");
            return build_error_response(e.body_text(), ErrorKind::BadRequest, state.error_status);
        }
    };

    if event.records.is_empty() {
        return build_error_response(
            "event contains no records",
            ErrorKind::BadRequest,
            state.error_status,
        );
    }

    let mut results = Vec::with_capacity(event.records.len());
    for record in event.records {
        let location = ObjectLocation::new(record.s3.bucket.name, record.s3.object.key);

        match state.document_indexer.index_object(&location).await {
            Ok(indexed) => {
                tracing::info!(
                    location = %indexed.location,
                    chunks = indexed.summary.chunk_count,
                    batches = indexed.summary.batch_count,
                    "Object indexed"
                );
                results.push(IndexedObjectResponse {
                    bucket: indexed.location.bucket,
                    key: indexed.location.key,
                    file_path: indexed.local_path.display().to_string(),
                    chunks: indexed.summary.chunk_count,
                    batches: indexed.summary.batch_count,
                });
            }
            Err(e) => {
                tracing::error!(location = %location, error = %e, "Object indexing failed");
                return error_response(&e, state.error_status);
            }
        }
    }

    build_response(&ObjectCreatedResponse { results }, StatusCode::OK)
}
