use std::convert::Infallible;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ErrorKind, ResponseEnvelope, build_error_response, build_response, error_response};
use crate::application::services::{AnswerEvent, SourceChunk};
use crate::domain::TenantId;
use crate::infrastructure::observability::sanitize_prompt;
use crate::presentation::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub tenant_id: String,
    pub question: String,
}

#[derive(Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub tokens_used: u64,
    pub remaining_tokens: u64,
    pub sources: Vec<SourceResponse>,
}

#[derive(Serialize)]
pub struct SourceResponse {
    pub text: String,
    pub source: String,
    pub score: f32,
}

fn source_responses(sources: Vec<SourceChunk>) -> Vec<SourceResponse> {
    sources
        .into_iter()
        .map(|s| SourceResponse {
            text: s.text,
            source: s.source,
            score: s.score,
        })
        .collect()
}

fn parse_request(
    state: &AppState,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<(TenantId, String), ResponseEnvelope> {
    let Json(request) = payload.map_err(|e| {
        build_error_response(e.body_text(), ErrorKind::BadRequest, state.error_status)
    })?;
    let tenant_id =
        TenantId::new(request.tenant_id).map_err(|e| error_response(&e, state.error_status))?;

    tracing::info!(
        tenant_id = %tenant_id,
        question = %sanitize_prompt(&request.question),
        "Processing query"
    );

    Ok((tenant_id, request.question))
}

#[tracing::instrument(skip(state, payload))]
pub async fn query_handler(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> ResponseEnvelope {
    let (tenant_id, question) = match parse_request(&state, payload) {
        Ok(parsed) => parsed,
        Err(response) => return response,
    };

    match state.answer_service.answer(&tenant_id, &question).await {
        Ok(answer) => build_response(
            &QueryResponse {
                answer: answer.answer,
                tokens_used: answer.tokens_used,
                remaining_tokens: answer.remaining_tokens,
                sources: source_responses(answer.sources),
            },
            StatusCode::OK,
        ),
        Err(e) => {
            tracing::warn!(tenant_id = %tenant_id, error = %e, "Query failed");
            error_response(&e, state.error_status)
        }
    }
}

/// Server-sent events: one `sources` event, a `token` event per generated
/// token, then `done` with the billing, or `error` if generation breaks off.
#[tracing::instrument(skip(state, payload))]
pub async fn query_stream_handler(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let (tenant_id, question) = match parse_request(&state, payload) {
        Ok(parsed) => parsed,
        Err(response) => return response.into_response(),
    };

    let streaming = match state.answer_service.answer_stream(&tenant_id, &question).await {
        Ok(streaming) => streaming,
        Err(e) => {
            tracing::warn!(tenant_id = %tenant_id, error = %e, "Streaming query failed");
            return error_response(&e, state.error_status).into_response();
        }
    };

    let sources = source_responses(streaming.sources);
    let mut events = streaming.events;

    let sse_stream = async_stream::stream! {
        match Event::default().event("sources").json_data(&sources) {
            Ok(event) => {
                yield Ok::<_, Infallible>(event);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode sources event");
            }
        }

        while let Some(event) = events.next().await {
            let frame = match event {
                Ok(AnswerEvent::Token(text)) => {
                    Event::default().event("token").json_data(json!({ "text": text }))
                }
                Ok(AnswerEvent::Completed { tokens_used, remaining_tokens }) => Event::default()
                    .event("done")
                    .json_data(json!({
                        "tokens_used": tokens_used,
                        "remaining_tokens": remaining_tokens,
                    })),
                Err(e) => Event::default()
                    .event("error")
                    .json_data(json!({ "error": e.to_string() })),
            };

            match frame {
                Ok(frame) => {
                    yield Ok(frame);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode answer event");
                    break;
                }
            }
        }
    };

    Sse::new(sse_stream)
        .keep_alive(KeepAlive::new().interval(state.sse_keep_alive).text("keep-alive"))
        .into_response()
}
