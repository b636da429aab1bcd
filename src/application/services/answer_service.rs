use std::num::NonZeroUsize;
use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};

use crate::application::ports::{
    Embedder, EmbedderError, InferenceClient, InferenceClientError, VectorStore, VectorStoreError,
};
use crate::domain::TenantId;

use super::{QuotaError, QuotaService, count_tokens};

/// Answers a tenant's question from the closest indexed chunks and bills the
/// tokens of the question and the answer against the tenant's quota.
pub struct AnswerService {
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    inference_client: Arc<dyn InferenceClient>,
    quota_service: Arc<QuotaService>,
    top_k: NonZeroUsize,
}

#[derive(Debug, Clone)]
pub struct Answer {
    pub answer: String,
    pub tokens_used: u64,
    pub remaining_tokens: u64,
    pub sources: Vec<SourceChunk>,
}

#[derive(Debug, Clone)]
pub struct SourceChunk {
    pub text: String,
    pub source: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnswerEvent {
    Token(String),
    /// Last event of a successful stream, sent once the tokens are billed.
    Completed {
        tokens_used: u64,
        remaining_tokens: u64,
    },
}

pub type AnswerEventStream = Pin<Box<dyn Stream<Item = Result<AnswerEvent, AnswerError>> + Send>>;

pub struct StreamingAnswer {
    pub sources: Vec<SourceChunk>,
    pub events: AnswerEventStream,
}

struct PreparedQuestion {
    question_tokens: u64,
    prompt: String,
    sources: Vec<SourceChunk>,
}

pub fn build_prompt(context: &str, question: &str) -> String {
    format!("<|context: {context}|>question: {question}<|endoftext|><|assistant|>")
}

impl AnswerService {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        inference_client: Arc<dyn InferenceClient>,
        quota_service: Arc<QuotaService>,
        top_k: NonZeroUsize,
    ) -> Self {
        Self {
            embedder,
            vector_store,
            inference_client,
            quota_service,
            top_k,
        }
    }

    #[tracing::instrument(skip(self, question), fields(tenant_id = %tenant_id))]
    pub async fn answer(
        &self,
        tenant_id: &TenantId,
        question: &str,
    ) -> Result<Answer, AnswerError> {
        let prepared = self.prepare(tenant_id, question).await?;

        let answer = self
            .inference_client
            .generate(&prepared.prompt)
            .await
            .map_err(AnswerError::Inference)?;

        let tokens_used = prepared.question_tokens + count_tokens(&answer);
        let remaining_tokens = self.quota_service.spend(tenant_id, tokens_used).await?;

        tracing::info!(
            sources = prepared.sources.len(),
            tokens_used,
            remaining_tokens,
            "Question answered"
        );

        Ok(Answer {
            answer,
            tokens_used,
            remaining_tokens,
            sources: prepared.sources,
        })
    }

    /// Like [`answer`](Self::answer), but yields tokens as the model produces
    /// them. Billing happens after the last token; a stream that fails midway
    /// is not billed.
    #[tracing::instrument(skip(self, question), fields(tenant_id = %tenant_id))]
    pub async fn answer_stream(
        &self,
        tenant_id: &TenantId,
        question: &str,
    ) -> Result<StreamingAnswer, AnswerError> {
        let prepared = self.prepare(tenant_id, question).await?;

        let mut tokens = self
            .inference_client
            .generate_stream(&prepared.prompt)
            .await
            .map_err(AnswerError::Inference)?;

        let quota_service = Arc::clone(&self.quota_service);
        let tenant_id = tenant_id.clone();
        let question_tokens = prepared.question_tokens;

        let events = async_stream::stream! {
            let mut answer = String::new();
            while let Some(token) = tokens.next().await {
                match token {
                    Ok(token) => {
                        answer.push_str(&token);
                        yield Ok(AnswerEvent::Token(token));
                    }
                    Err(e) => {
                        tracing::warn!(tenant_id = %tenant_id, error = %e, "Answer stream aborted");
                        yield Err(AnswerError::Inference(e));
                        return;
                    }
                }
            }

            let tokens_used = question_tokens + count_tokens(&answer);
            match quota_service.spend(&tenant_id, tokens_used).await {
                Ok(remaining_tokens) => {
                    tracing::info!(
                        tenant_id = %tenant_id,
                        tokens_used,
                        remaining_tokens,
                        "Streamed answer billed"
                    );
                    yield Ok(AnswerEvent::Completed { tokens_used, remaining_tokens });
                }
                Err(e) => {
                    yield Err(AnswerError::Quota(e));
                }
            }
        };

        Ok(StreamingAnswer {
            sources: prepared.sources,
            events: Box::pin(events),
        })
    }

    /// Quota pre-check, retrieval and prompt assembly shared by both answer paths.
    async fn prepare(
        &self,
        tenant_id: &TenantId,
        question: &str,
    ) -> Result<PreparedQuestion, AnswerError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AnswerError::EmptyQuestion);
        }

        let question_tokens = count_tokens(question);
        if !self.quota_service.check(tenant_id, question_tokens).await? {
            return Err(AnswerError::InsufficientQuota {
                tenant_id: tenant_id.clone(),
                required: question_tokens,
            });
        }

        let query_embedding = self
            .embedder
            .embed(question)
            .await
            .map_err(AnswerError::Embedding)?;

        let results = self
            .vector_store
            .search(&query_embedding, self.top_k.get())
            .await
            .map_err(AnswerError::Search)?;

        let context = results
            .iter()
            .map(|r| r.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let sources = results
            .into_iter()
            .map(|r| SourceChunk {
                text: r.chunk.text,
                source: r.chunk.source,
                score: r.score,
            })
            .collect();

        Ok(PreparedQuestion {
            question_tokens,
            prompt: build_prompt(&context, question),
            sources,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("question must not be empty")]
    EmptyQuestion,
    #[error("tenant {tenant_id} cannot afford {required} tokens")]
    InsufficientQuota { tenant_id: TenantId, required: u64 },
    #[error("quota: {0}")]
    Quota(#[from] QuotaError),
    #[error("embedding: {0}")]
    Embedding(EmbedderError),
    #[error("search: {0}")]
    Search(VectorStoreError),
    #[error("inference: {0}")]
    Inference(InferenceClientError),
}
