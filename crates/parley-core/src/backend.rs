//! Contracts for the external services a session consumes.
//!
//! Generation, summarization, token counting, and weather lookup are black
//! boxes behind these traits. Implementations live in `parley-interaction`;
//! tests use in-memory fakes.

use crate::error::Result;
use crate::message::{GenerationMessage, SenderRole};
use crate::preset::DecodingParameters;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Reply produced by a generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedMessage {
    pub role: SenderRole,
    pub content: String,
}

impl GeneratedMessage {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: SenderRole::Assistant,
            content: content.into(),
        }
    }
}

/// Text-generation service.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generates the next assistant message for the given history.
    ///
    /// # Arguments
    ///
    /// * `history` - Ordered `{role, content}` pairs, preamble first
    /// * `parameters` - Decoding parameters of the session's preset
    ///
    /// # Returns
    ///
    /// - `Ok(GeneratedMessage)`: The reply with role `assistant`
    /// - `Err(ParleyError::Generation)`: The backend failed
    async fn generate(
        &self,
        history: &[GenerationMessage],
        parameters: &DecodingParameters,
    ) -> Result<GeneratedMessage>;
}

/// One message queued for summarization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub content: String,
    pub original_index: usize,
}

/// Summary of the message at `original_index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub original_index: usize,
    pub summary_text: String,
}

/// Length bounds, in tokens, for generated summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryBounds {
    pub min_length: u32,
    pub max_length: u32,
}

impl Default for SummaryBounds {
    fn default() -> Self {
        Self {
            min_length: 60,
            max_length: 130,
        }
    }
}

/// Batch summarization service.
#[async_trait]
pub trait SummarizationBackend: Send + Sync {
    /// Summarizes a batch of messages in one call.
    ///
    /// Implementations must return exactly one result per request, each
    /// carrying the `original_index` of its request. Order is not significant.
    async fn summarize(
        &self,
        batch: Vec<SummaryRequest>,
        bounds: SummaryBounds,
    ) -> Result<Vec<SummaryResult>>;
}

/// Token-length query used to decide which messages qualify for compaction.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// Current weather and local time at a coordinate, rendered as text.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn report(&self, lat: f64, lon: f64) -> Result<String>;
}
