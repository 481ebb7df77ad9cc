//! InferenceSummarizer - batch summarization over an inference endpoint.
//!
//! Speaks the Hugging Face inference summarization shape:
//!
//! ```text
//! POST <url>  {"inputs": ["…", "…"], "parameters": {"min_length": 60, "max_length": 130}}
//! 200         [{"summary_text": "…"}, {"summary_text": "…"}]
//! ```
//!
//! Replies are positional; each is paired back with the index of its request.

use crate::http::{self, Service};
use async_trait::async_trait;
use parley_core::backend::{SummarizationBackend, SummaryBounds, SummaryRequest, SummaryResult};
use parley_core::error::{ParleyError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct InferenceSummarizer {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl InferenceSummarizer {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[derive(Serialize)]
struct SummarizationRequest<'a> {
    inputs: Vec<&'a str>,
    parameters: SummaryBounds,
}

#[derive(Deserialize)]
struct SummaryOutput {
    summary_text: String,
}

/// Pairs positional outputs with the indices of their requests.
fn pair_with_requests(
    batch: &[SummaryRequest],
    outputs: Vec<SummaryOutput>,
) -> Result<Vec<SummaryResult>> {
    if outputs.len() != batch.len() {
        return Err(ParleyError::summarization(format!(
            "summarization backend returned {} summaries for {} inputs",
            outputs.len(),
            batch.len()
        )));
    }

    Ok(batch
        .iter()
        .zip(outputs)
        .map(|(request, output)| SummaryResult {
            original_index: request.original_index,
            summary_text: output.summary_text.trim().to_string(),
        })
        .collect())
}

#[async_trait]
impl SummarizationBackend for InferenceSummarizer {
    async fn summarize(
        &self,
        batch: Vec<SummaryRequest>,
        bounds: SummaryBounds,
    ) -> Result<Vec<SummaryResult>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let body = SummarizationRequest {
            inputs: batch.iter().map(|r| r.content.as_str()).collect(),
            parameters: bounds,
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = http::send(Service::Summarization, request).await?;
        let outputs: Vec<SummaryOutput> = http::json(Service::Summarization, response).await?;
        pair_with_requests(&batch, outputs)
    }
}
