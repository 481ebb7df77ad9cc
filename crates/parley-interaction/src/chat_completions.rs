//! ChatCompletionsClient - generation backend for OpenAI-compatible servers.
//!
//! Talks to `/v1/chat/completions` as served by llama.cpp, vLLM, TGI, and
//! similar. Sampler settings outside the OpenAI schema are sent as the
//! extension fields these servers accept.

use crate::http::{self, Service};
use async_trait::async_trait;
use parley_core::backend::{GeneratedMessage, GenerationBackend};
use parley_core::error::{ParleyError, Result};
use parley_core::message::{GenerationMessage, SenderRole};
use parley_core::preset::DecodingParameters;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Generation backend talking to an OpenAI-compatible HTTP server.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: Option<String>,
}

impl ChatCompletionsClient {
    /// Creates a client for the server at `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}{COMPLETIONS_PATH}", base_url.trim_end_matches('/')),
            api_key: None,
            model: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_request<'a>(
        &'a self,
        history: &'a [GenerationMessage],
        parameters: &DecodingParameters,
    ) -> ChatCompletionRequest<'a> {
        let beam_search = parameters.beam_count > 1;

        ChatCompletionRequest {
            model: self.model.as_deref(),
            messages: history
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: parameters.temperature,
            top_p: parameters.top_p,
            max_tokens: parameters.max_new_tokens,
            top_k: parameters.top_k,
            repetition_penalty: parameters.repetition_penalty,
            min_tokens: (parameters.min_length > 0).then_some(parameters.min_length),
            length_penalty: parameters.length_penalty,
            n: beam_search.then_some(1),
            best_of: beam_search.then_some(parameters.beam_count),
            use_beam_search: beam_search.then_some(true),
        }
    }
}

#[async_trait]
impl GenerationBackend for ChatCompletionsClient {
    async fn generate(
        &self,
        history: &[GenerationMessage],
        parameters: &DecodingParameters,
    ) -> Result<GeneratedMessage> {
        let body = self.build_request(history, parameters);

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        tracing::debug!(
            endpoint = %self.endpoint,
            messages = history.len(),
            "Sending generation request"
        );
        let response = http::send(Service::Generation, request).await?;
        let parsed: ChatCompletionResponse = http::json(Service::Generation, response).await?;
        extract_reply(parsed)
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    top_k: u32,
    repetition_penalty: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_tokens: Option<u32>,
    length_penalty: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    best_of: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    use_beam_search: Option<bool>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    role: Option<String>,
    content: Option<String>,
}

fn extract_reply(response: ChatCompletionResponse) -> Result<GeneratedMessage> {
    let message = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| ParleyError::generation("generation backend returned no choices"))?;

    if let Some(role) = message.role.as_deref() {
        if role != SenderRole::Assistant.as_str() {
            tracing::warn!(role, "Generation backend replied with a non-assistant role");
        }
    }

    message
        .content
        .filter(|content| !content.trim().is_empty())
        .map(GeneratedMessage::assistant)
        .ok_or_else(|| ParleyError::generation("generation backend returned no content"))
}
