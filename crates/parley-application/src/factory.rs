use crate::orchestrator::{SessionOrchestrator, SessionRequest, SessionServices};
use parley_core::backend::WeatherProvider;
use parley_core::error::Result;
use parley_core::session::CompactionPolicy;
use parley_infrastructure::{AppConfig, JsonConfigRepository, JsonlSessionLog, ParleyPaths};
use parley_interaction::{
    ChatCompletionsClient, HeuristicTokenCounter, InferenceSummarizer, OpenWeatherMapClient,
};
use std::sync::Arc;

/// Factory for sessions wired against the configured HTTP backends and the
/// file-backed configuration and log stores.
pub struct SessionFactory {
    /// Application settings, with environment overrides already applied
    config: AppConfig,
    /// Layout of the data directory
    paths: ParleyPaths,
}

impl SessionFactory {
    /// Creates a new SessionFactory.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated application settings
    /// * `paths` - Where configuration sources and session logs live
    pub fn new(config: AppConfig, paths: ParleyPaths) -> Self {
        Self { config, paths }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn paths(&self) -> &ParleyPaths {
        &self.paths
    }

    /// The persona and preset named in the settings.
    pub fn default_request(&self) -> SessionRequest {
        SessionRequest {
            persona: self.config.session.persona.clone(),
            preset: self.config.session.preset.clone(),
        }
    }

    /// Builds the collaborators of one session.
    pub fn services(&self) -> SessionServices {
        let generation = &self.config.generation;
        let mut generator = ChatCompletionsClient::new(&generation.base_url);
        if let Some(model) = &generation.model {
            generator = generator.with_model(model);
        }
        if let Some(api_key) = &generation.api_key {
            generator = generator.with_api_key(api_key);
        }

        let summarization = &self.config.summarization;
        let mut summarizer = InferenceSummarizer::new(&summarization.base_url);
        if let Some(api_key) = &summarization.api_key {
            summarizer = summarizer.with_api_key(api_key);
        }

        let compaction = CompactionPolicy::new(
            self.config.compaction.to_config(),
            Arc::new(summarizer),
            Arc::new(HeuristicTokenCounter),
        )
        .with_deadline(summarization.timeout());

        let weather = self.config.weather.api_key.as_ref().map(|key| {
            Arc::new(OpenWeatherMapClient::new(key.clone())) as Arc<dyn WeatherProvider>
        });
        if weather.is_none() {
            tracing::debug!("No weather API key configured; weather lookups disabled");
        }

        SessionServices {
            config: Arc::new(JsonConfigRepository::new(self.paths.clone())),
            generator: Arc::new(generator),
            compaction,
            weather,
            generation_deadline: Some(generation.timeout()),
        }
    }

    /// Starts a session whose log is written under the sessions directory.
    pub async fn start_session(&self, request: &SessionRequest) -> Result<SessionOrchestrator> {
        let log = JsonlSessionLog::new(self.paths.sessions_dir());
        SessionOrchestrator::start(self.services(), request, Box::new(log)).await
    }
}
