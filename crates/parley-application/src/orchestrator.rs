//! Session orchestration.
//!
//! `SessionOrchestrator` drives one dialogue session: it resolves the preset,
//! builds and records the preamble, and runs each turn through generation,
//! post-processing, and compaction. It is owned by the entry point and takes
//! `&mut self` for every turn, so turns never overlap.

use parley_core::backend::{GenerationBackend, WeatherProvider};
use parley_core::error::{ParleyError, Result};
use parley_core::message::SenderRole;
use parley_core::preset::GenerationPreset;
use parley_core::prompt::PromptAssembler;
use parley_core::repository::ConfigRepository;
use parley_core::response::trim_after_last_sentence;
use parley_core::session::{CompactionPolicy, CompactionReport, SessionLog, SessionState};
use parley_core::user::UserConfig;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Collaborators a session runs against.
pub struct SessionServices {
    pub config: Arc<dyn ConfigRepository>,
    pub generator: Arc<dyn GenerationBackend>,
    pub compaction: CompactionPolicy,
    /// Queried only when the user enabled the weather feature
    pub weather: Option<Arc<dyn WeatherProvider>>,
    /// Upper bound on one generation call
    pub generation_deadline: Option<Duration>,
}

/// Which persona and preset a session is started with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub persona: String,
    pub preset: String,
}

/// Result of one completed turn.
#[derive(Debug)]
pub struct TurnReply {
    /// The reply cut after its last complete sentence, as recorded
    pub content: String,
    /// Outcome of the compaction step that followed the reply.
    ///
    /// A failed step leaves the history as it was; the reply is still valid.
    pub compaction: Result<CompactionReport>,
}

pub struct SessionOrchestrator {
    state: SessionState,
    preset: Arc<GenerationPreset>,
    persona_name: String,
    user_name: String,
    generator: Arc<dyn GenerationBackend>,
    compaction: CompactionPolicy,
    generation_deadline: Option<Duration>,
}

impl SessionOrchestrator {
    /// Loads the session's configuration, records the preamble, and returns a
    /// session ready for turns.
    ///
    /// # Errors
    ///
    /// - `ParleyError::NotFound` for an unknown preset; nothing is created
    /// - `ParleyError::Configuration` for missing or malformed sources
    /// - `ParleyError::Persistence` when the log cannot be created
    pub async fn start(
        services: SessionServices,
        request: &SessionRequest,
        log: Box<dyn SessionLog>,
    ) -> Result<Self> {
        let started = Instant::now();
        let SessionServices {
            config,
            generator,
            compaction,
            weather,
            generation_deadline,
        } = services;

        let preset = config.load_presets().await?.resolve(&request.preset)?;
        tracing::debug!(preset = %preset.name, "Loaded generation preset");

        let persona = config.load_persona(&request.persona).await?;
        let user = config.load_user().await?;
        let scene = config.load_scene().await?;

        let weather_report = match weather {
            Some(provider) if user.features.weather_enabled => {
                lookup_weather(provider.as_ref(), &user).await
            }
            _ => None,
        };

        let mut assembler = PromptAssembler::new(&persona, &user.user_data, &scene, &preset);
        if let Some(report) = weather_report {
            assembler = assembler.with_weather(report);
        }
        let preamble = assembler.assemble();
        tracing::debug!("\n{preamble}");

        let mut state = SessionState::new(log);
        state.start(&preamble).await?;

        tracing::info!(
            session_id = state.session_id(),
            persona = persona.name(),
            preset = %preset.name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Session started"
        );

        Ok(Self {
            state,
            preset,
            persona_name: persona.name().to_string(),
            user_name: user.user_data.name,
            generator,
            compaction,
            generation_deadline,
        })
    }

    /// Records the user's message and returns the persona's reply.
    ///
    /// When generation fails the user message stays recorded and the error is
    /// returned; [`regenerate`](Self::regenerate) retries without a new message.
    pub async fn submit_turn(&mut self, text: &str) -> Result<TurnReply> {
        self.state
            .append_turn(&self.user_name, SenderRole::User.as_str(), text)
            .await?;
        self.reply().await
    }

    /// Generates a reply to the last user message again.
    ///
    /// # Errors
    ///
    /// Returns `ParleyError::Validation` unless the session is active and its
    /// last message is from the user.
    pub async fn regenerate(&mut self) -> Result<TurnReply> {
        let awaiting_reply = self.state.is_active()
            && self
                .state
                .last_message()
                .is_some_and(|m| m.sender_role == SenderRole::User);
        if !awaiting_reply {
            return Err(ParleyError::validation(
                "nothing to regenerate: the last message is not from the user",
            ));
        }
        self.reply().await
    }

    /// Records the end of the session.
    pub async fn end(&mut self) -> Result<()> {
        self.state.end().await
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn preset(&self) -> &GenerationPreset {
        &self.preset
    }

    pub fn persona_name(&self) -> &str {
        &self.persona_name
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    async fn reply(&mut self) -> Result<TurnReply> {
        let started = Instant::now();
        let history = self.state.build_generation_view();

        let call = self.generator.generate(&history, &self.preset.parameters);
        let generated = match self.generation_deadline {
            Some(deadline) => tokio::time::timeout(deadline, call)
                .await
                .map_err(|_| ParleyError::timeout("generating a reply", deadline))?,
            None => call.await,
        };
        let generated = generated.inspect_err(|e| {
            tracing::error!(session_id = self.state.session_id(), error = %e, "Generation failed");
        })?;

        let content = trim_after_last_sentence(&generated.content).to_string();
        if content.trim().is_empty() {
            return Err(ParleyError::generation("generation backend returned an empty reply"));
        }

        self.state
            .append_turn(&self.persona_name, SenderRole::Assistant.as_str(), &content)
            .await?;
        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "A response was generated"
        );

        let compaction = self.state.maybe_compact(&self.compaction).await;
        if let Err(e) = &compaction {
            tracing::warn!(
                session_id = self.state.session_id(),
                error = %e,
                "Compaction step failed; history left unchanged"
            );
        }

        Ok(TurnReply {
            content,
            compaction,
        })
    }
}

async fn lookup_weather(provider: &dyn WeatherProvider, user: &UserConfig) -> Option<String> {
    let profile = &user.user_data;
    match provider.report(profile.lat, profile.lon).await {
        Ok(report) => Some(report),
        Err(e) => {
            tracing::warn!(error = %e, "Weather lookup failed; omitting weather from preamble");
            None
        }
    }
}
