//! End-to-end session flow over the file-backed configuration and log stores.

use async_trait::async_trait;
use parley_application::{SessionOrchestrator, SessionRequest, SessionServices};
use parley_core::backend::{
    GeneratedMessage, GenerationBackend, SummarizationBackend, SummaryBounds, SummaryRequest,
    SummaryResult, TokenCounter,
};
use parley_core::error::Result;
use parley_core::message::{GenerationMessage, SenderRole};
use parley_core::preset::DecodingParameters;
use parley_core::session::{CompactionConfig, CompactionPolicy, CompactionReport};
use parley_infrastructure::{JsonConfigRepository, JsonlSessionLog, ParleyPaths};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const PERSONA: &str = r#"{
    "core_identity": {"name": "Mira", "birthday": "1994-03-02", "sex": "female",
                      "race": "human", "lat": 47.6, "lon": -122.3},
    "psychology": {"traits": ["curious", "dry humor"]}
}"#;

const USER: &str = r#"{
    "user_data": {"name": "Ada", "birthday": "1990-12-10", "sex": "female",
                  "race": "human", "lat": 51.5, "lon": -0.1},
    "features": {"weather_enabled": false}
}"#;

const SCENE: &str = r#"{"setting": "a quiet cafe", "relationship": "old friends", "tone": "relaxed"}"#;

const PRESETS: &str = r#"{"realism": {"temperature": 0.8, "system_message": "Stay grounded."}}"#;

/// Echoes the last message back as one sentence and an unfinished tail.
struct EchoGenerator;

#[async_trait]
impl GenerationBackend for EchoGenerator {
    async fn generate(
        &self,
        history: &[GenerationMessage],
        _parameters: &DecodingParameters,
    ) -> Result<GeneratedMessage> {
        let last = history.last().map(|m| m.content.as_str()).unwrap_or_default();
        Ok(GeneratedMessage::assistant(format!("{last}. And then")))
    }
}

struct PrefixSummarizer;

#[async_trait]
impl SummarizationBackend for PrefixSummarizer {
    async fn summarize(
        &self,
        batch: Vec<SummaryRequest>,
        _bounds: SummaryBounds,
    ) -> Result<Vec<SummaryResult>> {
        Ok(batch
            .into_iter()
            .map(|r| SummaryResult {
                original_index: r.original_index,
                summary_text: format!("summary of #{}", r.original_index),
            })
            .collect())
    }
}

struct WordCounter;

impl TokenCounter for WordCounter {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

fn write(path: PathBuf, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn data_dir() -> (TempDir, ParleyPaths) {
    let dir = TempDir::new().unwrap();
    let paths = ParleyPaths::new(Some(dir.path())).unwrap();
    write(paths.persona_file("mira"), PERSONA);
    write(paths.user_config_file(), USER);
    write(paths.scene_file(), SCENE);
    write(paths.presets_file(), PRESETS);
    (dir, paths)
}

fn services(paths: &ParleyPaths) -> SessionServices {
    SessionServices {
        config: Arc::new(JsonConfigRepository::new(paths.clone())),
        generator: Arc::new(EchoGenerator),
        compaction: CompactionPolicy::new(
            CompactionConfig::default(),
            Arc::new(PrefixSummarizer),
            Arc::new(WordCounter),
        ),
        weather: None,
        generation_deadline: None,
    }
}

fn request(preset: &str) -> SessionRequest {
    SessionRequest {
        persona: "mira".to_string(),
        preset: preset.to_string(),
    }
}

fn only_session_file(dir: &Path) -> PathBuf {
    let entries: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(entries.len(), 1);
    entries.into_iter().next().unwrap()
}

#[tokio::test]
async fn test_session_is_recorded_and_replayable() {
    let (_dir, paths) = data_dir();
    let log = JsonlSessionLog::new(paths.sessions_dir());
    let mut session = SessionOrchestrator::start(services(&paths), &request("realism"), Box::new(log))
        .await
        .unwrap();

    let reply = session.submit_turn("Nice weather").await.unwrap();
    assert_eq!(reply.content, "Nice weather.");

    session.end().await.unwrap();

    let file = only_session_file(&paths.sessions_dir());
    let snapshot = JsonlSessionLog::load_snapshot(&file).await.unwrap();
    assert_eq!(snapshot.session_id, session.state().session_id());
    assert!(snapshot.end_time.is_some());

    let messages: Vec<_> = snapshot.messages.iter().map(|r| r.to_message()).collect();
    assert_eq!(messages, session.state().messages());
    assert_eq!(messages[0].sender_role, SenderRole::System);
    assert!(messages[0].content.contains("YOUR TASK:\nStay grounded."));
    assert!(messages[0].content.contains("Traits: curious, dry humor"));
}

#[tokio::test]
async fn test_compaction_is_persisted_as_revisions() {
    let (_dir, paths) = data_dir();
    let log = JsonlSessionLog::new(paths.sessions_dir());
    let mut session = SessionOrchestrator::start(services(&paths), &request("realism"), Box::new(log))
        .await
        .unwrap();

    // Turns alternate long and short user messages; the echo makes the
    // replies long where the prompts are.
    let long = vec!["talk"; 140].join(" ");
    let mut last = None;
    for turn in 0..4 {
        let text = if turn % 2 == 0 { long.as_str() } else { "ok" };
        last = Some(session.submit_turn(text).await.unwrap());
    }

    // 9 messages, cursor 1: scans [1, 5) and summarizes the long pair at 1 and 2.
    let reply = last.unwrap();
    assert_eq!(
        reply.compaction,
        Ok(CompactionReport::Completed {
            scanned: 1..5,
            summarized: 2
        })
    );
    assert_eq!(session.state().compaction_cursor(), 5);
    assert_eq!(session.state().messages()[1].content, "summary of #1");
    assert_eq!(session.state().messages()[2].content, "summary of #2");
    assert_eq!(session.state().messages()[3].content, "ok");

    let file = only_session_file(&paths.sessions_dir());
    let snapshot = JsonlSessionLog::load_snapshot(&file).await.unwrap();
    assert_eq!(snapshot.messages.len(), 9);
    assert_eq!(snapshot.messages[1].content, "summary of #1");
    assert_eq!(snapshot.messages[5].content, long);
}

#[tokio::test]
async fn test_unknown_preset_writes_no_log() {
    let (_dir, paths) = data_dir();
    let log = JsonlSessionLog::new(paths.sessions_dir());

    let err = SessionOrchestrator::start(services(&paths), &request("noir"), Box::new(log))
        .await
        .err()
        .unwrap();

    assert!(err.is_not_found());
    assert!(!paths.sessions_dir().exists());
}

#[tokio::test]
async fn test_missing_persona_is_configuration_error() {
    let (_dir, paths) = data_dir();
    let log = JsonlSessionLog::new(paths.sessions_dir());
    let missing = SessionRequest {
        persona: "nobody".to_string(),
        preset: "realism".to_string(),
    };

    let err = SessionOrchestrator::start(services(&paths), &missing, Box::new(log))
        .await
        .err()
        .unwrap();

    assert!(err.is_config());
    assert!(!paths.sessions_dir().exists());
}
