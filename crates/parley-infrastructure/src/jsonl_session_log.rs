//! Append-only JSON Lines session log.
//!
//! Each session is one file of independent JSON records, one per line, each
//! flushed and synced before the write returns:
//!
//! ```text
//! {"type":"session","version":1,"session_id":"…","start_time":"…"}
//! {"type":"message","message_number":0,"timestamp":"…","sender_name":"System",…}
//! {"type":"revision","message_number":3,"revision_id":"…","supersedes":"<message id>",…}
//! {"type":"closed","end_time":"…"}
//! ```
//!
//! Nothing already written is ever rewritten. A compaction edit is a
//! `revision` record that supersedes the message it names; replaying the file
//! folds revisions into a [`LogSnapshot`].

use chrono::{DateTime, Utc};
use parley_core::error::{ParleyError, Result};
use parley_core::session::{LogSnapshot, PersistedLogRecord, SessionLog};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Current on-disk format version.
pub const LOG_FORMAT_VERSION: u32 = 1;

/// One line of a session log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum LogLine {
    Session {
        version: u32,
        session_id: String,
        start_time: DateTime<Utc>,
    },
    Message(PersistedLogRecord),
    Revision {
        message_number: usize,
        revision_id: String,
        supersedes: String,
        timestamp: DateTime<Utc>,
        content: String,
    },
    Closed {
        end_time: DateTime<Utc>,
    },
}

/// Returns the file name of a session log.
pub fn session_file_name(session_id: &str, start_time: DateTime<Utc>) -> String {
    let prefix: String = session_id.chars().take(8).collect();
    format!("chat_{}_{prefix}.jsonl", start_time.format("%Y%m%d_%H%M%S"))
}

struct OpenLog {
    path: PathBuf,
    file: File,
    /// Length of the file after the last successful write
    len: u64,
}

/// [`SessionLog`] writing one JSONL file per session under a directory.
pub struct JsonlSessionLog {
    dir: PathBuf,
    open: Option<OpenLog>,
    message_ids: Vec<String>,
    closed: bool,
}

impl JsonlSessionLog {
    /// Creates a log that will place its file under `dir` on `initialize`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            open: None,
            message_ids: Vec::new(),
            closed: false,
        }
    }

    /// Path of the backing file, once initialized.
    pub fn path(&self) -> Option<&Path> {
        self.open.as_ref().map(|open| open.path.as_path())
    }

    /// Reads a session log and folds its revisions.
    ///
    /// # Errors
    ///
    /// - `ParleyError::Persistence` when the file cannot be read
    /// - `ParleyError::Serialization` when a line is malformed or violates the
    ///   record sequence; the message names the line
    pub async fn load_snapshot(path: &Path) -> Result<LogSnapshot> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ParleyError::persistence("reading session log", path.display(), e))?;
        replay(path, &content)
    }

    async fn write_line(&mut self, operation: &str, line: &LogLine) -> Result<()> {
        let open = self.open.as_mut().ok_or_else(|| {
            ParleyError::persistence(operation, self.dir.display(), "log not initialized")
        })?;

        let mut bytes = serde_json::to_vec(line)?;
        bytes.push(b'\n');

        if let Err(e) = write_synced(&mut open.file, &bytes).await {
            // Drop any partial line so the next write starts on a clean boundary.
            if let Err(truncate) = open.file.set_len(open.len).await {
                tracing::error!(
                    path = %open.path.display(),
                    error = %truncate,
                    "Failed to roll back partial log write"
                );
            }
            return Err(ParleyError::persistence(operation, open.path.display(), e));
        }

        open.len += bytes.len() as u64;
        Ok(())
    }

    fn ensure_writable(&self, operation: &str) -> Result<()> {
        if self.closed {
            return Err(ParleyError::persistence(
                operation,
                self.location(),
                "log is closed",
            ));
        }
        Ok(())
    }
}

async fn write_synced(file: &mut File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_data().await
}

/// Removes a log whose header never made it to disk, so the same file name
/// can be created again.
async fn discard_partial_log(open: OpenLog) {
    let OpenLog { path, file, .. } = open;
    drop(file);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial session log");
    }
}

#[async_trait::async_trait]
impl SessionLog for JsonlSessionLog {
    async fn initialize(&mut self, session_id: &str, start_time: DateTime<Utc>) -> Result<()> {
        if self.open.is_some() {
            return Err(ParleyError::persistence(
                "initializing session log",
                self.location(),
                "log already initialized",
            ));
        }

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            ParleyError::persistence("creating sessions directory", self.dir.display(), e)
        })?;

        let path = self.dir.join(session_file_name(session_id, start_time));
        let file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| ParleyError::persistence("creating session log", path.display(), e))?;

        self.open = Some(OpenLog { path, file, len: 0 });
        let header = LogLine::Session {
            version: LOG_FORMAT_VERSION,
            session_id: session_id.to_string(),
            start_time,
        };
        if let Err(e) = self.write_line("writing session header", &header).await {
            if let Some(open) = self.open.take() {
                discard_partial_log(open).await;
            }
            return Err(e);
        }

        tracing::debug!(path = %self.location(), "A session log has been created");
        Ok(())
    }

    async fn append(&mut self, record: &PersistedLogRecord) -> Result<()> {
        self.ensure_writable("appending message")?;
        if record.message_number != self.message_ids.len() {
            return Err(ParleyError::persistence(
                "appending message",
                self.location(),
                format!(
                    "expected message number {}, got {}",
                    self.message_ids.len(),
                    record.message_number
                ),
            ));
        }

        self.write_line("appending message", &LogLine::Message(record.clone()))
            .await?;
        self.message_ids.push(record.message_id.clone());
        Ok(())
    }

    async fn update(&mut self, index: usize, record: &PersistedLogRecord) -> Result<()> {
        self.ensure_writable("revising message")?;
        let matches = record.message_number == index
            && self.message_ids.get(index) == Some(&record.message_id);
        if !matches {
            return Err(ParleyError::persistence(
                "revising message",
                self.location(),
                format!("no message {} with id {}", index, record.message_id),
            ));
        }

        let revision = LogLine::Revision {
            message_number: index,
            revision_id: uuid::Uuid::new_v4().to_string(),
            supersedes: record.message_id.clone(),
            timestamp: Utc::now(),
            content: record.content.clone(),
        };
        self.write_line("revising message", &revision).await
    }

    async fn close(&mut self, end_time: DateTime<Utc>) -> Result<()> {
        self.ensure_writable("closing session log")?;
        self.write_line("closing session log", &LogLine::Closed { end_time })
            .await?;
        self.closed = true;
        Ok(())
    }

    fn location(&self) -> String {
        match self.path() {
            Some(path) => path.display().to_string(),
            None => self.dir.display().to_string(),
        }
    }
}

fn line_error(path: &Path, line: usize, message: impl std::fmt::Display) -> ParleyError {
    ParleyError::Serialization {
        format: "JSONL".to_string(),
        message: format!("{} line {line}: {message}", path.display()),
    }
}

/// Replays a log's lines into a snapshot, validating the record sequence.
fn replay(path: &Path, content: &str) -> Result<LogSnapshot> {
    let mut snapshot: Option<LogSnapshot> = None;
    let mut seen_ids = HashSet::new();
    let lines: Vec<&str> = content.split_terminator('\n').collect();
    let unterminated_tail = !content.is_empty() && !content.ends_with('\n');

    for (line_index, raw) in lines.iter().enumerate() {
        let line_number = line_index + 1;
        if raw.trim().is_empty() {
            continue;
        }

        let parsed = match serde_json::from_str::<LogLine>(raw) {
            Ok(parsed) => parsed,
            Err(e) if unterminated_tail && line_index + 1 == lines.len() => {
                tracing::warn!(
                    path = %path.display(),
                    line = line_number,
                    error = %e,
                    "Ignoring truncated final log line"
                );
                break;
            }
            Err(e) => return Err(line_error(path, line_number, e)),
        };

        let Some(current) = snapshot.as_mut() else {
            match parsed {
                LogLine::Session {
                    version,
                    session_id,
                    start_time,
                } => {
                    if version != LOG_FORMAT_VERSION {
                        return Err(line_error(
                            path,
                            line_number,
                            format!("unsupported log version {version}"),
                        ));
                    }
                    snapshot = Some(LogSnapshot {
                        session_id,
                        start_time,
                        end_time: None,
                        messages: Vec::new(),
                    });
                    continue;
                }
                _ => return Err(line_error(path, line_number, "first record must be the session header")),
            }
        };

        if current.end_time.is_some() {
            return Err(line_error(path, line_number, "record after session close"));
        }

        match parsed {
            LogLine::Session { .. } => {
                return Err(line_error(path, line_number, "duplicate session header"));
            }
            LogLine::Message(record) => {
                if record.message_number != current.messages.len() {
                    return Err(line_error(
                        path,
                        line_number,
                        format!(
                            "message number {} out of sequence, expected {}",
                            record.message_number,
                            current.messages.len()
                        ),
                    ));
                }
                if !seen_ids.insert(record.message_id.clone()) {
                    return Err(line_error(
                        path,
                        line_number,
                        format!("duplicate message id {}", record.message_id),
                    ));
                }
                current.messages.push(record);
            }
            LogLine::Revision {
                message_number,
                supersedes,
                content,
                ..
            } => {
                let target = current
                    .messages
                    .get_mut(message_number)
                    .filter(|existing| existing.message_id == supersedes)
                    .ok_or_else(|| {
                        line_error(
                            path,
                            line_number,
                            format!("revision of unknown message {message_number} ({supersedes})"),
                        )
                    })?;
                target.content = content;
            }
            LogLine::Closed { end_time } => current.end_time = Some(end_time),
        }
    }

    snapshot.ok_or_else(|| line_error(path, 1, "missing session header"))
}
