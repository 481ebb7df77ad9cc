//! Session state: the ordered message history and its compaction cursor.

use super::compaction::{CompactionPolicy, CompactionReport};
use super::log::{PersistedLogRecord, SessionLog};
use crate::error::{ParleyError, Result};
use crate::message::{GenerationMessage, Message, SenderRole};
use chrono::{DateTime, Utc};

/// Sender name of the session preamble.
pub const SYSTEM_SENDER: &str = "System";

/// The authoritative history of one dialogue session.
///
/// Every mutation is written to the owned [`SessionLog`] before it is applied
/// in memory, so a failed write leaves the state exactly as it was.
pub struct SessionState {
    session_id: String,
    messages: Vec<Message>,
    log: Box<dyn SessionLog>,
    compaction_cursor: usize,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
}

impl SessionState {
    /// Creates an unstarted session with a fresh id.
    pub fn new(log: Box<dyn SessionLog>) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), log)
    }

    pub fn with_id(session_id: impl Into<String>, log: Box<dyn SessionLog>) -> Self {
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
            log,
            compaction_cursor: 1,
            started_at: None,
            ended_at: None,
        }
    }

    /// Initializes the log and records the preamble as message 0.
    ///
    /// Calling this on a session that already has its preamble is a no-op.
    pub async fn start(&mut self, preamble: &str) -> Result<()> {
        if !self.messages.is_empty() || self.ended_at.is_some() {
            tracing::warn!(session_id = %self.session_id, "Session already started; ignoring restart");
            return Ok(());
        }

        let message = Message::new(SYSTEM_SENDER, SenderRole::System, preamble)?;

        if self.started_at.is_none() {
            let start_time = Utc::now();
            self.log.initialize(&self.session_id, start_time).await?;
            self.started_at = Some(start_time);
            tracing::info!(
                session_id = %self.session_id,
                location = %self.log.location(),
                "Session log initialized"
            );
        }

        self.push(message).await?;
        Ok(())
    }

    /// Appends one turn and returns the stored message.
    ///
    /// # Errors
    ///
    /// - `ParleyError::Validation` when a field is empty, the role is unknown,
    ///   or the session is not active
    /// - `ParleyError::Persistence` when the log write fails; the message is
    ///   then not appended
    pub async fn append_turn(
        &mut self,
        sender_name: &str,
        sender_role: &str,
        content: &str,
    ) -> Result<&Message> {
        let role: SenderRole = sender_role.parse()?;
        let message = Message::new(sender_name, role, content)?;
        self.ensure_active()?;
        self.push(message).await
    }

    /// Returns `{role, content}` for every message, in order.
    pub fn build_generation_view(&self) -> Vec<GenerationMessage> {
        self.messages.iter().map(GenerationMessage::from).collect()
    }

    /// Runs one compaction step if enough messages accumulated past the cursor.
    ///
    /// On summarization failure nothing changes. A persistence failure while
    /// recording a summary stops the step; summaries already recorded stay
    /// applied, and the cursor does not move.
    pub async fn maybe_compact(&mut self, policy: &CompactionPolicy) -> Result<CompactionReport> {
        let Some(range) = policy.scan_range(self.messages.len(), self.compaction_cursor) else {
            return Ok(CompactionReport::Skipped);
        };

        tracing::debug!(
            session_id = %self.session_id,
            start = range.start,
            end = range.end,
            "Processing compaction range"
        );

        let batch = policy.select(&self.messages, range.clone());
        let mut summarized = 0;

        if !batch.is_empty() {
            let summaries = policy.summarize(batch).await?;
            for summary in summaries {
                let index = summary.original_index;
                let mut record = PersistedLogRecord::from_message(index, &self.messages[index]);
                record.content = summary.summary_text;

                self.log.update(index, &record).await?;
                self.messages[index].content = record.content;
                summarized += 1;
            }
        }

        self.compaction_cursor = range.end;
        tracing::debug!(
            session_id = %self.session_id,
            summarized,
            cursor = self.compaction_cursor,
            "Compaction step finished"
        );

        Ok(CompactionReport::Completed {
            scanned: range,
            summarized,
        })
    }

    /// Records the end of the session; later turns are rejected.
    pub async fn end(&mut self) -> Result<()> {
        if self.ended_at.is_some() {
            return Ok(());
        }
        self.ensure_active()?;

        let end_time = Utc::now();
        self.log.close(end_time).await?;
        self.ended_at = Some(end_time);
        tracing::info!(session_id = %self.session_id, messages = self.messages.len(), "Session ended");
        Ok(())
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn compaction_cursor(&self) -> usize {
        self.compaction_cursor
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// True once the preamble is recorded and until the session ends.
    pub fn is_active(&self) -> bool {
        !self.messages.is_empty() && self.ended_at.is_none()
    }

    pub fn log_location(&self) -> String {
        self.log.location()
    }

    fn ensure_active(&self) -> Result<()> {
        if self.ended_at.is_some() {
            return Err(ParleyError::validation("session has ended"));
        }
        if self.messages.is_empty() {
            return Err(ParleyError::validation("session has not been started"));
        }
        Ok(())
    }

    async fn push(&mut self, message: Message) -> Result<&Message> {
        let message_number = self.messages.len();
        let record = PersistedLogRecord::from_message(message_number, &message);
        self.log.append(&record).await?;

        tracing::debug!(
            session_id = %self.session_id,
            message_number,
            role = %message.sender_role,
            "Message appended"
        );
        self.messages.push(message);
        Ok(&self.messages[message_number])
    }
}
