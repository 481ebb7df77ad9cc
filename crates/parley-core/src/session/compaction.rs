//! Compaction policy.
//!
//! Compaction replaces the content of long, no-longer-recent messages with a
//! machine-generated summary so that the prompt sent on every turn stays
//! bounded. The policy decides *when* a pass runs and *which* messages
//! qualify; [`SessionState::maybe_compact`](super::SessionState::maybe_compact)
//! applies the results.

use crate::backend::{SummarizationBackend, SummaryBounds, SummaryRequest, SummaryResult, TokenCounter};
use crate::error::{ParleyError, Result};
use crate::message::Message;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Tunables of the compaction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactionConfig {
    /// How many messages past the cursor trigger a pass
    pub interval: usize,
    /// How many of the latest messages a pass never touches
    pub recent_skip: usize,
    /// Token length a message must exceed to be summarized
    pub length_threshold: usize,
    /// Length bounds handed to the summarization backend
    pub summary_bounds: SummaryBounds,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            interval: 8,
            recent_skip: 4,
            length_threshold: 130,
            summary_bounds: SummaryBounds::default(),
        }
    }
}

/// What a call to `maybe_compact` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompactionReport {
    /// Fewer than `interval` messages accumulated past the cursor.
    Skipped,
    /// A pass ran over `scanned` and replaced `summarized` messages.
    Completed {
        scanned: Range<usize>,
        summarized: usize,
    },
}

/// Decides which messages qualify for summarization and runs the batch call.
pub struct CompactionPolicy {
    config: CompactionConfig,
    summarizer: Arc<dyn SummarizationBackend>,
    token_counter: Arc<dyn TokenCounter>,
    deadline: Option<Duration>,
}

impl CompactionPolicy {
    pub fn new(
        config: CompactionConfig,
        summarizer: Arc<dyn SummarizationBackend>,
        token_counter: Arc<dyn TokenCounter>,
    ) -> Self {
        Self {
            config,
            summarizer,
            token_counter,
            deadline: None,
        }
    }

    /// Bounds every summarization call; expiry fails the pass with `Timeout`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn config(&self) -> &CompactionConfig {
        &self.config
    }

    /// Returns the range a pass should scan, or `None` when no pass is due.
    ///
    /// The range is `[cursor, len - recent_skip)`; it is empty (but a pass is
    /// still due) when the session is shorter than the recent window.
    pub fn scan_range(&self, len: usize, cursor: usize) -> Option<Range<usize>> {
        if len.saturating_sub(cursor) < self.config.interval {
            return None;
        }

        let end = len.saturating_sub(self.config.recent_skip).max(cursor);
        Some(cursor..end)
    }

    /// Collects the messages in `range` whose token length exceeds the threshold.
    pub fn select(&self, messages: &[Message], range: Range<usize>) -> Vec<SummaryRequest> {
        messages[range.clone()]
            .iter()
            .zip(range)
            .filter(|(message, _)| {
                self.token_counter.count(&message.content) > self.config.length_threshold
            })
            .map(|(message, original_index)| SummaryRequest {
                content: message.content.clone(),
                original_index,
            })
            .collect()
    }

    /// Sends one batch to the summarization backend and checks the reply.
    ///
    /// # Errors
    ///
    /// - `ParleyError::Summarization` when the backend fails or its reply does
    ///   not correspond one-to-one with the requested indices
    /// - `ParleyError::Timeout` when the deadline expires
    pub async fn summarize(&self, batch: Vec<SummaryRequest>) -> Result<Vec<SummaryResult>> {
        let requested: BTreeSet<usize> = batch.iter().map(|r| r.original_index).collect();
        let started = Instant::now();

        tracing::debug!(entries = batch.len(), "Batching data for summary");
        let call = self.summarizer.summarize(batch, self.config.summary_bounds);
        let summaries = match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, call)
                .await
                .map_err(|_| ParleyError::timeout("summarizing messages", deadline))??,
            None => call.await?,
        };
        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Summarizer finished"
        );

        check_correspondence(&requested, &summaries)?;
        Ok(summaries)
    }
}

fn check_correspondence(requested: &BTreeSet<usize>, summaries: &[SummaryResult]) -> Result<()> {
    if summaries.len() != requested.len() {
        return Err(ParleyError::summarization(format!(
            "expected {} summaries, backend returned {}",
            requested.len(),
            summaries.len()
        )));
    }

    let mut seen = BTreeSet::new();
    for summary in summaries {
        if !requested.contains(&summary.original_index) {
            return Err(ParleyError::summarization(format!(
                "backend returned a summary for unrequested index {}",
                summary.original_index
            )));
        }
        if !seen.insert(summary.original_index) {
            return Err(ParleyError::summarization(format!(
                "backend returned index {} more than once",
                summary.original_index
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::SenderRole;
    use async_trait::async_trait;

    struct WordCounter;

    impl TokenCounter for WordCounter {
        fn count(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }
    }

    struct EchoSummarizer;

    #[async_trait]
    impl SummarizationBackend for EchoSummarizer {
        async fn summarize(
            &self,
            batch: Vec<SummaryRequest>,
            _bounds: SummaryBounds,
        ) -> Result<Vec<SummaryResult>> {
            Ok(batch
                .into_iter()
                .map(|r| SummaryResult {
                    original_index: r.original_index,
                    summary_text: "short".to_string(),
                })
                .collect())
        }
    }

    fn policy() -> CompactionPolicy {
        CompactionPolicy::new(
            CompactionConfig::default(),
            Arc::new(EchoSummarizer),
            Arc::new(WordCounter),
        )
    }

    #[test]
    fn scan_range_waits_for_interval() {
        let policy = policy();
        assert_eq!(policy.scan_range(8, 1), None);
        assert_eq!(policy.scan_range(9, 1), Some(1..5));
        assert_eq!(policy.scan_range(20, 5), Some(5..16));
    }

    #[test]
    fn scan_range_never_moves_before_cursor() {
        let config = CompactionConfig {
            interval: 2,
            recent_skip: 6,
            ..CompactionConfig::default()
        };
        let policy = CompactionPolicy::new(config, Arc::new(EchoSummarizer), Arc::new(WordCounter));
        assert_eq!(policy.scan_range(5, 1), Some(1..1));
    }

    #[test]
    fn select_uses_strict_threshold() {
        let config = CompactionConfig {
            length_threshold: 3,
            ..CompactionConfig::default()
        };
        let policy = CompactionPolicy::new(config, Arc::new(EchoSummarizer), Arc::new(WordCounter));
        let messages: Vec<Message> = ["zero", "one two three", "one two three four", "a b c d e"]
            .iter()
            .map(|text| Message::new("Ada", SenderRole::User, *text).unwrap())
            .collect();

        let selected = policy.select(&messages, 1..4);
        let indices: Vec<usize> = selected.iter().map(|r| r.original_index).collect();
        assert_eq!(indices, vec![2, 3]);
    }

    #[test]
    fn correspondence_rejects_mismatches() {
        let requested: BTreeSet<usize> = [2, 3].into_iter().collect();
        let result = |i: usize| SummaryResult {
            original_index: i,
            summary_text: String::new(),
        };

        assert!(check_correspondence(&requested, &[result(3), result(2)]).is_ok());
        assert!(check_correspondence(&requested, &[result(2)]).is_err());
        assert!(check_correspondence(&requested, &[result(2), result(4)]).is_err());
        assert!(check_correspondence(&requested, &[result(2), result(2)]).is_err());
    }
}
