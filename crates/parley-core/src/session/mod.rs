//! Session domain: state, durable log contract, and compaction.

pub mod compaction;
pub mod log;
pub mod memory;
pub mod state;

pub use compaction::{CompactionConfig, CompactionPolicy, CompactionReport};
pub use log::{LogSnapshot, PersistedLogRecord, SessionLog};
pub use memory::MemorySessionLog;
pub use state::{SYSTEM_SENDER, SessionState};
