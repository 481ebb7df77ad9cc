//! Application layer: runs dialogue sessions against configured backends.

pub mod factory;
pub mod orchestrator;

pub use factory::SessionFactory;
pub use orchestrator::{SessionOrchestrator, SessionRequest, SessionServices, TurnReply};
