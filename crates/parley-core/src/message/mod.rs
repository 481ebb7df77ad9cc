//! Message domain module.
//!
//! # Module Structure
//!
//! - `model`: One utterance record (`Message`) and its sender role (`SenderRole`)
//! - `view`: The `{role, content}` projection handed to generation backends
//!
//! # Usage
//!
//! ```ignore
//! use parley_core::message::{Message, SenderRole, GenerationMessage};
//! ```

mod model;
mod view;

// Re-export public API
pub use model::{Message, SenderRole};
pub use view::GenerationMessage;
