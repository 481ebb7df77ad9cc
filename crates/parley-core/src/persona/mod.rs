//! Persona domain module.
//!
//! # Module Structure
//!
//! - `model`: The character definition (`Persona`) and its required identity
//!
//! # Usage
//!
//! ```ignore
//! use parley_core::persona::{Persona, CoreIdentity};
//! ```

mod model;

// Re-export public API
pub use model::{CoreIdentity, Persona, PersonaHistory};
