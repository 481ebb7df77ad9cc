//! User domain module.
//!
//! # Module Structure
//!
//! - `model`: User profile (`UserProfile`), feature toggles, and the file that holds both
//!
//! # Usage
//!
//! ```ignore
//! use parley_core::user::{UserConfig, UserProfile, FeatureFlags};
//! ```

mod model;

// Re-export public API
pub use model::{FeatureFlags, UserConfig, UserProfile};
