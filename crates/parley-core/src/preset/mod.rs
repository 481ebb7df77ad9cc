//! Generation preset module.
//!
//! A preset bundles the decoding parameters used for every generation call in
//! a session together with the task description placed in the preamble.
//!
//! # Module Structure
//!
//! - `model`: `GenerationPreset` and `DecodingParameters`
//! - `table`: `PresetTable`, the keyed store resolved once at session start
//!
//! # Usage
//!
//! ```ignore
//! use parley_core::preset::{GenerationPreset, DecodingParameters, PresetTable};
//! ```

mod model;
mod table;

// Re-export public API
pub use model::{DecodingParameters, GenerationPreset};
pub use table::PresetTable;
