pub mod backend;
pub mod error;
pub mod message;
pub mod persona;
pub mod preset;
pub mod prompt;
pub mod repository;
pub mod response;
pub mod scene;
pub mod session;
pub mod user;

// Re-export common error type
pub use error::{ParleyError, Result};
