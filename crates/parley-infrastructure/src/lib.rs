pub mod app_config;
pub mod json_config_repository;
pub mod jsonl_session_log;
pub mod paths;

pub use crate::app_config::AppConfig;
pub use crate::json_config_repository::JsonConfigRepository;
pub use crate::jsonl_session_log::JsonlSessionLog;
pub use crate::paths::ParleyPaths;
