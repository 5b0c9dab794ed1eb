//! Configuration management for promptcraft
//!
//! Settings come from TOML files layered over built-in defaults; see
//! [`ConfigLoader`] for the lookup order.

pub mod loader;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{
    LlmSettings, LoggingSettings, PromptCraftConfig, RetrySettings, WorkflowSettings,
    API_KEY_ENV,
};
