//! Shared types, error model, and configuration for structprompt.
//!
//! This crate is the foundation depended on by all other structprompt crates.
//! It provides:
//! - [`StructPromptError`] — the unified error type
//! - Rendering vocabulary ([`BulletStyle`], [`IndentationPreferences`])
//! - Configuration ([`AppConfig`], [`RenderConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, RenderConfig, config_dir, config_file_path, init_config, init_config_in,
    load_config, load_config_from,
};
pub use error::{Result, StructPromptError};
pub use types::{BulletStyle, IndentationPreferences};
