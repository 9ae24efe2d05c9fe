//! Application configuration for structprompt.
//!
//! User config lives at `~/.structprompt/structprompt.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StructPromptError};
use crate::types::{BulletStyle, IndentationPreferences};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "structprompt.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".structprompt";

// ---------------------------------------------------------------------------
// Config structs (matching structprompt.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Rendering preferences.
    #[serde(default)]
    pub render: RenderConfig,
}

/// `[render]` section. Every field falls back to its default on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Indent width per nesting depth.
    #[serde(default = "default_spaces_per_level")]
    pub spaces_per_level: usize,

    /// Glyph styles by depth, top-level first.
    #[serde(default = "default_progression")]
    pub progression: Vec<BulletStyle>,

    /// Style used when `progression` is empty.
    #[serde(default = "default_fallback")]
    pub fallback: BulletStyle,

    /// Blank line between top-level sections.
    #[serde(default = "default_true")]
    pub blank_line_between_top: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            spaces_per_level: default_spaces_per_level(),
            progression: default_progression(),
            fallback: default_fallback(),
            blank_line_between_top: true,
        }
    }
}

fn default_spaces_per_level() -> usize {
    IndentationPreferences::default().spaces_per_level
}
fn default_progression() -> Vec<BulletStyle> {
    IndentationPreferences::default().progression
}
fn default_fallback() -> BulletStyle {
    IndentationPreferences::default().fallback
}
fn default_true() -> bool {
    true
}

impl From<&AppConfig> for IndentationPreferences {
    fn from(config: &AppConfig) -> Self {
        Self {
            spaces_per_level: config.render.spaces_per_level,
            progression: config.render.progression.clone(),
            fallback: config.render.fallback.clone(),
            blank_line_between_top: config.render.blank_line_between_top,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.structprompt/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| StructPromptError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.structprompt/structprompt.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| StructPromptError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        StructPromptError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    init_config_in(&dir)
}

/// Write a default config file into `dir`, creating it if needed.
pub fn init_config_in(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| StructPromptError::io(dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| StructPromptError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| StructPromptError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("spaces_per_level = 2"));
        assert!(toml_str.contains("\"decimal\""));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.render.spaces_per_level, 2);
        assert_eq!(parsed.render.fallback, BulletStyle::Dash);
    }

    #[test]
    fn unset_fields_default_independently() {
        let toml_str = r#"
[render]
spaces_per_level = 4
progression = ["loweralpha", "dash", "star"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        let prefs = IndentationPreferences::from(&config);
        assert_eq!(prefs.spaces_per_level, 4);
        assert_eq!(prefs.progression[0], BulletStyle::LowerAlpha);
        assert_eq!(prefs.fallback, BulletStyle::Dash);
        assert!(prefs.blank_line_between_top);
    }

    #[test]
    fn empty_file_is_default() {
        let config: AppConfig = toml::from_str("").expect("parse");
        assert_eq!(
            IndentationPreferences::from(&config),
            IndentationPreferences::default()
        );
    }

    #[test]
    fn load_and_init_from_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = init_config_in(dir.path()).expect("init");
        assert!(path.ends_with(CONFIG_FILE_NAME));

        let loaded = load_config_from(&path).expect("load");
        assert_eq!(loaded.render.progression.len(), 3);
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[render]\nspaces_per_level = \"wide\"\n").expect("write");

        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, StructPromptError::Config { .. }));
    }
}
