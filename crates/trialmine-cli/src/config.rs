//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use trialmine_extractor::ExtractorConfig;

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding checkpoint files; `~/` expands to the home directory
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: String,

    /// Oracle connection
    #[serde(default)]
    pub oracle: OracleSettings,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// Extraction engine settings
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

/// Which oracle backend answers prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI-compatible chat completions
    OpenAi,
    /// Local Ollama server
    Ollama,
    /// Offline stand-in that finds nothing
    Mock,
}

/// Oracle connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleSettings {
    /// Backend
    #[serde(default = "default_provider")]
    pub provider: Provider,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL; the provider's default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Attempts per oracle call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".trialmine").join("config.toml"))
    }

    /// Resolve an explicit path or fall back to the default one.
    pub fn resolve_path(explicit: Option<&str>) -> Result<PathBuf> {
        match explicit {
            Some(path) => Ok(PathBuf::from(path)),
            None => Self::path(),
        }
    }

    /// Load configuration from the default location, or defaults when absent.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load configuration from `path`, or defaults when the file is absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Checkpoint directory with `~/` expanded.
    pub fn checkpoint_path(&self) -> PathBuf {
        match (self.checkpoint_dir.strip_prefix("~/"), dirs::home_dir()) {
            (Some(rest), Some(home)) => home.join(rest),
            _ => PathBuf::from(&self.checkpoint_dir),
        }
    }

    /// Check the settings that would otherwise fail mid-run.
    pub fn validate(&self) -> Result<()> {
        if self.checkpoint_dir.trim().is_empty() {
            return Err(CliError::Config("checkpoint_dir must not be empty".into()));
        }
        if self.oracle.model.trim().is_empty() && self.oracle.provider != Provider::Mock {
            return Err(CliError::Config("oracle.model must not be empty".into()));
        }
        self.extractor.validate().map_err(CliError::Config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            checkpoint_dir: default_checkpoint_dir(),
            oracle: OracleSettings::default(),
            settings: Settings::default(),
            extractor: ExtractorConfig::default(),
        }
    }
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            endpoint: None,
            api_key_env: default_api_key_env(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_checkpoint_dir() -> String {
    "~/.trialmine/checkpoints".to_string()
}

fn default_provider() -> Provider {
    Provider::OpenAi
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.oracle.provider, Provider::OpenAi);
        assert_eq!(config.oracle.api_key_env, "OPENAI_API_KEY");
        assert!(config.settings.color);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_takes_defaults() {
        let config: Config = toml::from_str(
            r#"
            checkpoint_dir = "/data/checkpoints"

            [oracle]
            provider = "ollama"
            model = "llama3"

            [extractor]
            target_chunk_size = 12000
            "#,
        )
        .unwrap();

        assert_eq!(config.oracle.provider, Provider::Ollama);
        assert_eq!(config.oracle.model, "llama3");
        assert_eq!(config.oracle.max_retries, 3);
        assert_eq!(config.extractor.target_chunk_size, 12000);
        assert_eq!(config.settings.format, OutputFormat::Table);
        assert_eq!(config.checkpoint_path(), PathBuf::from("/data/checkpoints"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.oracle.provider = Provider::Mock;
        config.settings.format = OutputFormat::Json;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.oracle.provider, Provider::Mock);
        assert_eq!(loaded.settings.format, OutputFormat::Json);
        assert_eq!(loaded.extractor, config.extractor);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.checkpoint_dir, "~/.trialmine/checkpoints");
    }

    #[test]
    fn test_invalid_extractor_settings_rejected() {
        let mut config = Config::default();
        config.extractor.target_chunk_size = 0;
        assert!(matches!(config.validate(), Err(CliError::Config(_))));
    }

    #[test]
    fn test_empty_model_rejected() {
        let mut config = Config::default();
        config.oracle.model = "  ".into();
        assert!(config.validate().is_err());

        config.oracle.provider = Provider::Mock;
        assert!(config.validate().is_ok());
    }
}
