//! Oracle backend selected by configuration.

use crate::config::{OracleSettings, Provider};
use crate::error::Result;
use std::fmt;
use trialmine_domain::traits::FieldOracle;
use trialmine_llm::{MockOracle, OllamaOracle, OpenAiOracle, OracleError};

/// One of the supported oracle backends.
pub enum Oracle {
    /// OpenAI-compatible endpoint
    OpenAi(OpenAiOracle),
    /// Ollama server
    Ollama(OllamaOracle),
    /// Offline mock
    Mock(MockOracle),
}

impl Oracle {
    /// Build the configured backend.
    ///
    /// A missing API key is reported here, before anything is extracted.
    pub fn from_settings(settings: &OracleSettings) -> Result<Self> {
        let oracle = match settings.provider {
            Provider::OpenAi => {
                let oracle = match &settings.endpoint {
                    Some(endpoint) => {
                        let key = std::env::var(&settings.api_key_env)
                            .ok()
                            .filter(|k| !k.trim().is_empty())
                            .ok_or_else(|| OracleError::MissingCredentials(settings.api_key_env.clone()))?;
                        OpenAiOracle::new(endpoint.as_str(), settings.model.as_str(), key)?
                    }
                    None => OpenAiOracle::from_env(settings.model.as_str(), &settings.api_key_env)?,
                };
                Oracle::OpenAi(oracle.with_max_retries(settings.max_retries))
            }
            Provider::Ollama => {
                let oracle = match &settings.endpoint {
                    Some(endpoint) => OllamaOracle::new(endpoint.as_str(), settings.model.as_str())?,
                    None => OllamaOracle::default_endpoint(settings.model.as_str())?,
                };
                Oracle::Ollama(oracle.with_max_retries(settings.max_retries))
            }
            Provider::Mock => Oracle::Mock(MockOracle::default()),
        };
        Ok(oracle)
    }

    /// Backend name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Oracle::OpenAi(_) => "openai",
            Oracle::Ollama(_) => "ollama",
            Oracle::Mock(_) => "mock",
        }
    }
}

impl fmt::Debug for Oracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Oracle").field(&self.name()).finish()
    }
}

impl FieldOracle for Oracle {
    type Error = OracleError;

    fn ask(&self, prompt: &str) -> std::result::Result<String, Self::Error> {
        match self {
            Oracle::OpenAi(oracle) => oracle.ask(prompt),
            Oracle::Ollama(oracle) => oracle.ask(prompt),
            Oracle::Mock(oracle) => oracle.ask(prompt),
        }
    }
}
