//! OpenAI chat-completions oracle
//!
//! Reads its API key from the environment at construction time so a missing
//! credential is reported before any extraction work starts.

use crate::{block_on, OracleError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use trialmine_domain::traits::FieldOracle;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Default environment variable holding the key
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default model
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Oracle backed by the OpenAI chat-completions endpoint
pub struct OpenAiOracle {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
    max_retries: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl OpenAiOracle {
    /// Create an oracle with an explicit key
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, OracleError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(OracleError::MissingCredentials(DEFAULT_API_KEY_ENV.to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| OracleError::Communication(format!("Failed to build client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Create an oracle whose key is read from `key_env`
    ///
    /// Fails with [`OracleError::MissingCredentials`] when the variable is
    /// unset or empty.
    pub fn from_env(model: impl Into<String>, key_env: &str) -> Result<Self, OracleError> {
        let key = std::env::var(key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| OracleError::MissingCredentials(key_env.to_string()))?;
        Self::new(DEFAULT_BASE_URL, model, key)
    }

    /// Set the maximum number of retry attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one user message and return the assistant reply
    pub async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
        };

        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let parsed = response.json::<ChatResponse>().await.map_err(|e| {
                            OracleError::InvalidResponse(format!("Failed to parse response: {}", e))
                        })?;
                        let content = parsed
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|c| c.message.content)
                            .ok_or_else(|| {
                                OracleError::InvalidResponse("Response has no choices".to_string())
                            })?;
                        debug!("OpenAI answered with {} chars", content.len());
                        return Ok(content);
                    } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(OracleError::RateLimitExceeded);
                    } else if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(OracleError::ModelNotAvailable(self.model.clone()));
                    } else if status == reqwest::StatusCode::UNAUTHORIZED {
                        return Err(OracleError::Communication(
                            "API key rejected (HTTP 401)".to_string(),
                        ));
                    } else {
                        let error_text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Unknown error".to_string());
                        last_error = Some(OracleError::Communication(format!(
                            "HTTP {}: {}",
                            status, error_text
                        )));
                    }
                }
                Err(e) => {
                    last_error = Some(OracleError::Communication(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                warn!("OpenAI request failed, retrying in {:?}", delay);
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| OracleError::Communication("Max retries exceeded".to_string())))
    }
}

impl FieldOracle for OpenAiOracle {
    type Error = OracleError;

    fn ask(&self, prompt: &str) -> Result<String, Self::Error> {
        block_on(self.complete(prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_fails_fast() {
        let result = OpenAiOracle::from_env(DEFAULT_MODEL, "TRIALMINE_TEST_SURELY_UNSET_KEY");
        assert!(matches!(result, Err(OracleError::MissingCredentials(var)) if var == "TRIALMINE_TEST_SURELY_UNSET_KEY"));
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let result = OpenAiOracle::new(DEFAULT_BASE_URL, DEFAULT_MODEL, "  ");
        assert!(matches!(result, Err(OracleError::MissingCredentials(_))));
    }

    #[test]
    fn test_creation() {
        let oracle = OpenAiOracle::new("https://example.test/", "gpt-4o-mini", "sk-test")
            .unwrap()
            .with_max_retries(2);
        assert_eq!(oracle.base_url, "https://example.test");
        assert_eq!(oracle.model(), "gpt-4o-mini");
        assert_eq!(oracle.max_retries, 2);
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"sponsor: Acme"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("sponsor: Acme"));
    }
}
