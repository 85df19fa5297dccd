use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;

use super::types::CoachError;

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Trait for LLM providers. Each provider takes a system prompt + user
/// message and returns the assistant's reply text, verbatim.
pub trait LlmProvider: Send + Sync {
    /// Send a prompt to the LLM and return the response text.
    fn ask<'a>(
        &'a self,
        system_prompt: &'a str,
        user_message: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, CoachError>> + Send + 'a>>;

    /// Provider name for logging / feedback metadata.
    fn name(&self) -> &str;
}

/// Response budget for coaching replies.
const MAX_TOKENS: u32 = 1024;

// ---------------------------------------------------------------------------
// Anthropic provider
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AnthropicProvider {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    system: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    text: String,
}

impl AnthropicProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, CoachError> {
        if config.api_key.is_empty() {
            return Err(CoachError::MissingApiKey("anthropic".to_string()));
        }
        Ok(Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
            client: reqwest::Client::new(),
        })
    }
}

impl LlmProvider for AnthropicProvider {
    fn ask<'a>(
        &'a self,
        system_prompt: &'a str,
        user_message: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, CoachError>> + Send + 'a>> {
        Box::pin(async move {
            let body = AnthropicRequest {
                model: self.model.clone(),
                system: system_prompt.to_string(),
                messages: vec![AnthropicMessage {
                    role: "user".to_string(),
                    content: user_message.to_string(),
                }],
                max_tokens: MAX_TOKENS,
            };

            let resp = self
                .client
                .post(&self.endpoint)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01")
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await
                .map_err(|e| CoachError::RequestFailed(e.to_string()))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                return Err(CoachError::ProviderError(format!(
                    "anthropic returned {}: {}",
                    status, text
                )));
            }

            let parsed: AnthropicResponse = resp
                .json()
                .await
                .map_err(|e| CoachError::ParseError(e.to_string()))?;

            parsed
                .content
                .first()
                .map(|c| c.text.clone())
                .ok_or_else(|| CoachError::ParseError("empty content array".to_string()))
        })
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

// ---------------------------------------------------------------------------
// OpenAI-compatible provider
// ---------------------------------------------------------------------------

/// Works with any OpenAI-compatible chat-completions API.
#[derive(Debug)]
pub struct OpenAiCompatible {
    pub provider_name: String,
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize, Deserialize, Clone)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

impl OpenAiCompatible {
    pub fn new(provider_name: &str, config: &ProviderConfig) -> Result<Self, CoachError> {
        if config.api_key.is_empty() {
            return Err(CoachError::MissingApiKey(provider_name.to_string()));
        }
        Ok(Self {
            provider_name: provider_name.to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
            client: reqwest::Client::new(),
        })
    }
}

impl LlmProvider for OpenAiCompatible {
    fn ask<'a>(
        &'a self,
        system_prompt: &'a str,
        user_message: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, CoachError>> + Send + 'a>> {
        Box::pin(async move {
            let body = OpenAiRequest {
                model: self.model.clone(),
                messages: vec![
                    OpenAiMessage {
                        role: "system".to_string(),
                        content: system_prompt.to_string(),
                    },
                    OpenAiMessage {
                        role: "user".to_string(),
                        content: user_message.to_string(),
                    },
                ],
                max_tokens: MAX_TOKENS,
                temperature: 0.7,
            };

            let resp = self
                .client
                .post(&self.endpoint)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await
                .map_err(|e| CoachError::RequestFailed(e.to_string()))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                return Err(CoachError::ProviderError(format!(
                    "{} returned {}: {}",
                    self.provider_name, status, text
                )));
            }

            let parsed: OpenAiResponse = resp
                .json()
                .await
                .map_err(|e| CoachError::ParseError(e.to_string()))?;

            parsed
                .choices
                .first()
                .map(|c| c.message.content.clone())
                .ok_or_else(|| CoachError::ParseError("empty choices array".to_string()))
        })
    }

    fn name(&self) -> &str {
        &self.provider_name
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Create an LLM provider from a provider name and config.
pub fn create_provider(
    name: &str,
    config: &ProviderConfig,
) -> Result<Box<dyn LlmProvider>, CoachError> {
    match name {
        "anthropic" => Ok(Box::new(AnthropicProvider::new(config)?)),
        "openai" => Ok(Box::new(OpenAiCompatible::new(name, config)?)),
        other => Err(CoachError::UnsupportedProvider(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anthropic_rejects_empty_key() {
        let cfg = ProviderConfig {
            api_key: String::new(),
            model: "claude-sonnet-4-20250514".to_string(),
            endpoint: "https://api.anthropic.com/v1/messages".to_string(),
        };
        let result = AnthropicProvider::new(&cfg);
        assert!(matches!(result, Err(CoachError::MissingApiKey(_))));
    }

    #[test]
    fn openai_compatible_rejects_empty_key() {
        let cfg = ProviderConfig {
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
        };
        assert!(OpenAiCompatible::new("openai", &cfg).is_err());
    }

    #[test]
    fn factory_creates_anthropic() {
        let cfg = ProviderConfig {
            api_key: "sk-ant-test".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            endpoint: "https://api.anthropic.com/v1/messages".to_string(),
        };
        let p = create_provider("anthropic", &cfg).unwrap();
        assert_eq!(p.name(), "anthropic");
    }

    #[test]
    fn factory_creates_openai() {
        let cfg = ProviderConfig {
            api_key: "sk-test".to_string(),
            model: "gpt-4o-mini".to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
        };
        let p = create_provider("openai", &cfg).unwrap();
        assert_eq!(p.name(), "openai");
    }

    #[test]
    fn factory_rejects_unknown() {
        let cfg = ProviderConfig {
            api_key: "key".to_string(),
            model: "model".to_string(),
            endpoint: "https://example.com".to_string(),
        };
        assert!(matches!(
            create_provider("gemini", &cfg),
            Err(CoachError::UnsupportedProvider(_))
        ));
    }
}
