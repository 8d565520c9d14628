use async_trait::async_trait;
use tracing::debug;

use crate::{
    error::{PrecisError, Result},
    format::preview,
};

pub struct ProviderConfig {
    pub api_base: &'static str,
    pub model: &'static str,
    pub max_tokens: u32,
}

pub const OPENAI: ProviderConfig = ProviderConfig {
    api_base: "https://api.openai.com",
    model: "gpt-4o-mini",
    max_tokens: 256,
};

/// A model that turns one prompt into one completion.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// OpenAI chat-completions client used as a plain text completer.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            api_base: OPENAI.api_base.to_string(),
            model: OPENAI.model.to_string(),
            temperature: 0.0,
            max_tokens: OPENAI.max_tokens,
        }
    }

    pub fn with_base_url(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.api_base);
        debug!(model = %self.model, prompt = %preview(prompt, 80), "Requesting completion");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": self.model,
                "messages": [
                    {
                        "role": "user",
                        "content": prompt,
                    },
                ],
                "temperature": self.temperature,
                "max_tokens": self.max_tokens,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PrecisError::HttpStatus {
                url,
                status: response.status().as_u16(),
            });
        }

        let response = response.json::<serde_json::Value>().await?;

        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| PrecisError::InvalidResponse {
                reason: format!("missing completion content: {response}"),
            })?;

        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_deterministic() {
        let client = OpenAiClient::new("sk-test");
        assert_eq!(client.temperature(), 0.0);
        assert_eq!(client.model, "gpt-4o-mini");
        assert_eq!(client.api_base, "https://api.openai.com");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = OpenAiClient::new("sk-test").with_base_url("http://localhost:1234/");
        assert_eq!(client.api_base, "http://localhost:1234");
    }
}
