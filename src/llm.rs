use crate::error::{NbError, Result};
use async_trait::async_trait;

/// A single-attempt text completion endpoint.
///
/// The pipeline treats every call as one blocking round-trip with no retry;
/// the only recovery path is the caller-local fallback. Implemented by
/// [`LlmClient`] in production and by mock models in tests.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, prompt: &str, temperature: f64, max_tokens: u32) -> Result<String>;
}

/// OpenAI-compatible chat completions client.
///
/// Credentials are injected at construction so concurrent generation runs
/// with different keys stay independent.
#[derive(Clone)]
pub struct LlmClient {
    api_key: String,
    base_url: String,
    model: String,
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, "https://api.openai.com/v1".to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            model: "gpt-4".to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }
}

#[async_trait]
impl CompletionModel for LlmClient {
    async fn complete(&self, prompt: &str, temperature: f64, max_tokens: u32) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "temperature": temperature,
            "max_tokens": max_tokens
        });

        let response = self
            .http
            .post(&format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| NbError::Llm(format!("LLM API call failed: {}", e)))?;

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| NbError::Llm(format!("Failed to parse LLM response: {}", e)))?;

        let content = response_json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| NbError::Llm("No content in LLM response".to_string()))?;

        Ok(content.to_string())
    }
}
