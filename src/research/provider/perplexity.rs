// src/research/provider/perplexity.rs
// Perplexity Sonar provider (OpenAI-compatible API, live web search, text-only)

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use super::ResearchProvider;
use crate::research::request::{ContentPart, ProviderRequest};

pub struct PerplexityProvider {
    client: Client,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
}

impl PerplexityProvider {
    pub fn new(api_key: Option<String>, model: String, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            timeout,
        }
    }
}

#[async_trait]
impl ResearchProvider for PerplexityProvider {
    fn name(&self) -> &'static str {
        "perplexity"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn supports_web_search(&self) -> bool {
        true
    }

    async fn call(&self, request: &ProviderRequest) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("Perplexity API key not configured"))?;
        if request.has_image() {
            return Err(anyhow!("perplexity does not accept image content"));
        }

        let user_text = request
            .content
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text(text) => Some(text.as_str()),
                ContentPart::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": user_text},
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        debug!("Perplexity request: model={}", self.model);

        let response = self
            .client
            .post("https://api.perplexity.ai/chat/completions")
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("Perplexity API error {}: {}", status, error_text));
        }

        let raw_response = response.json::<Value>().await?;

        let content = raw_response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow!("No content in Perplexity response"))?
            .to_string();

        Ok(content)
    }
}
