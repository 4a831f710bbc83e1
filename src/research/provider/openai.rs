// src/research/provider/openai.rs
// OpenAI chat-completions provider; the general-purpose and vision backend

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use super::ResearchProvider;
use crate::research::request::{ContentPart, ProviderRequest};

pub struct OpenAiProvider {
    client: Client,
    api_key: Option<String>,
    api_base: String,
    model: String,
    timeout: Duration,
}

impl OpenAiProvider {
    pub fn new(
        api_key: Option<String>,
        api_base: String,
        model: String,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_base,
            model,
            timeout,
        }
    }
}

#[async_trait]
impl ResearchProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn supports_vision(&self) -> bool {
        true
    }

    async fn call(&self, request: &ProviderRequest) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("OpenAI API key not configured"))?;

        // Multi-part user content: text plus data-URL images
        let parts: Vec<Value> = request
            .content
            .iter()
            .map(|part| match part {
                ContentPart::Text(text) => json!({"type": "text", "text": text}),
                ContentPart::Image {
                    media_type,
                    base64_data,
                } => json!({
                    "type": "image_url",
                    "image_url": {"url": format!("data:{};base64,{}", media_type, base64_data)}
                }),
            })
            .collect();

        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": parts},
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        debug!(
            "OpenAI request: model={}, image={}",
            self.model,
            request.has_image()
        );

        let response = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.api_base.trim_end_matches('/')
            ))
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("OpenAI API error {}: {}", status, error_text));
        }

        let raw_response = response.json::<Value>().await?;

        let content = raw_response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow!("No content in OpenAI response"))?
            .to_string();

        Ok(content)
    }
}
