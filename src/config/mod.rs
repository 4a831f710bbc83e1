// src/config/mod.rs
// Engine configuration loaded from the environment / .env
//
// Unlike a process-global static, the config is an explicit value handed to
// the engine constructor, so tests and callers can override per instance.

use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct ResearchConfig {
    // ── Provider credentials & models
    pub perplexity_api_key: Option<String>,
    pub perplexity_model: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,

    // ── Retry / timeout budget
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub request_timeout: u64,

    // ── Token budgets per mode
    pub quick_max_tokens: usize,
    pub research_max_tokens: usize,
}

// Handles values with trailing comments and extra whitespace.
fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean_val = val.split('#').next().unwrap_or("").trim();
            match clean_val.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    eprintln!("Config: {} = '{}' (parse failed, using default)", key, val);
                    default
                }
            }
        }
        Err(_) => default,
    }
}

fn env_var_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

impl ResearchConfig {
    pub fn from_env() -> Self {
        if dotenvy::dotenv().is_err() {
            eprintln!("Warning: .env file not found. Using environment variables and defaults.");
        }

        Self {
            perplexity_api_key: env_var_opt("PERPLEXITY_API_KEY"),
            perplexity_model: env_var_or("PERPLEXITY_MODEL", "sonar-pro".to_string()),
            openai_api_key: env_var_opt("OPENAI_API_KEY"),
            openai_base_url: env_var_or(
                "OPENAI_BASE_URL",
                "https://api.openai.com/v1".to_string(),
            ),
            openai_model: env_var_or("OPENAI_MODEL", "gpt-4o".to_string()),
            max_retries: env_var_or("RESEARCH_MAX_RETRIES", 3),
            retry_base_delay_ms: env_var_or("RESEARCH_RETRY_BASE_DELAY_MS", 500),
            request_timeout: env_var_or("RESEARCH_REQUEST_TIMEOUT", 45),
            quick_max_tokens: env_var_or("RESEARCH_QUICK_MAX_TOKENS", 600),
            research_max_tokens: env_var_or("RESEARCH_MAX_TOKENS", 2000),
        }
    }

    /// True when at least one provider has credentials
    pub fn any_provider_configured(&self) -> bool {
        self.perplexity_api_key.is_some() || self.openai_api_key.is_some()
    }
}
