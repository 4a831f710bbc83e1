// src/research/engine.rs
// Provider selection, retry wrapping, and fallback orchestration
//
// Providers are tried strictly one at a time: predictable cost and simple
// fallback semantics, at the price of latency. The engine never fails past
// its boundary; the worst case is a low-confidence heuristic stub.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::ResearchConfig;

use super::error::ResearchError;
use super::heuristic;
use super::normalize::{self, PayloadOrigin};
use super::parser;
use super::provider::ResearchProvider;
use super::provider::openai::OpenAiProvider;
use super::provider::perplexity::PerplexityProvider;
use super::request::{self, RequestBudgets};
use super::retry::{self, RetryPolicy};
use super::types::{ProviderAttemptResult, ResearchOutcome, ResearchRequest};

pub struct ResearchEngine {
    providers: Vec<Arc<dyn ResearchProvider>>,
    retry: RetryPolicy,
    budgets: RequestBudgets,
}

impl ResearchEngine {
    /// Default provider table: Perplexity for web-search text research,
    /// OpenAI for vision and general fallback.
    pub fn new(config: &ResearchConfig) -> Self {
        let timeout = Duration::from_secs(config.request_timeout);
        let providers: Vec<Arc<dyn ResearchProvider>> = vec![
            Arc::new(PerplexityProvider::new(
                config.perplexity_api_key.clone(),
                config.perplexity_model.clone(),
                timeout,
            )),
            Arc::new(OpenAiProvider::new(
                config.openai_api_key.clone(),
                config.openai_base_url.clone(),
                config.openai_model.clone(),
                timeout,
            )),
        ];
        Self {
            providers,
            retry: RetryPolicy {
                max_attempts: config.max_retries,
                base_delay: Duration::from_millis(config.retry_base_delay_ms),
            },
            budgets: RequestBudgets {
                quick_max_tokens: config.quick_max_tokens,
                research_max_tokens: config.research_max_tokens,
            },
        }
    }

    /// Custom provider table, in priority order
    pub fn with_providers(providers: Vec<Arc<dyn ResearchProvider>>, retry: RetryPolicy) -> Self {
        Self {
            providers,
            retry,
            budgets: RequestBudgets::default(),
        }
    }

    /// Image requests can only go to vision-capable providers; there is no
    /// cross-modality fallback. Text requests try web-search-capable
    /// providers first, preserving table order within each class.
    fn provider_order(&self, wants_vision: bool) -> Vec<Arc<dyn ResearchProvider>> {
        if wants_vision {
            return self
                .providers
                .iter()
                .filter(|provider| provider.supports_vision())
                .cloned()
                .collect();
        }
        let mut ordered: Vec<Arc<dyn ResearchProvider>> = self
            .providers
            .iter()
            .filter(|provider| provider.supports_web_search())
            .cloned()
            .collect();
        ordered.extend(
            self.providers
                .iter()
                .filter(|provider| !provider.supports_web_search())
                .cloned(),
        );
        ordered
    }

    /// Resolve one request. Always returns a usable record; when every
    /// provider is skipped or exhausted the record is a heuristic stub and
    /// the aggregated failure summary rides along.
    pub async fn research(&self, request: ResearchRequest) -> ResearchOutcome {
        let provider_request = request::build_request(&request, self.budgets);

        let mut attempts: Vec<ProviderAttemptResult> = Vec::new();
        let mut last_raw: Option<String> = None;
        let mut prior_attempt_failed = false;

        for provider in self.provider_order(request.image.is_some()) {
            if !provider.is_configured() {
                // Skipped, not counted as a failure
                debug!(
                    "{}",
                    ResearchError::ProviderUnavailable(provider.name().to_string())
                );
                continue;
            }

            debug!("Attempting provider {}", provider.name());
            let started = Instant::now();
            let call_result =
                retry::with_backoff(self.retry, || provider.call(&provider_request)).await;
            let latency_ms = started.elapsed().as_millis() as i64;

            let raw = match call_result {
                Ok(raw) => raw,
                Err(e) => {
                    let failure = ResearchError::ProviderCallFailed {
                        provider: provider.name().to_string(),
                        message: e.to_string(),
                    };
                    warn!("{}", failure);
                    attempts.push(ProviderAttemptResult {
                        provider: provider.name().to_string(),
                        error: Some(e.to_string()),
                        latency_ms,
                        success: false,
                    });
                    prior_attempt_failed = true;
                    continue;
                }
            };

            last_raw = Some(raw.clone());

            // Malformed or field-sparse output is a provider tendency, not
            // a transient fault: advance instead of retrying the same prompt.
            let handled: Result<_, ResearchError> = parser::extract_json(&raw)
                .and_then(|payload| normalize::validate(&payload).map(|()| payload));

            match handled {
                Ok(payload) => {
                    let origin = if prior_attempt_failed {
                        PayloadOrigin::Fallback
                    } else {
                        PayloadOrigin::Direct
                    };
                    let result = normalize::normalize(payload, origin, provider.name());
                    attempts.push(ProviderAttemptResult {
                        provider: provider.name().to_string(),
                        error: None,
                        latency_ms,
                        success: true,
                    });
                    info!(
                        "Resolved \"{}\" via {} (confidence {:.2}, {}ms)",
                        result.name,
                        provider.name(),
                        result.confidence,
                        latency_ms
                    );
                    return ResearchOutcome::Resolved(result);
                }
                Err(e) => {
                    warn!("{} response unusable: {}", provider.name(), e);
                    attempts.push(ProviderAttemptResult {
                        provider: provider.name().to_string(),
                        error: Some(e.to_string()),
                        latency_ms,
                        success: false,
                    });
                    prior_attempt_failed = true;
                }
            }
        }

        let summary = if attempts.is_empty() {
            "no providers available for this request".to_string()
        } else {
            attempts
                .iter()
                .filter_map(|attempt| {
                    attempt
                        .error
                        .as_ref()
                        .map(|error| format!("{}: {}", attempt.provider, error))
                })
                .collect::<Vec<_>>()
                .join("; ")
        };
        let aggregate = ResearchError::AllProvidersExhausted(summary);
        warn!("{}; building heuristic stub", aggregate);

        let stub = heuristic::extract_stub(last_raw.as_deref(), "heuristic");
        ResearchOutcome::Degraded {
            result: stub,
            error: aggregate.to_string(),
        }
    }
}
