// tests/research_engine_test.rs
// Fallback orchestration tests: provider ordering, retry budgets,
// malformed-response advancement, and the heuristic stub path

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use partscout::research::engine::ResearchEngine;
use partscout::research::normalize::FALLBACK_CONFIDENCE_CEILING;
use partscout::research::provider::ResearchProvider;
use partscout::research::request::ProviderRequest;
use partscout::research::retry::RetryPolicy;
use partscout::research::types::{ImageAttachment, ResearchOutcome, ResearchRequest};

// ============================================================================
// Scripted provider
// ============================================================================

struct ScriptedProvider {
    name: &'static str,
    configured: bool,
    vision: bool,
    web_search: bool,
    responses: Mutex<VecDeque<Result<String, String>>>,
    calls: AtomicU32,
}

impl ScriptedProvider {
    fn new(name: &'static str, responses: Vec<Result<String, String>>) -> Self {
        Self {
            name,
            configured: true,
            vision: false,
            web_search: false,
            responses: Mutex::new(responses.into_iter().collect()),
            calls: AtomicU32::new(0),
        }
    }

    fn with_vision(mut self) -> Self {
        self.vision = true;
        self
    }

    fn with_web_search(mut self) -> Self {
        self.web_search = true;
        self
    }

    fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResearchProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    fn supports_vision(&self) -> bool {
        self.vision
    }

    fn supports_web_search(&self) -> bool {
        self.web_search
    }

    async fn call(&self, _request: &ProviderRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("script exhausted")),
        }
    }
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
    }
}

fn text_request(description: &str) -> ResearchRequest {
    ResearchRequest {
        description: Some(description.to_string()),
        ..Default::default()
    }
}

fn valid_json(name: &str, category: &str, confidence: f64) -> Result<String, String> {
    Ok(format!(
        "{{\"name\": \"{name}\", \"category\": \"{category}\", \"confidence\": {confidence}}}"
    ))
}

// ============================================================================
// Direct path
// ============================================================================

#[tokio::test]
async fn test_direct_success_keeps_reported_confidence() {
    let primary = Arc::new(
        ScriptedProvider::new("search", vec![valid_json("NE555P", "IC", 0.9)]).with_web_search(),
    );
    let engine = ResearchEngine::with_providers(
        vec![primary.clone() as Arc<dyn ResearchProvider>],
        fast_retry(),
    );

    let outcome = engine.research(text_request("8-pin DIP marked NE555P")).await;
    let result = match outcome {
        ResearchOutcome::Resolved(result) => result,
        other => panic!("expected Resolved, got {other:?}"),
    };

    assert_eq!(result.name, "NE555P");
    assert_eq!(result.confidence, 0.9);
    assert!(!result.provenance.fallback);
    assert_eq!(result.provenance.provider, "search");
    assert_eq!(primary.call_count(), 1);
}

#[tokio::test]
async fn test_web_search_provider_ordered_first_for_text() {
    let general = Arc::new(ScriptedProvider::new(
        "general",
        vec![valid_json("wrong", "IC", 0.9)],
    ));
    let search = Arc::new(
        ScriptedProvider::new("search", vec![valid_json("right", "IC", 0.9)]).with_web_search(),
    );
    // Table order has the general provider first; search capability must
    // still win for text requests.
    let engine = ResearchEngine::with_providers(
        vec![
            general.clone() as Arc<dyn ResearchProvider>,
            search.clone() as Arc<dyn ResearchProvider>,
        ],
        fast_retry(),
    );

    let result = engine.research(text_request("some part")).await.into_result();
    assert_eq!(result.name, "right");
    assert_eq!(general.call_count(), 0);
    assert_eq!(search.call_count(), 1);
}

// ============================================================================
// Fallback path
// ============================================================================

#[tokio::test]
async fn test_secondary_success_after_primary_retries_exhausted() {
    let primary = Arc::new(
        ScriptedProvider::new(
            "search",
            vec![
                Err("503 upstream".to_string()),
                Err("503 upstream".to_string()),
                Err("503 upstream".to_string()),
            ],
        )
        .with_web_search(),
    );
    let secondary = Arc::new(ScriptedProvider::new(
        "general",
        vec![valid_json("BC547", "Transistor", 0.9)],
    ));
    let engine = ResearchEngine::with_providers(
        vec![
            primary.clone() as Arc<dyn ResearchProvider>,
            secondary.clone() as Arc<dyn ResearchProvider>,
        ],
        fast_retry(),
    );

    let outcome = engine.research(text_request("small NPN transistor")).await;
    let result = match outcome {
        ResearchOutcome::Resolved(result) => result,
        other => panic!("expected Resolved, got {other:?}"),
    };

    assert_eq!(primary.call_count(), 3, "primary consumes its retry budget");
    assert_eq!(secondary.call_count(), 1);
    assert_eq!(result.provenance.provider, "general");
    assert!(result.provenance.fallback);
    assert_eq!(result.confidence, FALLBACK_CONFIDENCE_CEILING);
    assert_eq!(result.typical_quantity, 3, "transistor default");
}

#[tokio::test]
async fn test_malformed_response_advances_without_retry() {
    let primary = Arc::new(
        ScriptedProvider::new(
            "search",
            vec![Ok("I am not sure what this component is.".to_string())],
        )
        .with_web_search(),
    );
    let secondary = Arc::new(ScriptedProvider::new(
        "general",
        vec![valid_json("DHT22", "Sensor", 0.8)],
    ));
    let engine = ResearchEngine::with_providers(
        vec![
            primary.clone() as Arc<dyn ResearchProvider>,
            secondary.clone() as Arc<dyn ResearchProvider>,
        ],
        fast_retry(),
    );

    let result = engine.research(text_request("humidity sensor")).await.into_result();

    assert_eq!(
        primary.call_count(),
        1,
        "malformed output must not be retried against the same provider"
    );
    assert_eq!(result.name, "DHT22");
    assert!(result.provenance.fallback);
}

#[tokio::test]
async fn test_field_sparse_json_treated_like_malformed() {
    let primary = Arc::new(
        ScriptedProvider::new(
            "search",
            vec![Ok("{\"description\": \"a part of some kind\"}".to_string())],
        )
        .with_web_search(),
    );
    let secondary = Arc::new(ScriptedProvider::new(
        "general",
        vec![valid_json("1N4148", "Diode", 0.7)],
    ));
    let engine = ResearchEngine::with_providers(
        vec![
            primary.clone() as Arc<dyn ResearchProvider>,
            secondary.clone() as Arc<dyn ResearchProvider>,
        ],
        fast_retry(),
    );

    let result = engine.research(text_request("small glass diode")).await.into_result();

    assert_eq!(primary.call_count(), 1);
    assert_eq!(result.name, "1N4148");
    assert_eq!(result.typical_quantity, 5, "diode default");
}

#[tokio::test]
async fn test_unconfigured_provider_skipped_without_penalty() {
    let unconfigured = Arc::new(
        ScriptedProvider::new("search", vec![]).with_web_search().unconfigured(),
    );
    let general = Arc::new(ScriptedProvider::new(
        "general",
        vec![valid_json("NE555P", "IC", 0.9)],
    ));
    let engine = ResearchEngine::with_providers(
        vec![
            unconfigured.clone() as Arc<dyn ResearchProvider>,
            general.clone() as Arc<dyn ResearchProvider>,
        ],
        fast_retry(),
    );

    let outcome = engine.research(text_request("timer IC")).await;
    let result = match outcome {
        ResearchOutcome::Resolved(result) => result,
        other => panic!("expected Resolved, got {other:?}"),
    };

    assert_eq!(unconfigured.call_count(), 0);
    assert!(
        !result.provenance.fallback,
        "a credential skip is not a failed attempt"
    );
    assert_eq!(result.confidence, 0.9);
}

// ============================================================================
// Modality routing
// ============================================================================

#[tokio::test]
async fn test_image_request_routes_to_vision_provider_only() {
    let text_only = Arc::new(ScriptedProvider::new("search", vec![]).with_web_search());
    let vision = Arc::new(
        ScriptedProvider::new("vision", vec![valid_json("WS2812B", "LED", 0.85)]).with_vision(),
    );
    let engine = ResearchEngine::with_providers(
        vec![
            text_only.clone() as Arc<dyn ResearchProvider>,
            vision.clone() as Arc<dyn ResearchProvider>,
        ],
        fast_retry(),
    );

    let request = ResearchRequest {
        image: Some(ImageAttachment {
            file_name: Some("board.jpg".to_string()),
            media_type: None,
            bytes: vec![0xff, 0xd8, 0xff],
        }),
        ..Default::default()
    };
    let outcome = engine.research(request).await;
    let result = match outcome {
        ResearchOutcome::Resolved(result) => result,
        other => panic!("expected Resolved, got {other:?}"),
    };

    assert_eq!(text_only.call_count(), 0, "no cross-modality fallback");
    assert_eq!(vision.call_count(), 1);
    assert_eq!(result.name, "WS2812B");
    assert!(!result.provenance.fallback);
}

// ============================================================================
// Terminal fallback
// ============================================================================

#[tokio::test]
async fn test_all_providers_exhausted_yields_heuristic_stub() {
    let primary = Arc::new(
        ScriptedProvider::new(
            "search",
            vec![
                Err("timeout".to_string()),
                Err("timeout".to_string()),
                Err("timeout".to_string()),
            ],
        )
        .with_web_search(),
    );
    let secondary = Arc::new(ScriptedProvider::new(
        "general",
        vec![Ok("Name: LM7805\nIt looks like a linear regulator but I cannot say more.".to_string())],
    ));
    let engine = ResearchEngine::with_providers(
        vec![
            primary.clone() as Arc<dyn ResearchProvider>,
            secondary.clone() as Arc<dyn ResearchProvider>,
        ],
        fast_retry(),
    );

    let outcome = engine.research(text_request("three-legged regulator")).await;
    let (result, error) = match outcome {
        ResearchOutcome::Degraded { result, error } => (result, error),
        other => panic!("expected Degraded, got {other:?}"),
    };

    assert_eq!(result.name, "LM7805", "scraped from the last raw text");
    assert_eq!(result.confidence, 0.3);
    assert!(result.provenance.fallback);
    assert_eq!(result.provenance.provider, "heuristic");
    assert!(error.contains("search"), "aggregate names the failed providers: {error}");
    assert!(error.contains("general"), "aggregate names the failed providers: {error}");
}

#[tokio::test]
async fn test_no_usable_providers_still_returns_stub() {
    let unconfigured = Arc::new(ScriptedProvider::new("search", vec![]).unconfigured());
    let engine = ResearchEngine::with_providers(
        vec![unconfigured as Arc<dyn ResearchProvider>],
        fast_retry(),
    );

    let outcome = engine.research(text_request("mystery part")).await;
    assert!(outcome.is_degraded());
    let result = outcome.into_result();
    assert_eq!(result.name, "Unknown Component");
    assert_eq!(result.category, "Unknown");
    assert_eq!(result.confidence, 0.3);
    assert!(result.tags.is_empty());
    assert!(result.safety_warnings.is_empty());
}
