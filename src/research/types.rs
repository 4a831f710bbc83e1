// src/research/types.rs
// Request and result types for the component research engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Research depth requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResearchMode {
    /// Abbreviated field set, smaller token budget
    Quick,
    /// Full field set, larger token budget
    #[default]
    Research,
}

/// Image supplied with a research request. Bytes are raw; wire encoding
/// happens in the request builder.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub file_name: Option<String>,
    pub media_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageAttachment {
    /// Effective media type: explicit value, then file-name guess, then jpeg
    pub fn resolved_media_type(&self) -> String {
        if let Some(media_type) = &self.media_type {
            return media_type.clone();
        }
        if let Some(name) = self.file_name.as_deref() {
            if let Some(mime) = mime_guess::from_path(name).first() {
                return mime.essence_str().to_string();
            }
        }
        "image/jpeg".to_string()
    }
}

/// One resolution request. At least one of `description` and `image`
/// should be present; `hints` carries free-form context (project name,
/// board it was pulled from, markings).
#[derive(Debug, Clone, Default)]
pub struct ResearchRequest {
    pub description: Option<String>,
    pub image: Option<ImageAttachment>,
    pub mode: ResearchMode,
    pub hints: Vec<String>,
}

/// Outcome of one provider attempt, after its retry budget. Transient:
/// used for logging and error aggregation, never persisted.
#[derive(Debug, Clone)]
pub struct ProviderAttemptResult {
    pub provider: String,
    pub error: Option<String>,
    pub latency_ms: i64,
    pub success: bool,
}

/// Where a result came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchProvenance {
    pub provider: String,
    pub fallback: bool,
    pub researched_at: DateTime<Utc>,
}

/// Canonical validated research record handed to the caller.
///
/// Every list field is always present (empty when unknown) and
/// `confidence` is always within [0, 1]; the normalizer enforces both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchResult {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_number: Option<String>,
    pub specifications: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasheet_url: Option<String>,
    pub image_urls: Vec<String>,
    pub model_3d_urls: Vec<String>,
    pub model_formats: Vec<String>,
    pub typical_quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    pub tags: Vec<String>,
    pub safety_warnings: Vec<String>,
    pub common_uses: Vec<String>,
    pub compatible_parts: Vec<String>,
    pub confidence: f32,
    pub provenance: ResearchProvenance,
}

/// What `research` hands back: a validated result, or a degraded stub
/// paired with the aggregated provider failure summary. The engine never
/// returns an unhandled error.
#[derive(Debug, Clone)]
pub enum ResearchOutcome {
    Resolved(ResearchResult),
    Degraded { result: ResearchResult, error: String },
}

impl ResearchOutcome {
    pub fn result(&self) -> &ResearchResult {
        match self {
            ResearchOutcome::Resolved(result) => result,
            ResearchOutcome::Degraded { result, .. } => result,
        }
    }

    pub fn into_result(self) -> ResearchResult {
        match self {
            ResearchOutcome::Resolved(result) => result,
            ResearchOutcome::Degraded { result, .. } => result,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ResearchOutcome::Degraded { .. })
    }
}
