// src/research/normalize.rs
// Maps untrusted parsed payloads into canonical ResearchResult records

use chrono::Utc;
use serde_json::{Map, Value};
use url::Url;

use super::error::ResearchError;
use super::parser::UntrustedPayload;
use super::types::{ResearchProvenance, ResearchResult};

/// Confidence assigned to a direct success that did not report its own.
/// Tunable policy constant, not load-bearing business logic.
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

/// Ceiling applied to any result produced after an earlier provider failed.
pub const FALLBACK_CONFIDENCE_CEILING: f32 = 0.3;

/// Placeholder hosts providers like to invent. Any URL containing one of
/// these substrings is dropped, never rewritten.
const URL_DENYLIST: &[&str] = &[
    "example.com",
    "example.org",
    "example.net",
    "placeholder",
    "your-domain",
    "localhost",
];

// Default stocking quantity per category, matched case-insensitively as a
// substring, first match wins. "microcontroller" sits before "ic" so the
// specific entry is the one that matches.
const QUANTITY_DEFAULTS: &[(&str, u32)] = &[
    ("resistor", 10),
    ("capacitor", 5),
    ("led", 10),
    ("diode", 5),
    ("transistor", 3),
    ("microcontroller", 1),
    ("ic", 1),
    ("sensor", 1),
    ("connector", 2),
    ("switch", 2),
];

const HIGH_VOLTAGE_WARNING: &str =
    "High voltage hazard: disconnect power and verify discharge before handling.";

const MAINS_CATEGORY_KEYWORDS: &[&str] = &["power", "voltage", "mains"];

/// Where a payload came from; drives the confidence policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadOrigin {
    /// First attempted provider succeeded
    Direct,
    /// A later provider succeeded after an earlier attempt failed
    Fallback,
    /// No provider yielded JSON; fields were scraped from raw text
    Heuristic,
}

impl PayloadOrigin {
    pub fn is_fallback(self) -> bool {
        !matches!(self, PayloadOrigin::Direct)
    }
}

/// Minimum-fields check for the provider path: `name` and `category` must
/// be present and non-empty. The heuristic path skips this check; its
/// whole output is a defaulted stub.
pub fn validate(payload: &UntrustedPayload) -> Result<(), ResearchError> {
    let mut missing = Vec::new();
    for field in ["name", "category"] {
        match payload.fields().get(field).and_then(Value::as_str) {
            Some(text) if !text.trim().is_empty() => {}
            _ => missing.push(field),
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ResearchError::ValidationFailed(missing.join(", ")))
    }
}

/// Total normalization: every missing field takes its default, every list
/// is materialized, URLs are filtered, and confidence lands in [0, 1].
pub fn normalize(payload: UntrustedPayload, origin: PayloadOrigin, provider: &str) -> ResearchResult {
    let fields = payload.fields();

    let name = non_empty_string(fields.get("name"))
        .unwrap_or_else(|| "Unknown Component".to_string());
    let category = non_empty_string(fields.get("category")).unwrap_or_else(|| "Unknown".to_string());

    let mut confidence = fields
        .get("confidence")
        .and_then(Value::as_f64)
        .map(|value| value as f32)
        .unwrap_or(DEFAULT_CONFIDENCE)
        .clamp(0.0, 1.0);
    if origin.is_fallback() {
        confidence = confidence.min(FALLBACK_CONFIDENCE_CEILING);
    }

    let mut typical_quantity = fields
        .get("typical_quantity")
        .and_then(Value::as_f64)
        .filter(|quantity| *quantity > 0.0)
        .map(|quantity| quantity as u32)
        .unwrap_or(1);
    if typical_quantity == 1 {
        if let Some(default) = quantity_default(&category) {
            typical_quantity = default;
        }
    }

    let mut safety_warnings = string_list(fields.get("safety_warnings"));
    let lower_category = category.to_lowercase();
    if MAINS_CATEGORY_KEYWORDS.iter().any(|keyword| lower_category.contains(keyword))
        && !safety_warnings.iter().any(|warning| warning == HIGH_VOLTAGE_WARNING)
    {
        safety_warnings.push(HIGH_VOLTAGE_WARNING.to_string());
    }

    ResearchResult {
        name,
        description: non_empty_string(fields.get("description")),
        category,
        subcategory: non_empty_string(fields.get("subcategory")),
        manufacturer: non_empty_string(fields.get("manufacturer")),
        part_number: non_empty_string(fields.get("part_number")),
        specifications: object_map(fields.get("specifications")),
        datasheet_url: non_empty_string(fields.get("datasheet_url")).filter(|url| url_allowed(url)),
        image_urls: url_list(fields.get("image_urls")),
        model_3d_urls: url_list(fields.get("model_3d_urls")),
        model_formats: string_list(fields.get("model_formats")),
        typical_quantity,
        estimated_value: non_negative_number(fields.get("estimated_value")),
        current_price: non_negative_number(fields.get("current_price")),
        tags: string_list(fields.get("tags")),
        safety_warnings,
        common_uses: string_list(fields.get("common_uses")),
        compatible_parts: string_list(fields.get("compatible_parts")),
        confidence,
        provenance: ResearchProvenance {
            provider: provider.to_string(),
            fallback: origin.is_fallback(),
            researched_at: Utc::now(),
        },
    }
}

/// Absolute, well-formed http(s), and not a placeholder host
fn url_allowed(candidate: &str) -> bool {
    if !candidate.starts_with("http") {
        return false;
    }
    let lower = candidate.to_lowercase();
    if URL_DENYLIST.iter().any(|denied| lower.contains(denied)) {
        return false;
    }
    match Url::parse(candidate) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

fn quantity_default(category: &str) -> Option<u32> {
    let lower = category.to_lowercase();
    QUANTITY_DEFAULTS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, quantity)| *quantity)
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

// Providers sometimes hand back a bare string where a list was asked for;
// accept it as a single-element list.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(text)) if !text.trim().is_empty() => vec![text.trim().to_string()],
        _ => Vec::new(),
    }
}

fn url_list(value: Option<&Value>) -> Vec<String> {
    string_list(value)
        .into_iter()
        .filter(|url| url_allowed(url))
        .collect()
}

fn object_map(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    }
}

fn non_negative_number(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64).filter(|number| *number >= 0.0)
}
