// src/research/heuristic.rs
// Last-resort field scraping when no provider yielded parseable JSON

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use super::normalize::{self, PayloadOrigin};
use super::parser::UntrustedPayload;
use super::types::ResearchResult;

/// Confidence pinned onto scraped stubs. Tunable policy constant.
pub const HEURISTIC_CONFIDENCE: f64 = 0.3;

static FIELD_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*[-*]?\s*(name|component|part|category|type)\s*[:=]\s*(.+)$")
        .expect("field-line pattern")
});

/// Build a minimal stub from whatever `field: value` lines the raw text
/// contains. Unmatched fields fall through to normalizer defaults; the
/// result is always usable, just low-confidence.
pub fn extract_stub(raw_text: Option<&str>, provider: &str) -> ResearchResult {
    let mut fields = Map::new();

    for line in raw_text.unwrap_or_default().lines() {
        let Some(captures) = FIELD_LINE.captures(line) else {
            continue;
        };
        let value = captures[2]
            .trim()
            .trim_matches(|c| c == '"' || c == '\'' || c == ',')
            .trim();
        if value.is_empty() {
            continue;
        }
        let target = match captures[1].to_lowercase().as_str() {
            "name" | "component" | "part" => "name",
            _ => "category",
        };
        // First match per field wins
        fields
            .entry(target)
            .or_insert_with(|| Value::String(value.to_string()));
    }

    debug!("Heuristic extraction matched {} field(s)", fields.len());
    fields.insert("confidence".to_string(), Value::from(HEURISTIC_CONFIDENCE));

    normalize::normalize(UntrustedPayload(fields), PayloadOrigin::Heuristic, provider)
}
