// src/research/parser.rs
// Resilient extraction of a JSON object from arbitrary provider text
//
// Providers are instructed to return a bare JSON object but routinely wrap
// it in prose, markdown fences, or pseudo-JSON (single quotes, bare keys,
// trailing commas). Candidates are tried safest-first: the unrepaired text
// always gets a chance before the regex repairs, since the repairs can
// themselves corrupt quote characters inside string values.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use super::error::ResearchError;

/// Parsed-but-unvalidated provider output. Produced only by this module
/// and the heuristic extractor; consumed only by the validator/normalizer.
#[derive(Debug, Clone)]
pub struct UntrustedPayload(pub(crate) Map<String, Value>);

impl UntrustedPayload {
    pub(crate) fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

// Single-quoted spans are converted only in key/value position (after an
// opening brace/bracket, comma, or colon). An apostrophe mid-word never
// starts a match, so "5 o'clock" inside a double-quoted value survives.
static SINGLE_QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([{\[,:]\s*)'([^']*)'").expect("single-quote pattern"));

static BARE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:").expect("bare-key pattern"));

static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*([}\]])").expect("trailing-comma pattern"));

/// Extract the first JSON object recoverable from `raw`.
///
/// Returns `MalformedResponse` when nothing object-shaped can be parsed;
/// the caller decides whether to fall back to another provider.
pub fn extract_json(raw: &str) -> Result<UntrustedPayload, ResearchError> {
    let stripped = strip_code_fence(raw.trim());

    let mut candidates = vec![stripped.clone()];
    if let Some(span) = isolate_braces(&stripped) {
        candidates.push(span.to_string());
        candidates.push(apply_repairs(span));
    }

    for (index, candidate) in candidates.iter().enumerate() {
        if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(candidate) {
            debug!("Parsed provider JSON on candidate {}", index + 1);
            return Ok(UntrustedPayload(fields));
        }
    }

    Err(ResearchError::MalformedResponse(preview(raw)))
}

/// Drop a leading/trailing markdown code fence when the whole text is one
/// fenced block. Fences embedded mid-prose are handled by brace isolation.
fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let body = match trimmed.find('\n') {
        Some(newline) => &trimmed[newline + 1..],
        None => trimmed.trim_start_matches('`'),
    };
    body.trim_end()
        .trim_end_matches("```")
        .trim()
        .to_string()
}

/// First `{` to last `}`, or None when no object span exists
fn isolate_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

fn apply_repairs(text: &str) -> String {
    let mut repaired = SINGLE_QUOTED.replace_all(text, "${1}\"${2}\"").into_owned();
    repaired = BARE_KEY.replace_all(&repaired, "${1}\"${2}\":").into_owned();
    repaired = TRAILING_COMMA.replace_all(&repaired, "${1}").into_owned();
    repaired
}

fn preview(raw: &str) -> String {
    let trimmed = raw.trim();
    let snippet: String = trimmed.chars().take(80).collect();
    if snippet.chars().count() < trimmed.chars().count() {
        format!("{snippet}...")
    } else {
        snippet
    }
}
