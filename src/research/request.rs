// src/research/request.rs
// Provider-neutral prompt/payload construction per mode and modality

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use super::types::{ResearchMode, ResearchRequest};

/// Sampling temperature for research calls. Low to bias providers toward
/// deterministic, factual output.
pub const RESEARCH_TEMPERATURE: f32 = 0.2;

/// Token budgets per mode
#[derive(Debug, Clone, Copy)]
pub struct RequestBudgets {
    pub quick_max_tokens: usize,
    pub research_max_tokens: usize,
}

impl Default for RequestBudgets {
    fn default() -> Self {
        Self {
            quick_max_tokens: 600,
            research_max_tokens: 2000,
        }
    }
}

/// One piece of user content; each provider maps these onto its own wire
/// format.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    Image {
        media_type: String,
        base64_data: String,
    },
}

/// Provider-neutral request payload. Built once per research request and
/// handed unchanged to every provider the orchestrator tries.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub system: String,
    pub content: Vec<ContentPart>,
    pub max_tokens: usize,
    pub temperature: f32,
}

impl ProviderRequest {
    pub fn has_image(&self) -> bool {
        self.content
            .iter()
            .any(|part| matches!(part, ContentPart::Image { .. }))
    }
}

const QUICK_FIELDS: &str =
    r#""name", "category", "manufacturer", "part_number", "description", "confidence""#;

const RESEARCH_FIELDS: &str = r#""name", "description", "category", "subcategory", "manufacturer", "part_number", "specifications", "datasheet_url", "image_urls", "model_3d_urls", "model_formats", "typical_quantity", "estimated_value", "current_price", "tags", "safety_warnings", "common_uses", "compatible_parts", "confidence""#;

fn system_instructions(mode: ResearchMode) -> String {
    let fields = match mode {
        ResearchMode::Quick => QUICK_FIELDS,
        ResearchMode::Research => RESEARCH_FIELDS,
    };
    format!(
        "You are an electronics component researcher for an inventory system. \
         Identify the component and respond with a single bare JSON object and nothing else: \
         no prose, no markdown fences, no explanations. Use double-quoted keys and strings. \
         Keys: {fields}. Omit keys you have no information for rather than guessing. \
         \"specifications\" is an object of key/value pairs. \
         URL fields must be real, absolute http(s) links; never invent placeholder links. \
         \"confidence\" is a number between 0 and 1 reflecting identification certainty."
    )
}

/// Pure transformation of a `ResearchRequest` into the provider payload.
/// No I/O, no side effects.
pub fn build_request(request: &ResearchRequest, budgets: RequestBudgets) -> ProviderRequest {
    let mut prompt = match (&request.description, &request.image) {
        (Some(description), Some(_)) => format!(
            "Identify the electronic component in the attached image. \
             Additional description from the user: {description}"
        ),
        (Some(description), None) => format!("Identify this electronic component: {description}"),
        (None, Some(_)) => "Identify the electronic component in the attached image.".to_string(),
        (None, None) => "Identify this electronic component.".to_string(),
    };

    if !request.hints.is_empty() {
        prompt.push_str("\n\nContext: ");
        prompt.push_str(&request.hints.join("; "));
    }

    let mut content = vec![ContentPart::Text(prompt)];
    if let Some(image) = &request.image {
        content.push(ContentPart::Image {
            media_type: image.resolved_media_type(),
            base64_data: BASE64.encode(&image.bytes),
        });
    }

    let max_tokens = match request.mode {
        ResearchMode::Quick => budgets.quick_max_tokens,
        ResearchMode::Research => budgets.research_max_tokens,
    };

    ProviderRequest {
        system: system_instructions(request.mode),
        content,
        max_tokens,
        temperature: RESEARCH_TEMPERATURE,
    }
}
