// src/research/provider/mod.rs
// Research provider trait and backend implementations

use anyhow::Result;
use async_trait::async_trait;

use super::request::ProviderRequest;

pub mod openai;
pub mod perplexity;

/// External AI backend able to answer a research request.
///
/// New backends implement this trait and get inserted into the engine's
/// provider table; no other component changes.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    /// Provider name for logging and provenance
    fn name(&self) -> &'static str;

    /// Whether credentials for this provider are present
    fn is_configured(&self) -> bool;

    /// Whether the provider accepts image content
    fn supports_vision(&self) -> bool {
        false
    }

    /// Whether the provider performs live web search
    fn supports_web_search(&self) -> bool {
        false
    }

    /// One raw completion round-trip. Returns the provider's text verbatim;
    /// parsing and validation happen in the caller.
    async fn call(&self, request: &ProviderRequest) -> Result<String>;
}
