// src/research/error.rs
// Failure taxonomy for the research engine

/// Error conditions the engine distinguishes between provider selection,
/// provider calls, and response handling
#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    /// Credentials absent; the provider is skipped, not counted as a failure
    #[error("Provider not configured: {0}")]
    ProviderUnavailable(String),

    /// Transient network/HTTP failure; retried locally
    #[error("Provider call failed ({provider}): {message}")]
    ProviderCallFailed { provider: String, message: String },

    /// Text could not be coerced into valid JSON after repair; triggers
    /// provider fallback instead of a retry
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    /// Parsed JSON lacks minimally required fields; treated like a
    /// malformed response
    #[error("Response missing required fields: {0}")]
    ValidationFailed(String),

    /// Terminal aggregate; always resolved into a degraded-confidence stub
    #[error("All providers exhausted: {0}")]
    AllProvidersExhausted(String),
}
