//! Generative-text providers and the registry that routes prompts to them.

pub mod error;
pub mod gemini;
pub mod openai;
pub mod provider;
pub mod registry;

pub use {
    error::{InvokeError, Result},
    gemini::GeminiProvider,
    openai::OpenAiProvider,
    provider::LlmProvider,
    registry::ProviderRegistry,
    relaybot_config::ProviderTag,
};

/// Shared HTTP client for providers.
///
/// Reused so every backend shares one connection pool. Timeouts are set per
/// request.
pub fn shared_http_client() -> &'static reqwest::Client {
    static CLIENT: std::sync::LazyLock<reqwest::Client> =
        std::sync::LazyLock::new(reqwest::Client::new);
    &CLIENT
}
