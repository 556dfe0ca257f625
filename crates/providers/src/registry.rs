use std::{collections::HashMap, sync::Arc, time::Duration};

use {
    relaybot_config::{ProviderTag, ProvidersConfig},
    tracing::{debug, info, warn},
};

use crate::{
    error::{InvokeError, Result},
    gemini::GeminiProvider,
    openai::OpenAiProvider,
    provider::LlmProvider,
};

/// Maps each [`ProviderTag`] to the backend that serves it.
///
/// A tag without a registered backend answers with
/// [`InvokeError::NotIntegrated`] without touching the network.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderTag, Arc<dyn LlmProvider>>,
}

impl ProviderRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register (or replace) the backend for `tag`.
    pub fn register(&mut self, tag: ProviderTag, provider: Arc<dyn LlmProvider>) {
        info!(provider = %tag, model = provider.id(), "registered provider");
        self.providers.insert(tag, provider);
    }

    pub fn get(&self, tag: ProviderTag) -> Option<&Arc<dyn LlmProvider>> {
        self.providers.get(&tag)
    }

    pub fn is_integrated(&self, tag: ProviderTag) -> bool {
        self.providers.contains_key(&tag)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Build the registry from config, registering every provider whose API
    /// key is set.
    pub fn from_config(config: &ProvidersConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        let mut registry = Self::empty();

        if let Some(key) = config
            .gemini
            .api_key
            .as_ref()
            .filter(|k| relaybot_config::is_usable_secret(k))
        {
            registry.register(
                ProviderTag::Gemini,
                Arc::new(GeminiProvider::new(
                    key.clone(),
                    config.gemini.model.clone(),
                    config.gemini.base_url.clone(),
                    timeout,
                )),
            );
        }

        if let Some(key) = config
            .openai
            .api_key
            .as_ref()
            .filter(|k| relaybot_config::is_usable_secret(k))
        {
            registry.register(
                ProviderTag::ChatGpt,
                Arc::new(OpenAiProvider::new(
                    key.clone(),
                    config.openai.model.clone(),
                    config.openai.base_url.clone(),
                    timeout,
                )),
            );
        }

        if registry.is_empty() {
            warn!("no AI provider configured");
        }
        registry
    }

    /// Relay `prompt` to the backend registered for `tag`.
    pub async fn generate_reply(&self, tag: ProviderTag, prompt: &str) -> Result<String> {
        let Some(provider) = self.get(tag) else {
            debug!(provider = %tag, "provider not integrated");
            return Err(InvokeError::NotIntegrated { provider: tag });
        };

        match provider.generate_reply(prompt).await {
            Ok(reply) => {
                debug!(provider = provider.name(), reply_len = reply.len(), "completion ok");
                Ok(reply)
            },
            Err(e) => {
                warn!(provider = provider.name(), model = provider.id(), error = %e, "completion failed");
                Err(e)
            },
        }
    }
}
