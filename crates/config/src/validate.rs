//! Startup validation.
//!
//! Catches the configurations that would let the bot start but never answer:
//! no bot token, no credentials for the provider users will be routed to, or
//! zero timeouts.

use crate::{
    error::{Error, Result},
    schema::{ProviderTag, RelaybotConfig, is_usable_secret},
};

/// Check `config` and return the first problem found.
pub fn validate(config: &RelaybotConfig) -> Result<()> {
    if !is_usable_secret(&config.telegram.token) {
        return Err(Error::invalid(
            "telegram bot token is not set (TELEGRAM_BOT_TOKEN or [telegram].token)",
        ));
    }

    let providers = &config.providers;
    if providers.selection {
        if !ProviderTag::ALL.iter().any(|tag| providers.has_key(*tag)) {
            return Err(Error::invalid(
                "provider selection is enabled but no provider API key is set",
            ));
        }
    } else if !providers.has_key(providers.default) {
        return Err(Error::invalid(format!(
            "no API key configured for the default provider {}",
            providers.default
        )));
    }

    if providers.timeout_secs == 0 {
        return Err(Error::invalid("providers.timeout_secs must be greater than 0"));
    }
    if config.telegram.client_timeout_secs <= u64::from(config.telegram.poll_timeout_secs) {
        return Err(Error::invalid(
            "telegram.client_timeout_secs must exceed telegram.poll_timeout_secs",
        ));
    }

    Ok(())
}
