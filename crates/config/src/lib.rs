//! Configuration loading, env substitution, and validation.
//!
//! Config files: `relaybot.toml`, `relaybot.yaml`, `relaybot.yml`, or
//! `relaybot.json`. Searched in `./` then `~/.config/relaybot/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values, and the usual
//! deployment variables (`TELEGRAM_BOT_TOKEN`, `GEMINI_API_KEY`, ...) override
//! whatever the file says.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{
        apply_env_overrides, apply_env_overrides_with, config_dir, discover_and_load, load,
        load_config,
    },
    schema::{
        GatingConfig, GeminiConfig, LivenessConfig, OpenAiConfig, ProviderTag, ProvidersConfig,
        RelaybotConfig, TelegramConfig, is_usable_secret,
    },
    validate::validate,
};
