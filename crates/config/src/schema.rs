/// Config schema types (telegram, gating, providers, liveness).
use std::{fmt, str::FromStr};

use {
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
};

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RelaybotConfig {
    pub telegram: TelegramConfig,
    pub gating: GatingConfig,
    pub providers: ProvidersConfig,
    pub liveness: LivenessConfig,
}

/// Telegram bot account settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    pub token: Secret<String>,

    /// Long-poll timeout passed to `getUpdates` (seconds).
    pub poll_timeout_secs: u32,

    /// HTTP client timeout for Bot API calls (seconds). Must outlive the
    /// long poll.
    pub client_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            poll_timeout_secs: 30,
            client_timeout_secs: 45,
        }
    }
}

/// Channel-membership gating.
///
/// With no `channel` configured every user is allowed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GatingConfig {
    /// `@username` or numeric chat id of the channel users must join.
    pub channel: Option<String>,

    /// Invite link appended to the join prompt.
    pub invite_link: Option<String>,
}

impl GatingConfig {
    /// The configured channel, ignoring blank values.
    #[must_use]
    pub fn channel(&self) -> Option<&str> {
        self.channel
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Generative-text providers the bot can relay to.
///
/// Config values go through [`FromStr`], so `"Gemini"`, `"gemini"` and
/// `"openai"` are all accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum ProviderTag {
    ChatGpt,
    Gemini,
}

impl ProviderTag {
    pub const ALL: [ProviderTag; 2] = [ProviderTag::ChatGpt, ProviderTag::Gemini];

    /// Stable lowercase identifier, used in callback data and config.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ChatGpt => "chatgpt",
            Self::Gemini => "gemini",
        }
    }

    /// Human-facing name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::ChatGpt => "ChatGPT",
            Self::Gemini => "Gemini",
        }
    }
}

impl fmt::Display for ProviderTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ProviderTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chatgpt" | "openai" => Ok(Self::ChatGpt),
            "gemini" => Ok(Self::Gemini),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

impl TryFrom<String> for ProviderTag {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Provider selection and per-provider credentials.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// When true, users must pick a provider with `/chooseai` before chatting.
    pub selection: bool,

    /// Provider used when selection mode is off.
    pub default: ProviderTag,

    /// Timeout applied to every completion request (seconds).
    pub timeout_secs: u64,

    pub gemini: GeminiConfig,
    pub openai: OpenAiConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            selection: false,
            default: ProviderTag::Gemini,
            timeout_secs: 30,
            gemini: GeminiConfig::default(),
            openai: OpenAiConfig::default(),
        }
    }
}

impl ProvidersConfig {
    /// Whether a usable API key is configured for `tag`.
    #[must_use]
    pub fn has_key(&self, tag: ProviderTag) -> bool {
        let key = match tag {
            ProviderTag::ChatGpt => self.openai.api_key.as_ref(),
            ProviderTag::Gemini => self.gemini.api_key.as_ref(),
        };
        key.is_some_and(is_usable_secret)
    }
}

/// Google Gemini settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: Option<Secret<String>>,
    pub model: String,
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.0-flash".into(),
            base_url: "https://generativelanguage.googleapis.com".into(),
        }
    }
}

/// OpenAI chat-completions settings (the ChatGPT provider).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: Option<Secret<String>>,
    pub model: String,
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o-mini".into(),
            base_url: "https://api.openai.com/v1".into(),
        }
    }
}

/// HTTP keep-alive responder for uptime probes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    pub enabled: bool,
    pub bind: String,
    pub port: u16,
    /// Body returned by `GET /`.
    pub message: String,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "0.0.0.0".into(),
            port: 8080,
            message: "Bot is running".into(),
        }
    }
}

/// A secret counts as set when it is non-blank and not an unresolved
/// `${VAR}` placeholder.
#[must_use]
pub fn is_usable_secret(secret: &Secret<String>) -> bool {
    let value = secret.expose_secret().trim();
    !value.is_empty() && !value.starts_with("${")
}
