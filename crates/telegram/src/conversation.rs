//! The request/response contract between the bot and its users.
//!
//! Everything here is platform-agnostic: handlers translate Telegram updates
//! into calls on [`Conversation`] and render the returned [`Reply`].

use std::sync::Arc;

use {
    relaybot_config::{ProviderTag, RelaybotConfig},
    relaybot_providers::{InvokeError, ProviderRegistry},
    tracing::{debug, info, warn},
};

use crate::{
    commands::{self, Command},
    membership::{MembershipGate, MembershipSource},
    preferences::PreferenceStore,
    replies,
};

/// Callback-data prefix of the provider picker buttons.
pub const CHOOSE_AI_CALLBACK_PREFIX: &str = "chooseai:";

/// What to send back for one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    /// A prompt with one button per `(label, callback_data)` choice.
    ProviderPicker {
        text: String,
        choices: Vec<(String, String)>,
    },
    Ignore,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

/// Composes the membership gate, the preference store, and the provider
/// registry.
pub struct Conversation {
    gate: Option<MembershipGate>,
    join_prompt: String,
    preferences: Arc<PreferenceStore>,
    providers: Arc<ProviderRegistry>,
    selection: bool,
    default_provider: ProviderTag,
}

impl Conversation {
    /// Ungated, fixed-provider conversation routing to Gemini.
    pub fn new(providers: Arc<ProviderRegistry>, preferences: Arc<PreferenceStore>) -> Self {
        Self {
            gate: None,
            join_prompt: String::new(),
            preferences,
            providers,
            selection: false,
            default_provider: ProviderTag::Gemini,
        }
    }

    pub fn with_gate(mut self, gate: MembershipGate, invite_link: Option<&str>) -> Self {
        self.join_prompt = replies::join_prompt(gate.channel(), invite_link);
        self.gate = Some(gate);
        self
    }

    pub fn with_selection(mut self, selection: bool) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_default_provider(mut self, tag: ProviderTag) -> Self {
        self.default_provider = tag;
        self
    }

    /// Wire a conversation from config. Gating is enabled only when a channel
    /// is configured.
    pub fn from_config(
        config: &RelaybotConfig,
        membership: Arc<dyn MembershipSource>,
        providers: Arc<ProviderRegistry>,
        preferences: Arc<PreferenceStore>,
    ) -> Self {
        let mut conversation = Self::new(providers, preferences)
            .with_selection(config.providers.selection)
            .with_default_provider(config.providers.default);

        match config.gating.channel() {
            Some(channel) => {
                info!(channel, "membership gating enabled");
                conversation = conversation.with_gate(
                    MembershipGate::new(channel, membership),
                    config.gating.invite_link.as_deref(),
                );
            },
            None => info!("no gating channel configured, all users allowed"),
        }
        conversation
    }

    async fn allowed(&self, user_id: u64) -> bool {
        match &self.gate {
            Some(gate) => gate.is_member(user_id).await,
            None => true,
        }
    }

    fn denied(&self) -> Reply {
        Reply::Text(self.join_prompt.clone())
    }

    /// Route any inbound text: commands to their handlers, plain text to the
    /// AI. Unknown commands are ignored.
    pub async fn respond(&self, user_id: u64, text: &str, bot_username: Option<&str>) -> Reply {
        match commands::parse(text, bot_username) {
            Some(Command::Start) => self.start(user_id).await,
            Some(Command::Help) => self.help(user_id).await,
            Some(Command::SetGroup(name)) => self.set_group(user_id, name.as_deref()).await,
            Some(Command::ChooseAi) => self.choose_ai(user_id).await,
            Some(Command::Other(name)) => {
                debug!(user_id, command = %name, "ignoring unknown command");
                Reply::Ignore
            },
            None => self.chat(user_id, text).await,
        }
    }

    pub async fn start(&self, user_id: u64) -> Reply {
        info!(user_id, "user started the bot");
        if !self.allowed(user_id).await {
            return self.denied();
        }
        Reply::text(replies::WELCOME)
    }

    pub async fn help(&self, user_id: u64) -> Reply {
        if !self.allowed(user_id).await {
            return self.denied();
        }
        Reply::text(replies::HELP)
    }

    /// Acknowledge a group name. This is advisory text only; no platform
    /// action is taken.
    pub async fn set_group(&self, user_id: u64, name: Option<&str>) -> Reply {
        if !self.allowed(user_id).await {
            return self.denied();
        }
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => {
                info!(user_id, group = name, "group set");
                Reply::Text(replies::group_set(name))
            },
            None => Reply::text(replies::SETGROUP_USAGE),
        }
    }

    pub async fn choose_ai(&self, user_id: u64) -> Reply {
        if !self.allowed(user_id).await {
            return self.denied();
        }
        if !self.selection {
            return Reply::Text(replies::fixed_provider(self.default_provider));
        }
        Reply::ProviderPicker {
            text: replies::CHOOSE_AI_PROMPT.to_string(),
            choices: ProviderTag::ALL
                .iter()
                .map(|tag| {
                    (
                        tag.display_name().to_string(),
                        format!("{CHOOSE_AI_CALLBACK_PREFIX}{}", tag.as_str()),
                    )
                })
                .collect(),
        }
    }

    /// Handle a provider-picker button press. Returns the text that replaces
    /// the picker, or `None` when `data` is not a picker callback.
    pub async fn select_provider(&self, user_id: u64, data: &str) -> Option<String> {
        let raw = data.strip_prefix(CHOOSE_AI_CALLBACK_PREFIX)?;
        let tag: ProviderTag = match raw.parse() {
            Ok(tag) => tag,
            Err(e) => {
                warn!(user_id, data, error = %e, "bad provider callback");
                return None;
            },
        };

        if !self.allowed(user_id).await {
            return Some(self.join_prompt.clone());
        }
        if !self.selection {
            return Some(replies::fixed_provider(self.default_provider));
        }

        let previous = self.preferences.select(user_id, tag);
        info!(user_id, provider = %tag, previous = ?previous, "provider selected");
        Some(replies::provider_selected(tag))
    }

    /// Relay plain text to the user's provider.
    pub async fn chat(&self, user_id: u64, text: &str) -> Reply {
        if !self.allowed(user_id).await {
            return self.denied();
        }

        let tag = if self.selection {
            match self.preferences.get(user_id) {
                Some(tag) => tag,
                None => return Reply::text(replies::CHOOSE_AI_FIRST),
            }
        } else {
            self.default_provider
        };

        debug!(user_id, provider = %tag, text_len = text.len(), "relaying message");
        match self.providers.generate_reply(tag, text).await {
            Ok(reply) => Reply::Text(reply),
            Err(InvokeError::NotIntegrated { provider }) => {
                Reply::Text(replies::not_integrated(provider))
            },
            Err(e) => {
                warn!(user_id, provider = %tag, error = %e, "AI completion failed");
                Reply::text(replies::APOLOGY)
            },
        }
    }
}
