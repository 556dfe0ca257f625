//! Telegram front end: membership gating, per-user provider preferences, and
//! the long-polling loop that relays messages to the AI providers.

pub mod bot;
pub mod commands;
pub mod conversation;
pub mod error;
pub mod handlers;
pub mod membership;
pub mod outbound;
pub mod preferences;
pub mod replies;
pub mod state;

pub use {
    bot::{build_bot, connect, spawn_polling},
    conversation::{Conversation, Reply},
    error::{Error, Result},
    membership::{MembershipGate, MembershipSource, MembershipStatus, TelegramMembership},
    preferences::PreferenceStore,
    state::BotState,
};
