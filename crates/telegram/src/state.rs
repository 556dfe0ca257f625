use std::sync::Arc;

use crate::{conversation::Conversation, outbound::TelegramOutbound};

/// Everything the update handlers need, shared with the polling task.
pub struct BotState {
    pub bot: teloxide::Bot,
    pub bot_username: Option<String>,
    pub outbound: TelegramOutbound,
    pub conversation: Arc<Conversation>,
}

impl BotState {
    pub fn new(
        bot: teloxide::Bot,
        bot_username: Option<String>,
        conversation: Arc<Conversation>,
    ) -> Self {
        Self {
            outbound: TelegramOutbound::new(bot.clone()),
            bot,
            bot_username,
            conversation,
        }
    }
}
