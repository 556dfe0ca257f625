use {
    teloxide::{
        prelude::*,
        types::{ChatId, MediaKind, MessageKind},
    },
    tracing::{debug, info, warn},
};

use crate::{
    commands, conversation::Reply, error::Result, outbound::TelegramOutbound, state::BotState,
};

/// Handle a single inbound message.
pub async fn handle_message_direct(msg: Message, state: &BotState) -> Result<()> {
    let Some(text) = extract_text(&msg) else {
        debug!(chat_id = msg.chat.id.0, "ignoring non-text message");
        return Ok(());
    };
    let Some(user_id) = msg.from.as_ref().map(|u| u.id.0) else {
        debug!(chat_id = msg.chat.id.0, "ignoring message without sender");
        return Ok(());
    };
    let chat_id = msg.chat.id;
    let bot_username = state.bot_username.as_deref();

    info!(user_id, chat_id = chat_id.0, text_len = text.len(), "telegram message received");

    if commands::parse(&text, bot_username).is_none() {
        state.outbound.send_typing(chat_id).await;
    }

    let reply = state
        .conversation
        .respond(user_id, &text, bot_username)
        .await;
    send_reply(&state.outbound, chat_id, reply).await
}

/// Handle an inline-keyboard button press.
pub async fn handle_callback_query(query: CallbackQuery, state: &BotState) -> Result<()> {
    // Answer the callback to dismiss the loading spinner.
    if let Err(e) = state.bot.answer_callback_query(&query.id).await {
        debug!(error = %e, "failed to answer callback query");
    }

    let Some(data) = query.data.as_deref() else {
        return Ok(());
    };
    let user_id = query.from.id.0;

    let Some(text) = state.conversation.select_provider(user_id, data).await else {
        debug!(user_id, data, "ignoring unknown callback");
        return Ok(());
    };

    match query.message.as_ref() {
        Some(message) => {
            state
                .outbound
                .edit_text(message.chat().id, message.id(), &text)
                .await
        },
        None => {
            warn!(user_id, "callback query without message, replying directly");
            state
                .outbound
                .send_text(ChatId::from(query.from.id), &text)
                .await
        },
    }
}

async fn send_reply(outbound: &TelegramOutbound, chat_id: ChatId, reply: Reply) -> Result<()> {
    match reply {
        Reply::Text(text) => outbound.send_text(chat_id, &text).await,
        Reply::ProviderPicker { text, choices } => {
            outbound.send_keyboard(chat_id, &text, &choices).await
        },
        Reply::Ignore => Ok(()),
    }
}

/// Extract the text of a plain text message.
fn extract_text(msg: &Message) -> Option<String> {
    match &msg.kind {
        MessageKind::Common(common) => match &common.media_kind {
            MediaKind::Text(t) => Some(t.text.clone()),
            _ => None,
        },
        _ => None,
    }
}
