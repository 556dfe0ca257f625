use std::{future::Future, time::Duration};

use {
    teloxide::{
        RequestError,
        payloads::SendMessageSetters,
        prelude::*,
        types::{ChatAction, ChatId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId},
    },
    tracing::{debug, info, warn},
};

use crate::error::Result;

/// Telegram's hard limit on message text length.
pub const TELEGRAM_MAX_MESSAGE_LEN: usize = 4096;

const TELEGRAM_RETRY_AFTER_MAX_RETRIES: usize = 4;

/// Outbound message sender for Telegram.
#[derive(Clone)]
pub struct TelegramOutbound {
    bot: Bot,
}

impl TelegramOutbound {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Send `text`, split into as many messages as Telegram's length limit
    /// requires.
    pub async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        let chunks = chunk_message(text, TELEGRAM_MAX_MESSAGE_LEN);
        debug!(
            chat_id = chat_id.0,
            text_len = text.len(),
            chunk_count = chunks.len(),
            "telegram outbound text send start"
        );

        for chunk in &chunks {
            run_telegram_request_with_retry(chat_id, "send_message", || {
                self.bot.send_message(chat_id, chunk.as_str()).send()
            })
            .await?;
        }

        info!(
            chat_id = chat_id.0,
            text_len = text.len(),
            chunk_count = chunks.len(),
            "telegram outbound text sent"
        );
        Ok(())
    }

    /// Send `text` with one inline button per `(label, callback_data)` row.
    pub async fn send_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        choices: &[(String, String)],
    ) -> Result<()> {
        let buttons: Vec<Vec<InlineKeyboardButton>> = choices
            .iter()
            .map(|(label, data)| vec![InlineKeyboardButton::callback(label, data)])
            .collect();
        let keyboard = InlineKeyboardMarkup::new(buttons);

        run_telegram_request_with_retry(chat_id, "send_keyboard", || {
            self.bot
                .send_message(chat_id, text)
                .reply_markup(keyboard.clone())
                .send()
        })
        .await?;
        Ok(())
    }

    /// Replace the text (and keyboard) of a message the bot sent earlier.
    pub async fn edit_text(&self, chat_id: ChatId, message_id: MessageId, text: &str) -> Result<()> {
        run_telegram_request_with_retry(chat_id, "edit_message_text", || {
            self.bot
                .edit_message_text(chat_id, message_id, text)
                .send()
        })
        .await?;
        Ok(())
    }

    /// Best-effort typing indicator.
    pub async fn send_typing(&self, chat_id: ChatId) {
        if let Err(e) = self
            .bot
            .send_chat_action(chat_id, ChatAction::Typing)
            .await
        {
            debug!(chat_id = chat_id.0, error = %e, "failed to send typing action");
        }
    }
}

async fn run_telegram_request_with_retry<T, F, Fut>(
    chat_id: ChatId,
    operation: &'static str,
    mut request: F,
) -> std::result::Result<T, RequestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, RequestError>>,
{
    let mut retries = 0usize;

    loop {
        match request().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let Some(wait) = retry_after_duration(&err) else {
                    return Err(err);
                };

                if retries >= TELEGRAM_RETRY_AFTER_MAX_RETRIES {
                    warn!(
                        chat_id = chat_id.0,
                        operation,
                        retries,
                        max_retries = TELEGRAM_RETRY_AFTER_MAX_RETRIES,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limit persisted after retries"
                    );
                    return Err(err);
                }

                retries += 1;
                warn!(
                    chat_id = chat_id.0,
                    operation,
                    retries,
                    max_retries = TELEGRAM_RETRY_AFTER_MAX_RETRIES,
                    retry_after_secs = wait.as_secs(),
                    "telegram rate limited, waiting before retry"
                );
                tokio::time::sleep(wait).await;
            },
        }
    }
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}

/// Split `text` into pieces of at most `max_len` bytes, preferring newline
/// and then space boundaries.
pub fn chunk_message(text: &str, max_len: usize) -> Vec<String> {
    if max_len == 0 {
        return Vec::new();
    }

    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            if !remaining.trim().is_empty() {
                chunks.push(remaining.to_string());
            }
            break;
        }

        let mut window_end = remaining.floor_char_boundary(max_len);
        if window_end == 0 {
            window_end = remaining
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(remaining.len());
        }

        let window = &remaining[..window_end];
        let split_at = match window.rfind('\n').or_else(|| window.rfind(' ')) {
            Some(0) | None => window_end,
            Some(i) => i,
        };

        let chunk = &remaining[..split_at];
        // Telegram rejects blank messages.
        if !chunk.trim().is_empty() {
            chunks.push(chunk.to_string());
        }
        remaining = remaining[split_at..].trim_start_matches('\n');
        if let Some(rest) = remaining.strip_prefix(' ') {
            remaining = rest;
        }
    }

    chunks
}
