use std::{sync::Arc, time::Duration};

use {
    relaybot_config::TelegramConfig,
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, UpdateKind},
    },
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use crate::{error::Result, handlers, state::BotState};

/// Build a bot whose HTTP client outlives the long poll, so the client does
/// not abort `getUpdates` before Telegram responds.
pub fn build_bot(config: &TelegramConfig) -> Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(config.client_timeout_secs))
        .build()?;
    Ok(Bot::with_client(config.token.expose_secret(), client))
}

/// Verify credentials, clear any webhook, and register the command menu.
///
/// Returns the bot's username.
pub async fn connect(bot: &Bot) -> Result<Option<String>> {
    let me = bot.get_me().await?;
    let bot_username = me.username.clone();

    // Delete any existing webhook so long polling works.
    bot.delete_webhook().send().await?;

    // Register slash commands for autocomplete in Telegram clients.
    let commands = vec![
        BotCommand::new("start", "Check access and get started"),
        BotCommand::new("chooseai", "Pick the AI you want to talk to"),
        BotCommand::new("setgroup", "Set the group to use with the bot"),
        BotCommand::new("help", "Show available commands"),
    ];
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!("failed to register bot commands: {e}");
    }

    info!(username = ?bot_username, "telegram bot connected (webhook cleared)");
    Ok(bot_username)
}

/// Spawn the long-polling loop.
///
/// Updates are handled one at a time, each to completion. Cancelling `cancel`
/// interrupts a pending `getUpdates` but never an update in flight. The loop
/// cancels `cancel` itself when another instance takes over the token.
pub fn spawn_polling(
    state: Arc<BotState>,
    poll_timeout_secs: u32,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("starting telegram manual polling loop");
        let mut offset: i32 = 0;

        while !cancel.is_cancelled() {
            let request = state
                .bot
                .get_updates()
                .offset(offset)
                .timeout(poll_timeout_secs)
                .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery])
                .send();

            let result = tokio::select! {
                _ = cancel.cancelled() => break,
                result = request => result,
            };

            match result {
                Ok(updates) => {
                    debug!(count = updates.len(), "got telegram updates");
                    for update in updates {
                        offset = update.id.as_offset();
                        dispatch(&state, update.kind).await;
                        if cancel.is_cancelled() {
                            break;
                        }
                    }
                },
                Err(e) => {
                    // Another bot instance is polling with the same token.
                    if matches!(&e, RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) {
                        error!(
                            "telegram polling stopped: another instance is already running with this token"
                        );
                        cancel.cancel();
                        break;
                    }

                    warn!(error = %e, "telegram getUpdates failed");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(Duration::from_secs(5)) => {},
                    }
                },
            }
        }

        acknowledge(&state.bot, offset).await;
        info!("telegram polling stopped");
    })
}

async fn dispatch(state: &BotState, kind: UpdateKind) {
    match kind {
        UpdateKind::Message(msg) => {
            debug!(chat_id = msg.chat.id.0, "received telegram message");
            if let Err(e) = handlers::handle_message_direct(msg, state).await {
                error!(error = %e, "error handling telegram message");
            }
        },
        UpdateKind::CallbackQuery(query) => {
            debug!(callback_data = ?query.data, "received telegram callback query");
            if let Err(e) = handlers::handle_callback_query(query, state).await {
                error!(error = %e, "error handling telegram callback query");
            }
        },
        other => {
            debug!("ignoring non-message update: {other:?}");
        },
    }
}

/// Confirm handled updates so a restart does not replay them.
async fn acknowledge(bot: &Bot, offset: i32) {
    if offset == 0 {
        return;
    }
    if let Err(e) = bot.get_updates().offset(offset).timeout(0).limit(1).await {
        debug!(error = %e, "failed to acknowledge telegram updates");
    }
}
