use std::{path::PathBuf, sync::Arc};

use {
    clap::Parser,
    relaybot_config::RelaybotConfig,
    relaybot_providers::ProviderRegistry,
    relaybot_telegram::{BotState, Conversation, PreferenceStore, TelegramMembership},
    tokio_util::sync::CancellationToken,
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "relaybot", about = "Relaybot, a members-only Telegram bridge to AI chat")]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "RELAYBOT_LOG_LEVEL")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false, env = "RELAYBOT_JSON_LOGS")]
    json_logs: bool,

    /// Config file to load instead of searching the working and config directories.
    #[arg(long, env = "RELAYBOT_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before clap reads its env-backed arguments.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "relaybot starting");

    let config = logged("config", load_config(&cli))?;
    logged("run", run(config).await)
}

/// Record a fatal error through tracing before it ends the process.
fn logged<T>(stage: &'static str, result: anyhow::Result<T>) -> anyhow::Result<T> {
    result.inspect_err(|e| error!(stage, error = %e, "relaybot failed, exiting"))
}

fn load_config(cli: &Cli) -> anyhow::Result<RelaybotConfig> {
    let config = relaybot_config::load(cli.config.as_deref())?;
    relaybot_config::validate(&config)?;
    Ok(config)
}

async fn run(config: RelaybotConfig) -> anyhow::Result<()> {
    let providers = Arc::new(ProviderRegistry::from_config(&config.providers));
    let preferences = Arc::new(PreferenceStore::new());

    let bot = relaybot_telegram::build_bot(&config.telegram)?;
    let bot_username = relaybot_telegram::connect(&bot).await?;

    let membership = Arc::new(TelegramMembership::new(bot.clone()));
    let conversation = Conversation::from_config(&config, membership, providers, preferences);
    let state = Arc::new(BotState::new(bot, bot_username, Arc::new(conversation)));

    let cancel = CancellationToken::new();
    let polling =
        relaybot_telegram::spawn_polling(state, config.telegram.poll_timeout_secs, cancel.clone());

    let liveness = if config.liveness.enabled {
        match relaybot_gateway::start_liveness(&config.liveness, cancel.clone()).await {
            Ok((addr, handle)) => {
                info!(%addr, "liveness endpoint ready");
                Some(handle)
            },
            Err(e) => {
                cancel.cancel();
                let _ = polling.await;
                return Err(e);
            },
        }
    } else {
        info!("liveness endpoint disabled");
        None
    };

    tokio::select! {
        _ = shutdown_signal() => info!("shutdown requested"),
        _ = cancel.cancelled() => warn!("polling stopped on its own, shutting down"),
    }
    cancel.cancel();

    if let Err(e) = polling.await {
        error!(error = %e, "telegram polling task panicked");
    }
    if let Some(handle) = liveness
        && let Err(e) = handle.await
    {
        error!(error = %e, "liveness task panicked");
    }

    info!("relaybot stopped");
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    let mut sigterm =
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(e) => {
                warn!(error = %e, "failed to register SIGTERM handler, only Ctrl-C will stop the bot");
                let _ = tokio::signal::ctrl_c().await;
                return;
            },
        };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("received SIGINT"),
        _ = sigterm.recv() => info!("received SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("received Ctrl-C");
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}
