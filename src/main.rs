//! consorcio-bot — Telegram group bot for rotating savings pools.

mod channels;
mod config;
mod consortium;
mod dialog;
mod handlers;
mod session;

use channels::{BotCommand, InboundEvent, TelegramChannel};
use clap::Parser;
use config::Config;
use handlers::Dispatcher;
use session::SqliteSessionStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const EVENT_QUEUE_DEPTH: usize = 100;
const LISTENER_INITIAL_BACKOFF_SECS: u64 = 2;
const LISTENER_MAX_BACKOFF_SECS: u64 = 60;

const PRIVATE_COMMANDS: &[BotCommand] = &[BotCommand {
    command: "start",
    description: "Inicializa o bot",
}];

const GROUP_COMMANDS: &[BotCommand] = &[
    BotCommand {
        command: "start",
        description: "Inicializa o bot",
    },
    BotCommand {
        command: "novo",
        description: "Cria um novo consórcio",
    },
];

#[derive(Parser, Debug)]
#[command(name = "consorcio-bot", version, about)]
struct Args {
    /// Config file path (defaults to the platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Session database path (overrides the config file)
    #[arg(long)]
    db: Option<PathBuf>,
}

/// Keep the Telegram listener running: restart it with exponential backoff if
/// it exits or errors out.
fn spawn_supervised_listener(
    channel: Arc<TelegramChannel>,
    tx: mpsc::Sender<InboundEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut backoff = LISTENER_INITIAL_BACKOFF_SECS;

        loop {
            let result = channel.listen(tx.clone()).await;

            if tx.is_closed() {
                break;
            }

            match result {
                Ok(()) => tracing::warn!("Telegram listener exited unexpectedly; restarting"),
                Err(e) => tracing::error!("Telegram listener error: {e}; restarting"),
            }

            tokio::time::sleep(Duration::from_secs(backoff)).await;
            backoff = backoff.saturating_mul(2).min(LISTENER_MAX_BACKOFF_SECS);
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    if config.telegram.bot_token.is_empty() {
        anyhow::bail!("No bot token configured. Set BOT_TOKEN or telegram.bot_token in the config file.");
    }

    let db_path = args.db.unwrap_or_else(|| config.db_path());
    let store = Arc::new(SqliteSessionStore::open(&db_path)?);
    tracing::info!("Session store at {}", db_path.display());

    let channel = Arc::new(TelegramChannel::new(
        config.telegram.bot_token.clone(),
        config.telegram.poll_timeout_secs,
    ));

    if !channel.health_check().await {
        tracing::warn!("Telegram getMe failed; check the bot token and connectivity");
    }

    if let Err(e) = channel.set_my_commands(PRIVATE_COMMANDS, GROUP_COMMANDS).await {
        tracing::warn!("Could not register command menu: {e}");
    }

    let (tx, rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let listener = spawn_supervised_listener(channel.clone(), tx);

    let dispatcher = Dispatcher::new(channel, store);

    tokio::select! {
        () = dispatcher.run(rx) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }

    listener.abort();
    Ok(())
}
