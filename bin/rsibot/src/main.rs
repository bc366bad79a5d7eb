use std::sync::Arc;

use teloxide::types::ChatId;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use common::{Alert, Config, IndicatorSource};
use engine::{Poller, TwelveDataClient};
use store::{JsonFileStorage, Subscribers, SubscriberStorage};
use telegram_ctrl::{start_bot, BotDeps};

const SUBSCRIBERS_FILE: &str = "subscribers.json";

#[tokio::main]
async fn main() {
    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Arc::new(Config::from_env());

    // ── Logging ──────────────────────────────────────────────────────────────
    let default_level = if cfg.debug_log { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(default_level.parse().unwrap()),
        )
        .init();
    info!(
        symbols = ?cfg.symbols,
        timeframe = %cfg.timeframe,
        period = cfg.rsi_period,
        "RSI signal bot starting"
    );

    // ── Subscriber store ──────────────────────────────────────────────────────
    let storage: Arc<dyn SubscriberStorage> = Arc::new(JsonFileStorage::new(SUBSCRIBERS_FILE));
    let subscribers = Subscribers::load(storage);

    // ── Poller ────────────────────────────────────────────────────────────────
    let source: Arc<dyn IndicatorSource> = Arc::new(TwelveDataClient::new(
        cfg.twelve_api_key.clone(),
        cfg.timeframe.clone(),
        cfg.rsi_period,
    ));
    let (alert_tx, mut alert_rx) = mpsc::channel::<Alert>(64);
    let poller_handle = tokio::spawn(Poller::new(cfg.clone(), source, alert_tx).run());

    // ── Alert fan-out (poller → every current subscriber) ─────────────────────
    let telegram_token = cfg.telegram_token.clone();
    let fanout_subs = subscribers.clone();
    tokio::spawn(async move {
        let bot = teloxide::Bot::new(telegram_token);
        while let Some(alert) = alert_rx.recv().await {
            let chat_ids: Vec<ChatId> = fanout_subs
                .snapshot()
                .await
                .into_iter()
                .map(ChatId)
                .collect();
            if chat_ids.is_empty() {
                debug!(symbol = %alert.symbol, "Alert fired with no subscribers");
                continue;
            }
            telegram_ctrl::send_alert(&bot, &chat_ids, &alert.format_message()).await;
        }
    });

    // ── Telegram commands ─────────────────────────────────────────────────────
    let bot_deps = BotDeps {
        subscribers,
        cfg: cfg.clone(),
    };
    tokio::spawn(start_bot(cfg.telegram_token.clone(), bot_deps));

    // Keep main alive
    info!("All tasks started. Waiting for shutdown signal.");
    tokio::signal::ctrl_c().await.unwrap();
    info!("Shutdown signal received. Stopping poller.");
    poller_handle.abort();
}
