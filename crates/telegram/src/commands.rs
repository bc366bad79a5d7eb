use std::sync::Arc;

use teloxide::{
    dispatching::UpdateHandler,
    prelude::*,
    utils::command::BotCommands,
};
use tracing::{info, warn};

use common::Config;
use store::Subscribers;

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Dependencies injected into every handler via `dptree`.
#[derive(Clone)]
pub struct BotDeps {
    pub subscribers: Subscribers,
    pub cfg: Arc<Config>,
}

/// Commands any chat can issue. Subscription is open — no allow-list.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "RSI signal bot commands:")]
pub enum Command {
    #[command(description = "Subscribe to RSI alerts")]
    Start,
    #[command(description = "Unsubscribe from RSI alerts")]
    Stop,
    #[command(description = "Show settings and your subscription state")]
    Status,
}

/// Start the Telegram bot in long-polling mode.
pub async fn start_bot(token: String, deps: BotDeps) {
    let bot = Bot::new(token);
    let deps = Arc::new(deps);

    info!("Telegram bot starting (long-polling)");

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![deps])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start].endpoint(handle_start))
        .branch(case![Command::Stop].endpoint(handle_stop))
        .branch(case![Command::Status].endpoint(handle_status));

    Update::filter_message().branch(command_handler)
}

async fn handle_start(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let chat_id = msg.chat.id;
    if deps.subscribers.add(chat_id.0).await {
        info!(chat_id = chat_id.0, "New subscriber");
        bot.send_message(chat_id, "Subscribed. You will receive RSI alerts.")
            .await?;
    } else {
        bot.send_message(chat_id, "You are already subscribed.").await?;
    }
    Ok(())
}

async fn handle_stop(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let chat_id = msg.chat.id;
    if deps.subscribers.remove(chat_id.0).await {
        info!(chat_id = chat_id.0, "Subscriber left");
        bot.send_message(chat_id, "Unsubscribed. No more alerts.").await?;
    } else {
        bot.send_message(chat_id, "You were not subscribed.").await?;
    }
    Ok(())
}

async fn handle_status(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let chat_id = msg.chat.id;
    let cfg = &deps.cfg;
    let subscribed = if deps.subscribers.contains(chat_id.0).await {
        "subscribed"
    } else {
        "not subscribed"
    };
    let text = format!(
        "RSI Signal Bot\n\
         Symbols: {}\n\
         Timeframe: {}\n\
         RSI period: {}\n\
         Overbought: {} / Oversold: {}\n\
         Cooldown: {} min\n\
         You are {subscribed}.",
        cfg.symbols.join(", "),
        cfg.timeframe,
        cfg.rsi_period,
        cfg.overbought,
        cfg.oversold,
        cfg.cooldown_minutes,
    );
    bot.send_message(chat_id, text).await?;
    Ok(())
}

/// Deliver an alert to every current subscriber. Failures for one recipient
/// (blocked bot, deleted chat) are logged and never stop the rest.
pub async fn send_alert(bot: &Bot, chat_ids: &[ChatId], message: &str) {
    for &chat_id in chat_ids {
        if let Err(e) = bot.send_message(chat_id, message).await {
            warn!(chat_id = ?chat_id, error = %e, "Failed to deliver alert");
        }
    }
}
