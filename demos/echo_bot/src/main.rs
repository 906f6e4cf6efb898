//! Echo Bot Example
//!
//! Repeats every group and friend message back to where it came from,
//! quoting the original.
//!
//! # Commands
//!
//! - `/ping` replies `pong`
//! - `/nudge` nudges the sender
//! - anything else is echoed
//!
//! # Usage
//!
//! ```bash
//! cargo run --package echo-bot -- --config mirai.toml
//! MIRAI_CONNECTION__QQ=10001 MIRAI_CONNECTION__VERIFY_KEY=INITKEY cargo run --package echo-bot
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use mirai::prelude::*;
use mirai::runtime::{logging, run_until_shutdown};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Configuration file. Searches `mirai.toml` in the usual places when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run listeners concurrently instead of in arrival order.
    #[arg(long)]
    concurrent: bool,
}

// ============================================================================
// Listeners
// ============================================================================

async fn on_group_message(bot: MiraiBot, message: Arc<GroupMessage>) -> bool {
    let group = message.sender.group.id;
    let text = message.message_chain.plain_text();
    info!("[Group {}] {} ({}): {}", group, message.sender.member_name, message.sender.id, text);

    let result = match text.trim() {
        "/ping" => bot
            .send_group_message(group, "pong", message.message_chain.message_id())
            .await
            .map(|_| ()),
        "/nudge" => bot.send_nudge(message.sender.id, group, Kind::Group).await,
        _ => bot
            .send_group_message(
                group,
                message.message_chain.without_source(),
                message.message_chain.message_id(),
            )
            .await
            .map(|_| ()),
    };

    if let Err(e) = result {
        error!("Failed to reply in group {}: {}", group, e);
    }
    true
}

async fn on_friend_message(bot: MiraiBot, message: Arc<FriendMessage>) -> bool {
    let friend = message.sender.id;
    info!("[Friend] {} ({}): {}", message.sender.nickname, friend, message.message_chain.plain_text());

    let echo = message.message_chain.without_source();
    if let Err(e) = bot.send_friend_message(friend, echo, None).await {
        error!("Failed to reply to {}: {}", friend, e);
    }
    true
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    let mut config = loader.load()?;
    if args.concurrent {
        config.session.mode = ExecutionMode::Concurrent;
    }

    logging::init_from_config(&config.logging);

    let bot = connect_from_config(&config).await?;
    info!(qq = bot.qq(), mode = %bot.mode(), "Echo bot is running");

    let replier = bot.clone();
    bot.listen_group_message(move |message| on_group_message(replier.clone(), message));
    let replier = bot.clone();
    bot.listen_friend_message(move |message| on_friend_message(replier.clone(), message));

    bot.listen_sync(|event: &BotLeaveEventKick| {
        info!("Kicked from group {} ({})", event.group.name, event.group.id);
        true
    });

    run_until_shutdown(&bot).await?;
    Ok(())
}
