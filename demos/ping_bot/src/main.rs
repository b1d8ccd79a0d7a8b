//! Ping Bot
//!
//! Reads commands from stdin and answers on stdout. Address the bot with
//! `@<name>`:
//!
//! ```text
//! @pingbot ping
//! [console] pong
//! @pingbot echo hello there
//! [console] hello there
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package ping-bot -- --name pingbot
//! ```

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use botic::prelude::*;
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "A console ping bot")]
struct Args {
    /// Name the bot answers to.
    #[arg(long, default_value = "pingbot")]
    name: String,

    /// Configuration file (defaults to botic.toml lookup).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only accept commands from these users.
    #[arg(long = "allow-user")]
    allow_users: Vec<String>,
}

fn build_router(config: RouterConfig, allow_users: Vec<String>) -> CommandRouter {
    let started = Instant::now();
    let mut router = CommandRouter::with_config(config)
        .with_interceptor(interceptor::log_messages())
        .with(Command::new("ping", "replies pong", |event: MessageEvent| async move {
            event.reply("pong").await;
            Ok(())
        }))
        .with(Command::new(
            "echo",
            "repeats the given text",
            |event: MessageEvent| async move {
                if event.input_text.is_empty() {
                    return Err(Rejected::new("usage: echo <text>").into());
                }
                event.reply(&event.input_text).await;
                Ok(())
            },
        ))
        .with(Command::new(
            "uptime",
            "shows how long the bot has been running",
            move |event: MessageEvent| async move {
                let secs = started.elapsed().as_secs();
                event.reply(&format!("up for {secs}s")).await;
                Ok(())
            },
        ));

    if !allow_users.is_empty() {
        router.add_interceptor(interceptor::allow_users(allow_users));
    }
    router
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    let config = loader.load()?;
    logging::init_from_config(&config.logging);

    let router = build_router(config.router, args.allow_users);
    info!(commands = router.len(), "Router ready");

    let transport = ConsoleTransport::new(args.name);
    let bot = Bot::new(transport, router);
    bot.serve(CancellationToken::new()).await?;
    Ok(())
}
