//! Demo bot
//!
//! Run with:
//! ```bash
//! BOT_TOKEN=... cargo run -p bot-client
//! ```
//!
//! Configuration is loaded from environment variables (and `.env`).
//! Declares `/ping` and `/echo`, logs READY and new messages, and stops
//! on Ctrl-C.

use std::sync::Arc;

use bot_client::{
    Activity, Client, CommandArgs, CommandDeclaration, CommandOption, CommandResult,
    GatewayEventType, GatewayMessage, HandlerResult, InvocationContext, OptionKind, Presence,
};
use bot_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Bot stopped with an error");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        env = ?config.app.env,
        gateway = %config.gateway.connect_url(),
        intents = %config.bot.intents,
        "Configuration loaded"
    );

    let client = Client::from_config(&config)
        .presence(
            Presence::now(config.bot.status)
                .with_afk(config.bot.afk)
                .with_activity(Activity::listening("/ping")),
        )
        .on(GatewayEventType::Ready, on_ready)
        .on(GatewayEventType::MessageCreate, on_message)
        .command(
            CommandDeclaration::chat_input("ping", "Check that the bot is alive"),
            ping,
        )?
        .command(
            CommandDeclaration::chat_input("echo", "Repeat what you say").option(
                CommandOption::new("text", OptionKind::String)
                    .describe("Text to repeat")
                    .required(),
            ),
            echo,
        )?
        .build()?;

    let shutdown = client.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.shutdown().await;
        }
    });

    client.run().await?;
    Ok(())
}

async fn on_ready(event: Arc<GatewayMessage>) -> HandlerResult {
    if let Some(ready) = event.as_ready() {
        let guilds = event.d["guilds"].as_array().map_or(0, Vec::len);
        info!(user = %ready.user.username, guilds, "Logged in");
    }
    Ok(())
}

async fn on_message(event: Arc<GatewayMessage>) -> HandlerResult {
    let author = event.d["author"]["username"].as_str().unwrap_or("unknown");
    let content = event.d["content"].as_str().unwrap_or("");
    info!(author, content, "Message received");
    Ok(())
}

async fn ping(ctx: InvocationContext, _args: CommandArgs) -> CommandResult {
    ctx.reply("Pong!").await
}

async fn echo(ctx: InvocationContext, args: CommandArgs) -> CommandResult {
    let text = args.str("text")?.to_string();
    ctx.reply(text).await
}
