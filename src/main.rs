use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dotenvy::dotenv;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;
use tokio::time::sleep;

use skufy::broadcast::CreativeStaging;
use skufy::cli::{Cli, Commands};
use skufy::core::{config, init_logger, log_startup_configuration};
use skufy::payments::run_webhook_server;
use skufy::storage::create_pool;
use skufy::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to the appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Set up global panic handler so a panic in the dispatcher is logged
    // instead of silently terminating the process
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));

    // Load environment variables from .env if present
    let _ = dotenv();

    // Initialize logger (console + file)
    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Run { no_webhook }) => run_bot(no_webhook).await,
        None => {
            // No command specified - default to running the bot
            run_bot(false).await
        }
    }
}

/// Run the Telegram bot and the payment webhook server
async fn run_bot(no_webhook: bool) -> Result<()> {
    log::info!("Starting bot...");
    log_startup_configuration();

    let bot = create_bot()?;

    // Bot API may not be reachable right after a deploy; retry briefly
    let bot_info = {
        let max_retries = 5;
        let mut attempt = 0;
        loop {
            match bot.get_me().await {
                Ok(info) => break info,
                Err(e) => {
                    attempt += 1;
                    if attempt >= max_retries {
                        return Err(anyhow::anyhow!(
                            "Failed to connect to Bot API after {} retries: {}",
                            attempt,
                            e
                        ));
                    }
                    log::warn!(
                        "Bot API not ready (attempt {}/{}): {}. Retrying in 5 seconds...",
                        attempt,
                        max_retries,
                        e
                    );
                    sleep(Duration::from_secs(5)).await;
                }
            }
        }
    };
    log::info!("Bot username: {:?}, Bot ID: {}", bot_info.username, bot_info.id);

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    // Create database connection pool
    let db_pool = Arc::new(
        create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?,
    );

    // Payment webhook server runs next to the dispatcher
    if no_webhook {
        log::info!("Payment webhook server disabled (--no-webhook)");
    } else if let Some(secret_key) = config::payments::SECRET_KEY.clone() {
        let port = *config::WEBHOOK_PORT;
        let bot_webhook = bot.clone();
        let db_pool_webhook = Arc::clone(&db_pool);

        tokio::spawn(async move {
            if let Err(e) = run_webhook_server(port, bot_webhook, db_pool_webhook, secret_key).await {
                log::error!("Webhook server error: {}", e);
            }
        });
    } else {
        log::warn!("PRODAMUS_SECRET_KEY not set, payment webhook server disabled");
    }

    // Create the dispatcher handler tree
    let deps = HandlerDeps::new(Arc::clone(&db_pool), CreativeStaging::new());
    let handler = schema(deps);

    log::info!("Starting bot in long polling mode");

    // Polling listener that drops pending updates on start
    let listener = Polling::builder(bot.clone()).drop_pending_updates().build();

    Dispatcher::builder(bot, handler)
        .dependencies(DependencyMap::new())
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}
