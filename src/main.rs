use dotenvy::dotenv;
use mod_catalog_bot::access::AccessPolicy;
use mod_catalog_bot::bot::{handlers, ConversationController, TelegramGateway};
use mod_catalog_bot::catalog::{Catalog, SqliteCatalog};
use mod_catalog_bot::config::Settings;
use mod_catalog_bot::logging::{self, TokenRedactor};
use mod_catalog_bot::lookup::{LookupProvider, ModrinthClient};
use mod_catalog_bot::shutdown::ShutdownSignal;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    // Redaction must be in place before any log line can carry the token
    let redactor = TokenRedactor::new().map_err(|e| {
        eprintln!("Failed to compile log redaction rules: {e}");
        e
    })?;
    logging::init(redactor);

    info!("Starting Mod Catalog Bot...");

    let settings = init_settings();
    let catalog = init_catalog(&settings);

    let lookup: Arc<dyn LookupProvider> = Arc::new(ModrinthClient::from_settings(&settings));
    info!("Modrinth client initialized ({}).", settings.modrinth_api_url);

    let bot = Bot::new(settings.telegram_token.clone());
    let shutdown = ShutdownSignal::new();

    let controller = Arc::new(ConversationController::new(
        AccessPolicy::from_settings(&settings),
        catalog,
        lookup,
        Arc::new(TelegramGateway::new(bot.clone())),
        shutdown.clone(),
    ));

    let mut dispatcher = Dispatcher::builder(bot.clone(), handlers::schema())
        .dependencies(dptree::deps![controller])
        .enable_ctrlc_handler()
        .build();

    // Stop the dispatcher once the restart command raises the shutdown signal
    let dispatcher_token = dispatcher.shutdown_token();
    let watcher_signal = shutdown.clone();
    tokio::spawn(async move {
        watcher_signal.requested().await;
        match dispatcher_token.shutdown() {
            Ok(stopped) => stopped.await,
            Err(e) => warn!("Dispatcher was not running at shutdown: {e:?}"),
        }
    });

    // Updates queued while the bot was down are skipped, not replayed
    let listener = handlers::update_listener(bot);

    info!("Bot is running...");
    dispatcher
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    if shutdown.is_requested() {
        info!("Bot stopped on administrator request; waiting for the supervisor to restart it.");
    } else {
        info!("Bot stopped.");
    }
    Ok(())
}

fn init_settings() -> Settings {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_catalog(settings: &Settings) -> Arc<dyn Catalog> {
    match SqliteCatalog::open(&settings.database_path) {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => {
            error!(
                "Failed to open mod catalog at {}: {}",
                settings.database_path, e
            );
            std::process::exit(1);
        }
    }
}
