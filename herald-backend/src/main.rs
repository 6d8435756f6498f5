use dotenv::dotenv;
use std::sync::Arc;
use tokio::sync::oneshot;

mod channels;
mod commands;
mod config;
mod error;
mod gateway;
mod settings;

use channels::dispatcher::blocklist;
use channels::CommandDispatcher;
use config::Config;
use gateway::{EventBroadcaster, EventType};
use settings::{MemorySettingProvider, ScopeSettings};

/// Mirror dispatcher notifications into the log
fn spawn_event_logger(broadcaster: &EventBroadcaster) {
    let (subscriber_id, mut event_rx) = broadcaster.subscribe();
    log::debug!(
        "Event logger subscribed as {} ({} subscribers)",
        subscriber_id,
        broadcaster.subscriber_count()
    );
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event.event_type() {
                Some(EventType::CommandError) => log::warn!("[EVENT] {} {}", event.event, event.data),
                Some(EventType::DispatcherDebug) => log::trace!("[EVENT] {} {}", event.event, event.data),
                _ => log::debug!("[EVENT] {} {}", event.event, event.data),
            }
        }
    });
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    log::info!(
        "Command prefix {:?}, edit window {:?}, self mode {}",
        config.command_prefix,
        config.dispatcher.command_editable_duration,
        config.dispatcher.selfbot
    );

    let Some(token) = config.discord_bot_token.clone() else {
        log::error!("{} is not set, nothing to listen to", config::env_vars::DISCORD_BOT_TOKEN);
        return Ok(());
    };

    let settings = Arc::new(ScopeSettings::new(
        Arc::new(MemorySettingProvider::new()),
        config.command_prefix.clone(),
    ));
    if let Err(e) = settings.provider().init().await {
        log::error!("Failed to initialize settings: {}", e);
        return Ok(());
    }

    let registry = Arc::new(commands::create_default_registry());
    log::info!("Registered {} commands", registry.len());

    let broadcaster = Arc::new(EventBroadcaster::new());
    spawn_event_logger(&broadcaster);

    let dispatcher = Arc::new(CommandDispatcher::new(
        config.dispatcher.clone(),
        registry,
        settings.clone(),
        channels::discord::responder_for_token(&token),
        broadcaster.clone(),
    ));
    if !config.blocked_users.is_empty() {
        log::info!("Ignoring commands from {} blocked users", config.blocked_users.len());
        dispatcher.add_inhibitor(blocklist(config.blocked_users.clone()));
    }

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let listener_config = config.clone();
    let mut listener = tokio::spawn(async move {
        channels::discord::start_discord_listener(&listener_config, dispatcher, broadcaster, shutdown_rx).await
    });

    let result = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            log::info!("Shutdown requested");
            let _ = shutdown_tx.send(());
            listener.await
        }
        result = &mut listener => result,
    };

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::error!("Discord listener error: {}", e),
        Err(e) => log::error!("Discord listener task failed: {}", e),
    }

    if let Err(e) = settings.provider().destroy().await {
        log::warn!("Failed to release settings: {}", e);
    }
    Ok(())
}
