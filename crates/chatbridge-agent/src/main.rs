//! # chatbridge
//!
//! Console host for the Twitch session core: loads settings, connects with
//! the stored token, relays stdin lines to chat and prints the owner's chat
//! lines back, until Ctrl-C.

#![deny(unsafe_code)]

mod console;
mod shutdown;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chatbridge_core::logging::{self, LogFormat};
use chatbridge_core::{InMemoryTextBus, TextBus, TextEventSource};
use chatbridge_service::{SessionManager, TextBridge, TwitchClientFactory};
use chatbridge_settings::{SettingsStore, load_settings_from_path, settings_path};
use chatbridge_twitch::auth::OAuthConfig;
use clap::Parser;
use tracing::info;

use crate::shutdown::RelayTasks;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Twitch chat relay.
#[derive(Parser, Debug)]
#[command(name = "chatbridge", about = "Twitch chat relay for the text pipeline")]
struct Cli {
    /// Settings file (defaults to `~/.chatbridge/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Bearer token to log in with. Stored like an OAuth hand-off.
    #[arg(long)]
    token: Option<String>,

    /// Log level or filter directive (overrides settings).
    #[arg(long)]
    log_level: Option<String>,

    /// Print the OAuth authorization URL and exit.
    #[arg(long)]
    print_auth_url: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = cli.settings.unwrap_or_else(settings_path);
    let settings = load_settings_from_path(&path)
        .with_context(|| format!("failed to load settings from {}", path.display()))?;

    let level = cli
        .log_level
        .unwrap_or_else(|| settings.logging.level.clone());
    let _ = logging::init(&level, LogFormat::from_json_flag(settings.logging.json));

    if cli.print_auth_url {
        println!("{}", OAuthConfig::from_settings(&settings).authorization_url()?);
        return Ok(());
    }

    let store = Arc::new(SettingsStore::persisted(settings, path));
    let bus: Arc<dyn TextBus> = Arc::new(InMemoryTextBus::new());
    let factory = Arc::new(TwitchClientFactory::new(store.clone()));
    let manager = Arc::new(SessionManager::new(store.clone(), factory));
    let mut tasks = RelayTasks::new();

    tasks.track(console::spawn_printer(
        bus.subscribe(TextEventSource::Textfield),
        tasks.token(),
    ));
    tasks.track(TextBridge::new(bus.clone(), manager.clone(), store.clone()).spawn(tasks.token()));

    if let Some(token) = cli.token {
        let _ = store.set_token(&token);
    }
    tasks.track(manager.start(tasks.token()));

    // stdin reads block a worker thread, so the reader is not awaited.
    drop(console::spawn_reader(
        bus.clone(),
        manager.clone(),
        store.clone(),
        tasks.token(),
    ));

    info!("chatbridge running, Ctrl-C to exit");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    info!("shutting down");
    let _ = tasks.drain(SHUTDOWN_TIMEOUT).await;
    manager.shutdown();
    Ok(())
}
