//! Stdin/stdout stand-in for the host application's text field.
//!
//! Plain lines become final `textfield` events. Lines starting with `/` are
//! session commands. Chat lines echoed back from the channel are printed.

use std::sync::Arc;

use chatbridge_core::{TextBus, TextEvent, TextEventSource};
use chatbridge_service::SessionManager;
use chatbridge_settings::SettingsStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Origin tag for text typed into the console.
pub const CONSOLE_ORIGIN_TAG: &str = "console";

/// One console input line.
#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    /// Text to publish.
    Say(&'a str),
    /// `/login <token>`.
    Login(&'a str),
    /// `/logout`.
    Logout,
    /// `/open`: enable chat.
    Open,
    /// `/close`: disable chat.
    Close,
    /// `/status`.
    Status,
    /// `/auth-url`.
    AuthUrl,
    /// Unrecognized `/` command.
    Unknown(&'a str),
    /// Blank line.
    Empty,
}

/// Classify a line.
pub fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Say(line);
    };
    let (name, arg) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(name, arg)| (name, arg.trim()));
    match name {
        "login" if !arg.is_empty() => Command::Login(arg),
        "logout" => Command::Logout,
        "open" => Command::Open,
        "close" => Command::Close,
        "status" => Command::Status,
        "auth-url" => Command::AuthUrl,
        _ => Command::Unknown(name),
    }
}

/// Read stdin until EOF or cancellation.
pub fn spawn_reader(
    bus: Arc<dyn TextBus>,
    manager: Arc<SessionManager>,
    settings: Arc<SettingsStore>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = tokio::select! {
                () = cancel.cancelled() => break,
                line = lines.next_line() => line,
            };
            match line {
                Ok(Some(line)) => handle_line(&line, bus.as_ref(), &manager, &settings).await,
                Ok(None) => {
                    debug!("stdin closed");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "failed to read stdin");
                    break;
                }
            }
        }
    })
}

async fn handle_line(
    line: &str,
    bus: &dyn TextBus,
    manager: &SessionManager,
    settings: &SettingsStore,
) {
    match parse_command(line) {
        Command::Say(text) => bus.publish(
            TextEventSource::Textfield,
            TextEvent::final_text(text).with_origin(CONSOLE_ORIGIN_TAG),
        ),
        Command::Login(token) => match manager.login(token).await {
            Ok(Some(session)) => println!("logged in as {}", session.display_name),
            Ok(None) => println!("no token"),
            Err(e) => println!("login failed: {e}"),
        },
        Command::Logout => manager.logout(),
        Command::Open => {
            let _ = settings.update(|s| s.twitch.chat_enable = true);
        }
        Command::Close => {
            let _ = settings.update(|s| s.twitch.chat_enable = false);
        }
        Command::Status => println!("{}", status_line(manager)),
        Command::AuthUrl => match manager.authorization_url() {
            Ok(url) => println!("{url}"),
            Err(e) => println!("cannot build authorization URL: {e}"),
        },
        Command::Unknown(name) => println!("unknown command: /{name}"),
        Command::Empty => {}
    }
}

fn status_line(manager: &SessionManager) -> String {
    let who = manager
        .session()
        .map_or_else(|| "logged out".to_string(), |s| format!("@{}", s.login));
    format!(
        "{who} | chat {} | {}",
        manager.chat_status(),
        if manager.is_live() { "live" } else { "offline" }
    )
}

/// Print chat lines echoed onto the text field.
pub fn spawn_printer(
    mut events: broadcast::Receiver<TextEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                () = cancel.cancelled() => break,
                event = events.recv() => event,
            };
            match event {
                Ok(event) if event.is_from_chat() => println!("{}", render_chat(&event)),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "printer lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// `[chat] text` with emote words marked.
pub fn render_chat(event: &TextEvent) -> String {
    let words: Vec<String> = event
        .value
        .split(char::is_whitespace)
        .enumerate()
        .map(|(i, word)| {
            if event.emote_spans.contains_key(&i) {
                format!("<{word}>")
            } else {
                word.to_string()
            }
        })
        .collect();
    format!("[chat] {}", words.join(" "))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
