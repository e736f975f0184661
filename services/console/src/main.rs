mod commands;
mod config;

use crate::commands::{Command, HELP};
use crate::config::Config;
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::ChronoLocal;
use voicedeck_core::navigation;
use voicedeck_core::notify::{Notification, NotificationLevel};
use voicedeck_core::presentation::{self, ViewerSnapshot};
use voicedeck_core::session::{LogContent, OpenAiTransport, Role};
use voicedeck_core::shell::UiEffect;
use voicedeck_core::{SessionAudio, SessionContext, SessionStatus};

#[derive(Parser)]
#[command(version, about = "Voice-controlled presentation console")]
struct Cli {
    /// Presentation to open at startup.
    #[arg(long)]
    open: Option<String>,
    /// Start a voice session right away.
    #[arg(long)]
    start: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    let args = Cli::parse();

    // --- 3. Build the session context ---
    let transport = Arc::new(OpenAiTransport::new(config.realtime));
    let context = Arc::new(
        SessionContext::with_http_backends(config.core, config.catalog, transport)
            .context("Failed to set up the network backends")?,
    );
    tracing::info!("Session context ready");

    let renderers = [
        tokio::spawn(render_notifications(context.notifier().subscribe())),
        tokio::spawn(render_status(context.session().subscribe_status())),
        tokio::spawn(render_effects(context.clone(), context.shell().subscribe())),
        tokio::spawn(render_audio(context.session().subscribe_audio())),
    ];

    if let Some(id) = args.open {
        open(&context, &id);
    }
    if args.start {
        context.start().await;
    }

    println!("Type `help` for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read from stdin")?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl-C, shutting down...");
                break;
            }
        };
        let Some(line) = line else {
            break;
        };
        match commands::parse(&line) {
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => run(&context, command).await,
            Ok(None) => {}
            Err(e) => println!("{e}"),
        }
    }

    context.stop().await;
    context.unmount_presentation();
    for renderer in renderers {
        renderer.abort();
    }
    Ok(())
}

async fn run(context: &SessionContext, command: Command) {
    match command {
        Command::Start => {
            context.start().await;
        }
        Command::Stop => {
            context.stop().await;
        }
        Command::Toggle => {
            context.toggle().await;
        }
        Command::Voice(voice) => {
            println!("Voice set to {voice}. It applies to the next session.");
            context.set_voice(voice);
        }
        Command::Say(text) => {
            if let Err(e) = context.send_text(&text).await {
                println!("{e}");
            }
        }
        Command::Open(id) => open(context, &id),
        Command::Tool { name, arguments } => {
            let result = context.run_tool(&name, &arguments).await;
            match serde_json::to_string_pretty(&result) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::error!("failed to render the tool result: {}", e),
            }
        }
        Command::Log => print_log(context),
        Command::Status => {
            println!("session: {}", context.status());
            let totals = context.session().token_totals();
            println!(
                "tokens:  {} in, {} out, {} total",
                totals.input_tokens, totals.output_tokens, totals.total_tokens
            );
            println!("route:   {}", context.shell().route());
            match context.presentation() {
                Some(snapshot) => println!("showing: {}", describe(&snapshot)),
                None => println!("showing: no presentation"),
            }
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
}

/// Opens a presentation through the shell so the route and the mounted
/// viewer stay in step.
fn open(context: &SessionContext, id: &str) {
    if presentation::builtin(id).is_none() {
        println!("No presentation `{id}`. Available: {}.", presentation::BUILTIN_IDS.join(", "));
        return;
    }
    context.shell().navigate(&navigation::presentation_route(id));
}

fn describe(snapshot: &ViewerSnapshot) -> String {
    let mut line = format!(
        "{} slide {} of {}",
        snapshot.presentation_id,
        snapshot.current + 1,
        snapshot.total
    );
    if snapshot.paused {
        line.push_str(" (paused)");
    }
    if snapshot.fullscreen {
        line.push_str(" (fullscreen)");
    }
    line
}

fn print_log(context: &SessionContext) {
    let log = context.log();
    if log.is_empty() {
        println!("The log is empty.");
        return;
    }
    for entry in log.entries() {
        let who = match entry.role {
            Role::User => "you",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };
        let time = entry.timestamp.format("%H:%M:%S");
        match &entry.content {
            LogContent::Text { text } => println!("[{time}] {who}: {text}"),
            LogContent::Invocation { name, arguments, .. } => println!("[{time}] {who}: calls {name} {arguments}"),
            LogContent::InvocationResult { name, result, .. } => {
                let outcome = if result.success { "ok" } else { "failed" };
                println!("[{time}] {who}: {name} {outcome}: {}", result.message);
            }
        }
        if let Some(usage) = entry.usage {
            println!("           tokens: {} in, {} out", usage.input_tokens, usage.output_tokens);
        }
    }
}

async fn render_notifications(mut notifications: broadcast::Receiver<Notification>) {
    loop {
        match notifications.recv().await {
            Ok(notification) => {
                let marker = match notification.level {
                    NotificationLevel::Success => "+",
                    NotificationLevel::Error => "!",
                    NotificationLevel::Info => "*",
                };
                println!("{marker} {}: {}", notification.title, notification.description);
            }
            Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "notifications dropped"),
            Err(RecvError::Closed) => break,
        }
    }
}

async fn render_status(mut status: watch::Receiver<SessionStatus>) {
    while status.changed().await.is_ok() {
        let current = status.borrow_and_update().clone();
        println!("[session {current}]");
    }
}

/// The console has no speaker, so assistant audio is only counted.
async fn render_audio(mut audio: broadcast::Receiver<SessionAudio>) {
    loop {
        match audio.recv().await {
            Ok(SessionAudio::SpeechStarted) => println!("(listening)"),
            Ok(SessionAudio::Output(chunk)) => tracing::trace!(bytes = chunk.len(), "assistant audio"),
            Err(RecvError::Lagged(skipped)) => tracing::debug!(skipped, "audio chunks dropped"),
            Err(RecvError::Closed) => break,
        }
    }
}

/// Prints UI effects and keeps the mounted viewer in step with the route.
async fn render_effects(context: Arc<SessionContext>, mut effects: broadcast::Receiver<UiEffect>) {
    loop {
        match effects.recv().await {
            Ok(UiEffect::Navigate { route }) => {
                println!("-> {route}");
                if let Some(snapshot) = context.sync_route(&route) {
                    println!("   {}", describe(&snapshot));
                }
            }
            Ok(UiEffect::ThemeChanged { theme }) => println!("theme: {}", theme.as_str()),
            Ok(UiEffect::ClipboardWrite { text }) => println!("copied: {text}"),
            Ok(UiEffect::OpenUrl { url }) => println!("open in browser: {url}"),
            Ok(UiEffect::Confetti { duration_ms }) => println!("*** party mode for {duration_ms} ms ***"),
            Ok(UiEffect::Fullscreen { enabled }) => println!("fullscreen {}", if enabled { "on" } else { "off" }),
            Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "ui effects dropped"),
            Err(RecvError::Closed) => break,
        }
    }
}
