//! `aerium-tui` — terminal dashboard for indoor-air-quality monitoring.
//!
//! Renders live sensor readings, a room "digital twin" with interactive
//! alert markers, and an alert table, driven by `aerium-core`'s
//! [`Monitor`](aerium_core::Monitor) over HTTP polling and the backend's
//! WebSocket push channel.
//!
//! Logs go to a file (default `/tmp/aerium-tui.log`) to avoid corrupting
//! the terminal UI.
//!
//! Entry point: CLI argument parsing, tracing setup, panic hooks, and app
//! launch.

mod action;
mod app;
mod data_bridge;
mod event;
mod screen;
mod screens;
mod sync;
mod theme;
mod tui;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use aerium_core::Monitor;

use crate::app::App;

/// Terminal dashboard for indoor-air-quality monitoring.
#[derive(Parser, Debug)]
#[command(name = "aerium-tui", version, about)]
struct Cli {
    /// Backend URL (e.g., http://iaq.local:8000)
    #[arg(short = 'u', long, env = "AERIUM_SERVER")]
    server: Option<String>,

    /// Configuration profile name
    #[arg(short = 'p', long, env = "AERIUM_PROFILE")]
    profile: Option<String>,

    /// Disable the WebSocket push channel (poll only)
    #[arg(long)]
    no_push: bool,

    /// Log file path
    #[arg(long, default_value = "/tmp/aerium-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Set up file-based tracing. We MUST NOT log to stdout/stderr — that
/// would corrupt the TUI output. Returns a guard that must be held for
/// the lifetime of the application so logs are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("aerium={log_level},aerium_tui={log_level}")));

    let log_dir = cli
        .log_file
        .parent()
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("aerium-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    guard
}

/// Build a [`Monitor`] from CLI args, if a server URL was provided.
fn build_monitor(cli: &Cli) -> Option<Monitor> {
    let server = cli.server.as_deref()?;
    let base_url: url::Url = match server.parse() {
        Ok(url) => url,
        Err(e) => {
            eprintln!("invalid server URL '{server}': {e}");
            return None;
        }
    };

    let mut config = aerium_core::MonitorConfig::new(base_url);
    config.websocket_enabled = !cli.no_push;
    Monitor::new(config).ok()
}

/// Try building a monitor from the config file (profile or default).
fn build_monitor_from_config(cli: &Cli) -> Option<Monitor> {
    let cfg = aerium_config::load_config().ok()?;
    let (_, profile) = aerium_config::resolve_profile(&cfg, cli.profile.as_deref()).ok()?;
    let mut config = aerium_config::profile_to_monitor_config(profile).ok()?;
    if cli.no_push {
        config.websocket_enabled = false;
    }
    let monitor = Monitor::new(config).ok()?;

    // Restore the session cache (last room, actuation states).
    monitor.session().restore(aerium_config::load_session());
    if let (Some(brand), Some(room)) = (&profile.brand, &profile.room) {
        monitor.session().set_active(brand, room);
    }
    Some(monitor)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Install panic/error hooks BEFORE entering the terminal.
    tui::install_hooks()?;

    // Tracing to file — hold the guard so logs flush on exit.
    let _log_guard = setup_tracing(&cli);

    info!(
        server = cli.server.as_deref().unwrap_or("(from config)"),
        "starting aerium-tui"
    );

    // Priority: CLI flags > config file profile.
    let monitor = build_monitor(&cli).or_else(|| build_monitor_from_config(&cli));
    let session = monitor.as_ref().map(|m| std::sync::Arc::clone(m.session()));

    let mut app = App::new(monitor);
    app.run().await?;

    // Best-effort session cache write on clean exit.
    if let Some(session) = session {
        if let Err(e) = aerium_config::save_session(&session.export()) {
            tracing::warn!(error = %e, "session cache write failed");
        }
    }

    Ok(())
}
