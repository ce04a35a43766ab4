mod app;
mod components;
mod config;
mod error;
mod event;
mod folders;
mod handler;
mod remote;
mod theme;
mod tui;
mod ui;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::config::{AppConfig, ServerConfig, SessionConfig};
use crate::error::AppError;
use crate::event::{Event, EventHandler};
use crate::folders::manager::FolderManager;
use crate::folders::session::{FileSession, SessionStore};
use crate::remote::http::{HttpFolderApi, HttpSettings};
use crate::tui::{install_panic_hook, Tui};

/// Browse and manage an organization's document folders on the TCC backend.
#[derive(Parser, Debug)]
#[command(name = "tccf", version, about)]
struct Cli {
    /// Organization whose folders are shown
    #[arg(long)]
    org: Option<String>,

    /// Path to a config file (overrides the default locations)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend API base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Bearer token for the backend
    #[arg(long, env = "TCCF_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Start with an empty session (forget stored view state)
    #[arg(long)]
    fresh: bool,

    /// Log file (defaults to tccf.log in the state directory)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> AppConfig {
        AppConfig {
            server: ServerConfig {
                base_url: self.base_url.clone(),
                ..Default::default()
            },
            session: SessionConfig {
                token: self.token.clone(),
                organization_id: self.org.clone(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Log to a file; the terminal belongs to the UI.
fn init_logging(path: &Path) -> error::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));

    let log_file = cli
        .log_file
        .clone()
        .unwrap_or_else(|| config.state_dir().join("tccf.log"));
    init_logging(&log_file)?;

    let org = config
        .organization_id()
        .ok_or_else(|| AppError::Config("no organization given (use --org)".into()))?
        .to_string();
    let token = config
        .token()
        .ok_or_else(|| AppError::Config("no token given (use --token or TCCF_TOKEN)".into()))?
        .to_string();

    let mut session = FileSession::open(&config.session_file(&org));
    if cli.fresh {
        session.clear();
    }
    info!(org = %org, session = %session.path().display(), "starting");

    let api = HttpFolderApi::new(HttpSettings {
        base_url: config.base_url().to_string(),
        token,
        timeout: config.timeout(),
        connect_timeout: config.connect_timeout(),
    })?;

    let mut manager = FolderManager::new(
        Arc::new(api),
        Box::new(session),
        &org,
        config.current_user(),
    )
    .with_default_view(config.default_view());
    manager.init().await;

    install_panic_hook();

    let theme = theme::resolve_theme(&config.theme);
    let mut app = App::new(manager, theme, config.use_icons());
    app.absorb_notices();

    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(Duration::from_millis(100));

    while !app.should_quit {
        tui.terminal_mut().draw(|frame| {
            ui::render(&mut app, frame);
        })?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(&mut app, key).await,
            Event::Tick => app.clear_expired_status(),
            Event::Resize(_, _) => {}
        }
    }

    tui.restore()?;
    if let Some(message) = app.exit_message {
        eprintln!("{}", message);
    }
    Ok(())
}
