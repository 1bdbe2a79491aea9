//! `faltaquanto` — terminal client for the FaltaQuanto attendance tracker.
//!
//! # Usage
//!
//! ```text
//! faltaquanto --url http://localhost:5240 --email ana@example.com
//! faltaquanto --config ~/.config/faltaquanto/config.toml --log-file /tmp/fq.log
//! ```

mod app;
mod client;
mod form;
mod ui;

use std::{
  fs::OpenOptions,
  io,
  path::{Path, PathBuf},
  sync::Mutex,
  time::Duration,
};

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use client::ApiClient;
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:5240";
const DEFAULT_REFRESH_SECS: u64 = 5;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "faltaquanto", about = "Controle de faltas no terminal")]
struct Args {
  /// Path to a TOML config file (url, email, refresh_secs).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the FaltaQuanto server (default: http://localhost:5240).
  #[arg(long, env = "FALTAQUANTO_URL")]
  url: Option<String>,

  /// E-mail pre-filled on the login form.
  #[arg(long, env = "FALTAQUANTO_EMAIL")]
  email: Option<String>,

  /// Seconds between background refreshes of the subject list.
  #[arg(long)]
  refresh_secs: Option<u64>,

  /// Write logs to this file. Nothing is logged otherwise.
  #[arg(long, value_name = "FILE")]
  log_file: Option<PathBuf>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug, PartialEq, Eq)]
struct ConfigFile {
  #[serde(default)]
  url:          Option<String>,
  #[serde(default)]
  email:        Option<String>,
  #[serde(default)]
  refresh_secs: Option<u64>,
}

/// Settings after merging flags, environment and the config file.
#[derive(Debug, PartialEq, Eq)]
struct Settings {
  url:           String,
  email:         String,
  refresh_every: Duration,
}

impl Settings {
  /// Flags (and their env vars) win over the file, which wins over defaults.
  fn merge(args: &Args, file: ConfigFile) -> Self {
    let refresh_secs = args
      .refresh_secs
      .or(file.refresh_secs)
      .unwrap_or(DEFAULT_REFRESH_SECS)
      .max(1);
    Self {
      url:           args
        .url
        .clone()
        .or(file.url)
        .unwrap_or_else(|| DEFAULT_URL.to_string()),
      email:         args.email.clone().or(file.email).unwrap_or_default(),
      refresh_every: Duration::from_secs(refresh_secs),
    }
  }
}

fn read_config(path: &Path) -> Result<ConfigFile> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading config file {}", path.display()))?;
  toml::from_str(&raw).context("parsing config file")
}

/// The terminal belongs to the UI, so logs only go to a file when asked.
fn init_logging(path: &Path) -> Result<()> {
  let file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(path)
    .with_context(|| format!("opening log file {}", path.display()))?;
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_ansi(false)
    .with_writer(Mutex::new(file))
    .init();
  Ok(())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(path) = &args.log_file {
    init_logging(path)?;
  }

  let file_cfg = match &args.config {
    Some(path) => read_config(path)?,
    None => ConfigFile::default(),
  };
  let settings = Settings::merge(&args, file_cfg);
  tracing::info!(url = %settings.url, "starting client");

  let client = ApiClient::new(settings.url).context("building HTTP client")?;
  let mut app = App::new(client, settings.email, settings.refresh_every);

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Run the event loop; restore terminal even on error.
  let run_result = run_event_loop(&mut terminal, &mut app).await;

  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(200))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && key.kind == KeyEventKind::Press
      && !app.handle_key(key).await?
    {
      break;
    }

    app.tick().await;
  }

  Ok(())
}
