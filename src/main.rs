use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_widget::config::Config;
use chat_widget::tui::{self, EventHandler};
use chat_widget::{handler, ui, App};

#[derive(Parser, Debug)]
#[command(name = "chat-widget", version, about = "Chat with a hosted model from the terminal")]
struct Cli {
    /// Config file (defaults to <config dir>/chat-widget/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Send turns through the proxy; no API key is asked for
    #[arg(long, conflicts_with = "direct")]
    proxy: bool,

    /// Call the upstream API directly with a key entered at startup
    #[arg(long)]
    direct: bool,

    /// Proxy origin; the chat path is appended
    #[arg(long)]
    proxy_url: Option<String>,

    /// Upstream chat-completions URL
    #[arg(long)]
    upstream_url: Option<String>,

    /// Model identifier sent with every turn
    #[arg(short, long)]
    model: Option<String>,

    /// Log file (defaults to <cache dir>/chat-widget/chat-widget.log)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        if self.proxy {
            config.use_proxy = true;
        }
        if self.direct {
            config.use_proxy = false;
        }
        if let Some(url) = &self.proxy_url {
            config.proxy_url = url.clone();
        }
        if let Some(url) = &self.upstream_url {
            config.upstream_url = url.clone();
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        Ok(config)
    }

    fn log_path(&self) -> Result<PathBuf> {
        match &self.log_file {
            Some(path) => Ok(path.clone()),
            None => dirs::cache_dir()
                .map(|dir| dir.join("chat-widget").join("chat-widget.log"))
                .ok_or_else(|| anyhow!("Could not determine cache directory")),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The terminal belongs to the UI, so logs go to a file
    let log_path = cli.log_path()?;
    let log_dir = log_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let log_name = log_path
        .file_name()
        .ok_or_else(|| anyhow!("Invalid log file path: {}", log_path.display()))?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating {}", log_dir.display()))?;
    let file_appender = tracing_appender::rolling::never(&log_dir, log_name);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat_widget=info")),
        )
        .init();

    let config = cli.load_config()?;
    info!(use_proxy = config.use_proxy, "starting chat widget");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, App::new(&config)).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, mut app: App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event),
            None => break,
        }

        app.poll_pending().await;
    }

    info!("chat widget closed");
    Ok(())
}
