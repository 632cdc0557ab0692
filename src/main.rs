use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use codify_core::{Config, ExchangeController, GeminiClient};
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod markdown;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "codify")]
#[command(about = "Chat with Codify AI from the terminal", version)]
struct Cli {
    /// Base URL of the completion service (falls back to the hosted service)
    #[arg(long, global = true, env = "API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat (default)
    Chat,
    /// Send a single message and print the reply
    Ask {
        /// Your message
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = Config::resolve(cli.api_url);
    let client = GeminiClient::from_config(&config);

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            init_file_logging()?;
            tracing::info!(endpoint = %client.endpoint(), "starting chat session");
            run_chat(client).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Ask { message } => {
            init_stderr_logging();
            ask_once(&client, &message).await
        }
    }
}

/// The TUI owns the terminal, so logs go to a file.
fn init_file_logging() -> Result<()> {
    let path = log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn log_path() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .ok_or_else(|| anyhow!("Could not determine cache directory"))?;

    Ok(cache_dir.join("codify").join("codify.log"))
}

async fn run_chat(client: GeminiClient) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let endpoint = client.endpoint();
    let mut app = App::new(Arc::new(client), endpoint);
    let mut events = EventHandler::new();

    let result = event_loop(&mut terminal, &mut app, &mut events).await;

    app.abort_in_flight();
    tui::restore()?;
    result
}

async fn event_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(app, event);
        app.poll_exchange().await;
    }
    Ok(())
}

async fn ask_once(client: &GeminiClient, message: &str) -> Result<ExitCode> {
    let mut controller = ExchangeController::new();

    match controller.submit(client, message).await {
        Ok(_) => {
            if let Some(reply) = controller.conversation().last() {
                println!("{}", reply.text());
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            tracing::debug!(error = %err, "ask failed");
            eprintln!("{}", err.notice());
            Ok(ExitCode::FAILURE)
        }
    }
}
