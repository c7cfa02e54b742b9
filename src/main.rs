use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use persona_chat::format::{FormatError, Formatter};
use persona_chat::llm::config::LlmConfig;
use persona_chat::llm::{HttpBackend, LlmError};
use persona_chat::persona::{Persona, PersonaError};
use persona_chat::render;
use persona_chat::session::ChatSession;
use persona_chat::terminal;

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("endpoint config: {0}")]
    Llm(#[from] LlmError),
    #[error("persona: {0}")]
    Persona(#[from] PersonaError),
    #[error("link allow-list: {0}")]
    Format(#[from] FormatError),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to write transcript {path}: {source}")]
    Transcript { path: String, source: std::io::Error },
}

#[derive(Parser, Debug)]
#[command(name = "persona-chat", about = "Chat with a portfolio persona backed by a completion endpoint")]
struct Cli {
    /// JSON profile describing the persona.
    #[arg(long, env = "CHAT_PERSONA_PATH")]
    persona: PathBuf,

    /// Display name; defaults to the profile's "name".
    #[arg(long, env = "CHAT_PERSONA_NAME")]
    persona_name: Option<String>,

    /// Milliseconds between revealed characters.
    #[arg(long, env = "CHAT_REVEAL_INTERVAL_MS", default_value_t = 20)]
    reveal_interval_ms: u64,

    /// Hosts whose links become clickable (comma separated).
    #[arg(long, env = "CHAT_LINK_ALLOWLIST", value_delimiter = ',')]
    link_allowlist: Vec<String>,

    /// Write the conversation as widget HTML on exit.
    #[arg(long, env = "CHAT_TRANSCRIPT_PATH")]
    transcript: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = LlmConfig::from_env()?;
    let backend = HttpBackend::from_config(&config)?;
    let persona = Persona::load(&cli.persona, cli.persona_name)?;
    let formatter = if cli.link_allowlist.is_empty() {
        Formatter::with_default_allowlist()?
    } else {
        Formatter::new(cli.link_allowlist.as_slice())?
    };

    info!(endpoint = backend.url(), persona = persona.name(), "persona-chat starting");
    let mut session = ChatSession::new(persona, formatter);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    terminal::run(
        &mut session,
        Arc::new(backend),
        Duration::from_millis(cli.reveal_interval_ms),
        stdin,
        &mut stdout,
        shutdown,
    )
    .await?;

    if let Some(path) = cli.transcript {
        std::fs::write(&path, render::widget_html(&session))
            .map_err(|source| AppError::Transcript { path: path.display().to_string(), source })?;
        info!(path = %path.display(), "transcript written");
    }
    Ok(())
}
