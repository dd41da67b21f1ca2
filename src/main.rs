mod api;
mod chat_api;
mod config;
mod console;
mod intake;
mod model;
mod relay;
mod sdk;
mod server;
mod sheets;
mod widget;

use crate::chat_api::HttpChatApi;
use crate::config::AppConfig;
use crate::console::Console;
use crate::intake::IntakeHandler;
use crate::model::{ContactRecord, LeadRow};
use crate::relay::{DEFAULT_RELAY_TIMEOUT, IntakeClient};
use crate::server::AppState;
use crate::widget::ChatWidget;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "leadchat", version, about = "Lead-capture chat widget and intake service")]
struct Cli {
    /// TOML config file; environment variables are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the lead intake HTTP service.
    Serve,
    /// Chat with a /ask + /contact backend from the terminal.
    Chat {
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Relay one lead row to an intake endpoint.
    Submit(SubmitArgs),
}

#[derive(Debug, Args)]
struct SubmitArgs {
    #[arg(long)]
    question: String,
    #[arg(long)]
    answer: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    organization: Option<String>,
    /// Defaults to INTAKE_URL.
    #[arg(long)]
    intake_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::from_toml_file(path)?,
        None => AppConfig::from_env()?,
    };

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Chat { base_url } => chat(config, base_url).await,
        Command::Submit(args) => submit(config, args).await,
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let sheet = server::sheet_from_config(&config)?;
    let addr = config.bind_addr;
    let state = AppState::new(config, IntakeHandler::new(sheet));
    tracing::info!(%addr, "starting leadchat intake service");
    server::run(addr, state).await
}

async fn chat(config: AppConfig, base_url: Option<String>) -> anyhow::Result<()> {
    let base_url = base_url.unwrap_or(config.chat_base_url.clone());
    let api = HttpChatApi::new(&base_url, config.request_timeout())?;
    tracing::debug!(%base_url, "chat session started");
    let mut console = Console::new(
        ChatWidget::new(api),
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    );
    console.run().await?;
    Ok(())
}

async fn submit(config: AppConfig, args: SubmitArgs) -> anyhow::Result<()> {
    let url = args
        .intake_url
        .or(config.intake_url)
        .ok_or_else(|| anyhow::anyhow!("no intake url: pass --intake-url or set INTAKE_URL"))?;
    let mut row = LeadRow::interaction(args.question, args.answer);
    let lead = (
        args.name.unwrap_or_default(),
        args.email.unwrap_or_default(),
        args.organization.unwrap_or_default(),
    );
    if let Some(contact) = ContactRecord::from_fields(&lead.0, &lead.1, &lead.2) {
        row = row.with_contact(&contact);
    } else if !(lead.0.is_empty() && lead.1.is_empty() && lead.2.is_empty()) {
        anyhow::bail!("--name, --email and --organization must be given together");
    }

    let client = IntakeClient::new(&url, DEFAULT_RELAY_TIMEOUT)?;
    if !client.submit(&row).await {
        anyhow::bail!("intake endpoint did not accept the row");
    }
    println!("row appended");
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
