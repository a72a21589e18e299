mod server;

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tasky_agent::{GeminiClient, TaskAgent};
use tasky_channels::transcribe::WhisperTranscriber;
use tasky_channels::whatsapp::WhatsAppClient;
use tasky_core::{config, traits::Transcriber};
use tasky_store::Store;

#[derive(Parser)]
#[command(name = "tasky", version, about = "Tasky — WhatsApp task assistant")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook server.
    Start,
    /// Check configuration and collaborator availability.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Start => {
            let cfg = config::load(&cli.config)?;
            cfg.validate()?;

            let store = Store::new(&cfg.store).await?;
            let whatsapp = WhatsAppClient::new(&cfg.whatsapp);
            let agent = TaskAgent::new(&cfg.agent, &cfg.prompts, store.clone());

            if !agent.is_available().await {
                anyhow::bail!("gemini is not available with the configured API key");
            }

            let transcriber = cfg
                .whatsapp
                .whisper_api_key
                .as_deref()
                .filter(|key| !key.is_empty())
                .map(|key| {
                    Arc::new(WhisperTranscriber::new(whatsapp.clone(), key.to_string()))
                        as Arc<dyn Transcriber>
                });

            let state = server::AppState {
                store,
                sender: Arc::new(whatsapp),
                agent: Arc::new(agent),
                transcriber,
                verify_token: cfg.whatsapp.verify_token.clone(),
                app_secret: cfg.whatsapp.app_secret.clone(),
                summary_template: cfg.prompts.daily_summary.clone(),
            };

            println!("Tasky — starting webhook server...");
            server::serve(&cfg.server.host, cfg.server.port, state).await?;
        }
        Commands::Status => {
            let cfg = config::load(&cli.config)?;
            println!("Tasky — Status Check\n");
            println!("Config: {}", cli.config);

            match cfg.validate() {
                Ok(()) => println!("  settings: complete"),
                Err(e) => println!("  settings: {e}"),
            }
            println!("  db path: {}", cfg.store.db_path);
            println!(
                "  whisper: {}",
                if cfg
                    .whatsapp
                    .whisper_api_key
                    .as_deref()
                    .is_some_and(|k| !k.is_empty())
                {
                    "configured"
                } else {
                    "not configured"
                }
            );

            let gemini = GeminiClient::new(cfg.agent.gemini_api_key.clone());
            println!(
                "  gemini: {}",
                if gemini.is_available().await {
                    "available"
                } else {
                    "not available"
                }
            );
        }
    }

    Ok(())
}
