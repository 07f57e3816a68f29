//! Redactr - resume PDF text extraction with PII redaction

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use redactr::{
    api::build_app,
    config::RedactrConfig,
    ner::{EntityRecognizer, ModelStore},
    Pipeline, RedactionMode,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "redactr")]
#[command(author = "Redactr Team")]
#[command(version)]
#[command(about = "Extract resume PDF text with personal information removed")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "REDACTR_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Redact a PDF and print the sanitized text
    Redact {
        /// PDF file to redact
        pdf: PathBuf,

        /// replace or delete (defaults to the configured mode)
        #[arg(short, long)]
        mode: Option<RedactionMode>,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit JSON with replacements and per-kind counts
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Manage the named-entity model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[derive(Subcommand)]
enum ModelAction {
    /// Install the model into the configured model directory
    Install,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so redacted text on stdout stays clean
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("redactr={},tower_http=info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match &cli.config {
        Some(path) => RedactrConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => RedactrConfig::default(),
    };

    match cli.command {
        Commands::Redact {
            pdf,
            mode,
            output,
            json,
        } => {
            run_redact(&config, pdf, mode, output, json).await?;
        }
        Commands::Serve { host, port } => {
            run_server(config, host, port).await?;
        }
        Commands::Model {
            action: ModelAction::Install,
        } => {
            install_model(&config).await?;
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

/// Load the process-wide recognizer and build the pipeline
async fn build_pipeline(config: &RedactrConfig) -> Result<Pipeline> {
    let store = ModelStore::new(config.model.clone());
    let model = store
        .load_or_install()
        .await
        .context("loading the named-entity model")?;
    let recognizer: Arc<dyn EntityRecognizer> = Arc::new(model);
    Ok(Pipeline::from_config(config, recognizer)?)
}

async fn run_redact(
    config: &RedactrConfig,
    pdf: PathBuf,
    mode: Option<RedactionMode>,
    output: Option<PathBuf>,
    as_json: bool,
) -> Result<()> {
    let pipeline = build_pipeline(config).await?;
    let bytes = tokio::fs::read(&pdf)
        .await
        .with_context(|| format!("reading {}", pdf.display()))?;

    let redaction = tokio::task::spawn_blocking(move || pipeline.redact_pdf(&bytes, mode)).await??;
    if redaction.is_empty() {
        tracing::warn!(file = %pdf.display(), "No extractable text in PDF");
    }

    let rendered = if as_json {
        let replacements = redaction
            .replacements
            .as_ref()
            .map(|map| map.to_map())
            .unwrap_or_default();
        serde_json::to_string_pretty(&json!({
            "redactedText": &redaction.text,
            "empty": redaction.is_empty(),
            "replacementsCount": redaction.replacement_count(),
            "typeCounts": redaction.kind_counts(),
            "replacements": replacements,
            "passes": &redaction.passes,
        }))?
    } else {
        redaction.text.clone()
    };

    match output {
        Some(path) => {
            tokio::fs::write(&path, rendered)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(file = %path.display(), "Redacted text written");
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

async fn run_server(mut config: RedactrConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting Redactr server");
    let pipeline = Arc::new(build_pipeline(&config).await?);
    let app = build_app(pipeline, &config.server.cors_origins);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!(addr = %addr, "Redactr is listening. Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        })
        .await?;

    Ok(())
}

async fn install_model(config: &RedactrConfig) -> Result<()> {
    let store = ModelStore::new(config.model.clone());
    let dir = store.install().await.context("installing the named-entity model")?;
    let model = store.load().context("verifying the installed model")?;
    println!(
        "Installed model '{}' ({} names) into {}",
        model.name(),
        model.lexicon_size(),
        dir.display()
    );
    Ok(())
}

fn show_config(config: Option<&RedactrConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    println!("{}", config.to_toml()?);
    Ok(())
}
