//! HTTP server binary for bill-extract.
//!
//! A thin shim over the library crate: parse flags, resolve the LLM
//! provider, make sure a pdfium library is available, and serve.

use std::sync::Arc;

use anyhow::{Context, Result};
use bill_extract::{resolve_provider, AppState, ExtractionConfig, ProviderModel};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Extract structured line items from bill/invoice documents over HTTP.
#[derive(Parser, Debug)]
#[command(
    name = "bill-extract-server",
    version,
    about = "Bill/invoice line-item extraction service using Vision LLMs",
    long_about = "Serve POST /extract-bill-data: fetch a bill document (PDF or image) by URL, \
rasterise it, extract line items page-by-page with a Vision Language Model, and reconcile \
duplicates across pages. Provider credentials come from the environment (OPENAI_API_KEY, \
ANTHROPIC_API_KEY, …)."
)]
struct Cli {
    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// LLM model ID (e.g. gpt-4o).
    #[arg(long, env = "BILL_EXTRACT_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, …
    /// Auto-detected from API key env vars if not set.
    #[arg(long, env = "BILL_EXTRACT_PROVIDER")]
    provider: Option<String>,

    /// Sampling temperature for model calls (0.0–2.0).
    #[arg(long, env = "BILL_EXTRACT_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Max model output tokens per call.
    #[arg(long, env = "BILL_EXTRACT_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "BILL_EXTRACT_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    // PDFium is downloaded on first run and cached; subsequent startups are
    // an instant path check. Doing it here keeps the first PDF request from
    // paying the download.
    if !pdfium_auto::is_pdfium_cached() {
        tracing::info!("Downloading PDFium engine (first run only)…");
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
            .context("Failed to download PDFium engine")?;
    }

    let mut builder = ExtractionConfig::builder()
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens);
    if let Some(model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    let config = builder.build().context("Invalid configuration")?;

    let provider = resolve_provider(&config).context("No usable LLM provider")?;
    let model = Arc::new(ProviderModel::new(provider, &config));

    let app = bill_extract::router(AppState {
        model,
        config: Arc::new(config),
    });

    let addr = format!("0.0.0.0:{}", cli.port);
    tracing::info!("Bill Extraction API running on port {}", cli.port);
    tracing::info!("Health check: http://localhost:{}/health", cli.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
