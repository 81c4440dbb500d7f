//! Command-line shim over the receipt2txn library.
//!
//! Runs one extraction against live services and prints the stored row as
//! JSON. Useful for smoke-testing credentials and prompt changes.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use receipt2txn::{
    ExtractRequest, ExtractionConfig, ExtractionPipeline, HttpUrlSigner, Identity, MemoryStore,
    OpenAiVision,
};

#[derive(Parser, Debug)]
#[command(
    name = "receipt2txn",
    about = "Extract a financial transaction from a receipt image",
    version
)]
struct Args {
    /// Storage path of the uploaded image (e.g. user-42/costco.jpg)
    image_path: String,

    /// Image kind: receipt or screenshot
    #[arg(long, default_value = "receipt")]
    source_type: String,

    /// User id to attribute the transaction to
    #[arg(long, env = "RECEIPT2TXN_USER")]
    user: String,

    /// Storage gateway base URL
    #[arg(long, env = "STORAGE_BASE_URL")]
    storage_url: String,

    /// Storage service key used to sign read URLs
    #[arg(long, env = "STORAGE_SERVICE_KEY", hide_env_values = true)]
    storage_key: String,

    /// Vision model identifier
    #[arg(long, default_value = "gpt-4o-mini")]
    model: String,

    /// Model call budget in seconds
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// Default currency when the receipt shows none
    #[arg(long, default_value = "CAD")]
    currency: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("receipt2txn=info")),
        )
        .init();

    let args = Args::parse();

    let config = ExtractionConfig::builder()
        .model(&args.model)
        .model_timeout_secs(args.timeout)
        .default_currency(&args.currency)
        .build()
        .context("invalid configuration")?;

    let pipeline = ExtractionPipeline::new(
        Arc::new(HttpUrlSigner::new(&args.storage_url, &args.storage_key)),
        Arc::new(OpenAiVision::from_env(config.clone()).context("vision model not configured")?),
        Arc::new(MemoryStore::new()),
        config,
    );

    let identity = Identity::from_bearer(Some(&args.user)).context("invalid user")?;
    let request =
        ExtractRequest::new(&args.image_path, &args.source_type).context("invalid request")?;

    let record = pipeline
        .run(&request, &identity)
        .await
        .context("extraction failed")?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
