use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use model_transform::config::{Config, ConfigFile};
use model_transform::RequestContext;

#[derive(Parser)]
#[command(name = "model-transform")]
#[command(about = "Convert a workflow model to another format via the tenant transformation service", long_about = None)]
struct Cli {
    /// Model file to convert
    model_file: PathBuf,

    /// Format to convert the model into
    #[arg(short = 'f', long)]
    target_format: String,

    /// Format the model is currently in (sent only when given)
    #[arg(short, long)]
    source_format: Option<String>,

    /// Write the converted model here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Tenant hostname, e.g. acme.verify.example.com
    #[arg(long, env = "VERIFY_TENANT")]
    tenant: Option<String>,

    /// Bearer token for the tenant
    #[arg(long, env = "VERIFY_TOKEN", hide_env_values = true)]
    token: String,

    /// Path to client config file
    #[arg(short, long, env = "MODEL_TRANSFORM_CONFIG")]
    config: Option<String>,

    /// Per-request deadline in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "model_transform=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let config_path = shellexpand::tilde(path).to_string();
            let config = Config::from_file(&config_path)?;
            tracing::info!("Loaded config from {}", config_path);
            config
        }
        None => Config::from_config_file(ConfigFile::default())?,
    };

    let tenant = cli
        .tenant
        .as_deref()
        .or(config.tenant())
        .context("No tenant given; pass --tenant, set VERIFY_TENANT or TENANT in the config file")?
        .to_string();

    let mut ctx = RequestContext::new(tenant, cli.token);
    if let Some(ms) = cli.timeout_ms {
        ctx = ctx.with_timeout(Duration::from_millis(ms));
    }

    let client = config.client();
    let transformed = client
        .transform_from_file(
            &ctx,
            &cli.model_file,
            &cli.target_format,
            cli.source_format.as_deref(),
        )
        .await?;

    match &cli.output {
        Some(path) => {
            tokio::fs::write(path, &transformed)
                .await
                .context(format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote {} bytes to {}", transformed.len(), path.display());
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&transformed).await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}
