use std::{fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use rustydoc::{
    config,
    context::ServiceContext,
    logging::{self, ConsoleTarget},
    processing::PipelineService,
};
use serde_json::{Value, json};

#[derive(Parser)]
#[command(
    name = "process-event",
    about = "Process one trigger event through the document pipeline and print the result"
)]
struct Cli {
    /// Bucket holding the uploaded document.
    #[arg(long, requires = "key", conflicts_with = "event")]
    bucket: Option<String>,
    /// Object key of the uploaded document (already decoded).
    #[arg(long, requires = "bucket")]
    key: Option<String>,
    /// Path to a JSON trigger payload (direct event or object-store notification).
    #[arg(long)]
    event: Option<PathBuf>,
}

impl Cli {
    fn payload(&self) -> Result<Value> {
        match (&self.bucket, &self.key, &self.event) {
            (Some(bucket), Some(key), None) => Ok(json!({ "bucket": bucket, "key": key })),
            (None, None, Some(path)) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read event file {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("Event file {} is not valid JSON", path.display()))
            }
            _ => bail!("Provide either --bucket and --key, or --event <path>"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    config::load_env_file();
    logging::init_tracing_to(ConsoleTarget::Stderr);
    let payload = cli.payload()?;

    let config = config::load_config().context("Failed to load configuration")?;
    let context = ServiceContext::from_config(config).context("Failed to build service context")?;
    let service = PipelineService::new(context);

    let results = service.process_payload(&payload).await?;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
