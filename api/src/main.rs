mod api_handlers;
mod collection;
mod filter_stage;

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use api_handlers::{health, list_offerings, AppState};
use clap::Parser;
use collection::MemoryCollection;
use filter_stage::FilterStage;
use poem::{get, listener::TcpListener, middleware::Cors, EndpointExt, Route, Server};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "api-server")]
#[command(about = "Resource API server with filter-expression support")]
struct Cli {
    /// Port to listen on (falls back to PORT, then 8080)
    #[arg(long)]
    port: Option<u16>,
    /// Query parameter carrying the filter expression (falls back to
    /// FILTER_PARAM, then "filter")
    #[arg(long)]
    filter_param: Option<String>,
    /// JSON file with an array of records to serve instead of the
    /// built-in sample
    #[arg(long)]
    data: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load .env file if it exists
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = cli
        .port
        .or_else(|| env::var("PORT").ok().and_then(|p| p.parse().ok()))
        .unwrap_or(8080);
    let filter_param = cli
        .filter_param
        .or_else(|| env::var("FILTER_PARAM").ok())
        .unwrap_or_else(|| "filter".to_string());

    let offerings = load_offerings(cli.data.as_deref())?;
    if offerings.is_empty() {
        tracing::warn!("No offering records loaded");
    } else {
        tracing::info!("Loaded {} offering records", offerings.len());
    }

    let state = Arc::new(AppState {
        offerings,
        stage: FilterStage::new(filter_param),
    });

    let addr = format!("0.0.0.0:{}", port);
    tracing::info!("Starting filter API server on {}", addr);

    let app = Route::new()
        .at("/api/v1/health", get(health))
        .at("/api/v1/offerings", get(list_offerings))
        .with(Cors::new())
        .data(state);

    Server::new(TcpListener::bind(addr)).run(app).await?;
    Ok(())
}

fn load_offerings(path: Option<&Path>) -> anyhow::Result<MemoryCollection> {
    let records = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading data file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing data file {}", path.display()))?
        }
        None => sample_offerings(),
    };
    Ok(MemoryCollection::new(records))
}

fn sample_offerings() -> Vec<serde_json::Value> {
    vec![
        json!({
            "name": "small-vps",
            "status": "active",
            "price": 12.5,
            "country": "US",
            "cpu": {"cores": 2, "brand": "amd"},
            "gpu": null,
        }),
        json!({
            "name": "gpu-node",
            "status": "active",
            "price": 250,
            "country": "DE",
            "cpu": {"cores": 16, "brand": "intel"},
            "gpu": {"name": "rtx4090", "memory_gb": 24},
        }),
        json!({
            "name": "storage-box",
            "status": "sold_out",
            "price": 40,
            "country": "NL",
            "cpu": {"cores": 4, "brand": "intel"},
            "gpu": null,
        }),
        json!({
            "name": "bare-metal",
            "status": "active",
            "price": 99,
            "country": "FI",
            "cpu": {"cores": 32, "brand": "amd"},
            "gpu": null,
        }),
    ]
}
