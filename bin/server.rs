// Coffee Bean DMS - Web Server
// REST API with Axum over the configured bean repository

use anyhow::{Context, Result};
use clap::Parser;
use coffee_dms::api::{router, AppState};
use coffee_dms::config::StorageConfig;
use coffee_dms::logging;
use std::path::PathBuf;
use tower_http::cors::CorsLayer;

#[derive(Parser, Debug)]
#[command(name = "inventory-server", version, about = "HTTP API for the coffee bean inventory")]
struct Args {
    /// SQLite database file; the in-memory store is used when omitted
    #[arg(long, env = "COFFEE_DMS_DB")]
    db: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "COFFEE_DMS_ADDR", default_value = "127.0.0.1:3000")]
    addr: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init("info");
    let args = Args::parse();

    let storage = StorageConfig::from_db_path(args.db.as_deref());
    let repo = storage
        .open()
        .with_context(|| format!("Failed to open {}", storage.describe()))?;
    tracing::info!(storage = %storage.describe(), "storage opened");

    let app = router(AppState::new(repo)).layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&args.addr)
        .await
        .with_context(|| format!("Failed to bind to {}", args.addr))?;

    println!("☕ Coffee Bean DMS - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("🚀 Server running on http://{}", args.addr);
    println!("   API: http://{}/api/lots", args.addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Server stopped with an error")?;

    Ok(())
}
