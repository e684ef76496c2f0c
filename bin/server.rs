// Tender Desk - Web Server
// REST API with Axum

use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::Connection;
use std::path::PathBuf;

use tender_desk::api::{router, AppState};
use tender_desk::{init_tracing, setup_database, AppConfig, FeedClient, TedV3Feed};

#[derive(Debug, Parser)]
#[command(name = "tender-server", version, about = "Tender Desk HTTP API")]
struct Args {
    /// SQLite database file
    #[arg(long, env = "TENDER_DB_PATH")]
    db: Option<PathBuf>,

    /// Listen address
    #[arg(long, env = "TENDER_BIND")]
    bind: Option<String>,

    /// TED search endpoint used by POST /api/ted/refresh
    #[arg(long, env = "TED_API_ENDPOINT")]
    ted_endpoint: Option<String>,

    /// Rows per TED page
    #[arg(long, env = "TENDER_PAGE_SIZE")]
    page_size: Option<usize>,

    /// Disable POST /api/ted/refresh
    #[arg(long)]
    no_sync: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("info");
    let args = Args::parse();

    let mut config = AppConfig::from_env();
    if let Some(db) = args.db {
        config.db_path = db;
    }
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(endpoint) = args.ted_endpoint {
        config.ted_endpoint = endpoint;
    }
    if let Some(size) = args.page_size.filter(|s| *s > 0) {
        config.page_size = size;
    }

    println!("🌐 Tender Desk - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let conn = Connection::open(&config.db_path)
        .with_context(|| format!("Failed to open database {:?}", config.db_path))?;
    setup_database(&conn)?;
    tracing::info!(db = ?config.db_path, "database ready");

    let feed = if args.no_sync {
        None
    } else {
        Some(FeedClient::new(&config.ted_endpoint, Box::new(TedV3Feed::new())))
    };

    let app = router(AppState::new(conn, feed, config.page_size));

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    println!("\n🚀 Server running on http://{}", config.bind);
    println!("   API: http://{}/api/tenders", config.bind);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Failed to start server")?;

    Ok(())
}
