// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

use tender_desk::catalog;
use tender_desk::filter::{FilterSelection, Selection};
use tender_desk::{
    compose, count_tenders, import_tenders, init_tracing, load_csv, setup_database, AppConfig,
    ListQuery, Presentation, SortConfig, SortField, SortOrder, TedV3Feed,
};

#[derive(Debug, Parser)]
#[command(name = "tender-desk", version, about = "Browse and manage procurement tenders")]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "TENDER_DB_PATH")]
    db: Option<PathBuf>,

    /// Rows per TED page
    #[arg(long, global = true, env = "TENDER_PAGE_SIZE")]
    page_size: Option<usize>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import local tenders from a CSV file (re-running skips rows already present)
    Import { csv: PathBuf },
    /// Import a saved TED search response (JSON)
    TedImport { json: PathBuf },
    /// Fetch the latest notices from the TED registry
    #[cfg(feature = "ted-sync")]
    TedSync {
        #[arg(long, env = "TED_API_ENDPOINT")]
        endpoint: Option<String>,
    },
    /// Print the tender list
    List(ListArgs),
    /// Interactive terminal UI (default)
    Ui,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// draft | active | closed | all
    #[arg(long, default_value = "all")]
    status: String,
    #[arg(long, default_value = "all")]
    organization: String,
    /// Case-insensitive title substring
    #[arg(long, default_value = "")]
    search: String,
    /// title | organization | deadline | budget | status
    #[arg(long)]
    sort: Option<SortField>,
    #[arg(long, default_value = "asc")]
    order: SortOrder,
    /// table | grid
    #[arg(long, default_value = "table")]
    view: Presentation,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(size) = cli.page_size.filter(|s| *s > 0) {
        config.page_size = size;
    }

    match cli.command.unwrap_or(Command::Ui) {
        Command::Import { csv } => {
            init_tracing("warn");
            run_import(&config, &csv)
        }
        Command::TedImport { json } => {
            init_tracing("warn");
            run_ted_import(&config, &json)
        }
        #[cfg(feature = "ted-sync")]
        Command::TedSync { endpoint } => {
            init_tracing("info");
            run_ted_sync(&config, endpoint.as_deref().unwrap_or(&config.ted_endpoint))
        }
        Command::List(args) => {
            init_tracing("warn");
            run_list(&config, args)
        }
        // No subscriber here: log lines would draw over the terminal UI
        Command::Ui => run_ui_mode(&config),
    }
}

fn open_database(config: &AppConfig) -> Result<Connection> {
    let conn = Connection::open(&config.db_path)
        .with_context(|| format!("Failed to open database {:?}", config.db_path))?;
    setup_database(&conn)?;
    Ok(conn)
}

fn run_import(config: &AppConfig, csv_path: &Path) -> Result<()> {
    println!("🗄️  Tender Import - CSV → SQLite + WAL");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("\n📂 Loading CSV...");
    let tenders = load_csv(csv_path)?;
    println!("✓ Loaded {} tenders from {:?}", tenders.len(), csv_path);

    println!("\n🔧 Setting up database...");
    let conn = open_database(config)?;
    println!("✓ Database initialized with WAL mode");

    println!("\n💾 Inserting tenders...");
    let inserted = import_tenders(&conn, &tenders)?;

    println!("\n🔍 Verifying database...");
    let count = count_tenders(&conn)?;

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ New tenders: {}", inserted);
    println!("✓ Already present: {}", tenders.len() - inserted);
    println!("✓ Database contains {} tenders", count);

    Ok(())
}

fn run_ted_import(config: &AppConfig, json_path: &Path) -> Result<()> {
    println!("🌍 TED Import - saved search response → SQLite");

    let body = std::fs::read_to_string(json_path)
        .with_context(|| format!("Failed to read {:?}", json_path))?;
    let conn = open_database(config)?;
    let batch = catalog::import_feed_json(&conn, &TedV3Feed::new(), &body)?;

    if batch.is_empty() {
        println!("ℹ️  No tenders found in TED response");
    } else {
        println!("✓ Synced {} tenders", batch.tenders.len());
    }
    if !batch.skipped.is_empty() {
        println!("⚠️  Skipped {} results (see log)", batch.skipped.len());
    }

    Ok(())
}

#[cfg(feature = "ted-sync")]
fn run_ted_sync(config: &AppConfig, endpoint: &str) -> Result<()> {
    use tender_desk::{upsert_ted_tenders, FeedClient};

    println!("🌍 TED Sync - {}", endpoint);

    let client = FeedClient::new(endpoint, Box::new(TedV3Feed::new()));
    let runtime = tokio::runtime::Runtime::new()?;
    let batch = runtime.block_on(client.fetch_latest())?;

    if batch.is_empty() {
        println!("ℹ️  No tenders found in TED response");
        return Ok(());
    }

    let conn = open_database(config)?;
    let written = upsert_ted_tenders(&conn, &batch.tenders, client.adapter_version())?;
    println!("✓ Successfully synced {} tenders", written);
    if !batch.skipped.is_empty() {
        println!("⚠️  Skipped {} results (see log)", batch.skipped.len());
    }

    Ok(())
}

fn run_list(config: &AppConfig, args: ListArgs) -> Result<()> {
    let conn = open_database(config)?;
    let (tenders, issues) = catalog::local_snapshot(&conn)?;

    let query = ListQuery {
        filter: FilterSelection {
            status: Selection::parse_status(&args.status)?,
            organization: Selection::parse_organization(&args.organization),
            search_text: args.search,
        },
        sort: args.sort.map(|field| SortConfig::new(field, args.order)),
        page: None,
        presentation: args.view,
    };
    let view = compose(&tenders, &query)?;

    println!("Total: {}  Active: {}", view.total, view.active);
    if issues.iter().any(|i| i.rejected) {
        println!("⚠️  {} rows rejected (unknown status)", issues.iter().filter(|i| i.rejected).count());
    }
    println!();

    if view.is_empty() {
        println!("No tenders match the current filters");
        return Ok(());
    }

    match view.presentation {
        Presentation::Table => {
            println!(
                "{:<40} {:<24} {:<16} {:>16} {:<8}",
                "Title", "Organization", "Deadline", "Budget", "Status"
            );
            for t in &view.tenders {
                println!(
                    "{:<40} {:<24} {:<16} {:>16} {:<8}",
                    t.title, t.organization, t.deadline_display, t.budget_display, t.status
                );
            }
        }
        Presentation::Grid => {
            for t in &view.tenders {
                println!("┌ {}", t.title);
                println!("│ {}", t.organization);
                println!("│ Deadline: {}  Budget: {}", t.deadline_display, t.budget_display);
                println!("└ {}\n", t.status);
            }
        }
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &AppConfig) -> Result<()> {
    println!("🖥️  Loading Tender Desk UI...\n");

    let conn = open_database(config)?;
    let mut app = ui::App::new(conn, config.page_size)?;

    println!("✓ Loaded {} tenders\n", app.view.total);
    println!("Starting UI... (Press 'q' to quit)\n");

    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &AppConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin tender-server --features server");
    std::process::exit(1);
}
