use anyhow::Result;
use clap::{Parser, Subcommand};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use pricewise::config::AppConfig;
use pricewise::notify::SmtpNotifier;
use pricewise::repository::SqliteRepository;
use pricewise::service::ProductService;

#[derive(Parser)]
#[command(name = "pricewise", version, about = "Multi-retailer product price tracker")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape a product URL and merge it into the tracked history
    Scrape { url: String },
    /// Subscribe an email address to price alerts for a product
    Subscribe { product_id: String, email: String },
    /// Print one tracked product
    Show { product_id: String },
    /// List other recently tracked products
    Similar { product_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pricewise=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    // The pool is owned here and threaded into the repository; nothing else
    // holds connection state.
    let pool = SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout))
        .connect(&config.database.url)
        .await?;
    let repository = SqliteRepository::new(pool);
    repository.migrate().await?;

    let notifier = SmtpNotifier::new(config.smtp.clone());
    let service = ProductService::new(config, Arc::new(repository), Arc::new(notifier));

    match cli.command {
        Command::Scrape { url } => {
            let record = service.scrape_and_store(&url).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Subscribe { product_id, email } => {
            let outcome = service.subscribe(&product_id, &email).await?;
            info!(%product_id, "subscription handled");
            println!("{}", outcome.message());
        }
        Command::Show { product_id } => {
            let record = service.get_product(&product_id).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Similar { product_id } => {
            let records = service.similar_products(&product_id).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }

    Ok(())
}
