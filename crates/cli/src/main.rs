//! Clementine CLI - sourcing pipeline tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! clem migrate
//!
//! # Import a scraped document
//! clem import --url https://detail.1688.com/offer/1.html --file dump.json
//!
//! # Generate and store detail-page HTML
//! clem generate <listing-id>
//!
//! # Publish a listing into the catalog
//! clem publish <listing-id>
//!
//! # Re-download a listing's remote images
//! clem recover <listing-id>
//!
//! # Inspect staging listings
//! clem listing list
//! clem listing show <listing-id>
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "clem")]
#[command(author, version, about = "Clementine sourcing pipeline tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Import a scraped supplier document as a staging listing
    Import {
        /// Supplier product page URL
        #[arg(short, long)]
        url: String,

        /// Path to the scraped JSON document
        #[arg(short, long)]
        file: std::path::PathBuf,

        /// Pre-translated display name (skips the translation service)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Generate detail-page HTML for a listing and store it
    Generate {
        /// Listing id
        id: String,

        /// Print the generated HTML to stdout
        #[arg(long)]
        print: bool,
    },
    /// Publish a listing into the canonical catalog
    Publish {
        /// Listing id
        id: String,

        /// Category to publish into (defaults to the sourcing category)
        #[arg(short, long)]
        category_id: Option<String>,
    },
    /// Re-download a listing's still-remote images
    Recover {
        /// Listing id
        id: String,
    },
    /// Manage staging listings
    Listing {
        #[command(subcommand)]
        action: ListingAction,
    },
}

#[derive(Subcommand)]
enum ListingAction {
    /// List staging listings, newest first
    List {
        /// Page size
        #[arg(short, long, default_value_t = 20)]
        limit: i64,

        /// Offset into the list
        #[arg(short, long, default_value_t = 0)]
        offset: i64,
    },
    /// Show one listing as JSON
    Show {
        /// Listing id or source URL
        id: String,
    },
    /// Register a listing by hand
    Add {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Sale price
        #[arg(short, long)]
        price: rust_decimal::Decimal,

        /// Description
        #[arg(short, long)]
        description: Option<String>,

        /// Image URL or local path (repeatable)
        #[arg(short, long)]
        image: Vec<String>,
    },
    /// Delete a listing
    Delete {
        /// Listing id
        id: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Import { url, file, name } => {
            commands::import::run(&url, &file, name).await?;
        }
        Commands::Generate { id, print } => commands::generate::run(&id, print).await?,
        Commands::Publish { id, category_id } => {
            commands::publish::run(&id, category_id.as_deref()).await?;
        }
        Commands::Recover { id } => commands::recover::run(&id).await?,
        Commands::Listing { action } => match action {
            ListingAction::List { limit, offset } => {
                commands::listing::list(limit, offset).await?;
            }
            ListingAction::Show { id } => commands::listing::show(&id).await?,
            ListingAction::Add {
                name,
                price,
                description,
                image,
            } => commands::listing::add(name, price, description, image).await?,
            ListingAction::Delete { id } => commands::listing::delete(&id).await?,
        },
    }
    Ok(())
}
