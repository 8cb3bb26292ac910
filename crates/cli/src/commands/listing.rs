//! Listing management commands.

use rust_decimal::Decimal;

use clementine_sourcing::db::ListingStore;
use clementine_sourcing::pipeline::ManualEntry;

use super::{CliError, Context, parse_listing_id};

pub async fn list(limit: i64, offset: i64) -> Result<(), CliError> {
    let ctx = Context::connect().await?;
    let listings = ctx.store.list_listings(limit, offset).await?;
    let total = ctx.store.count_listings().await?;

    #[allow(clippy::print_stdout)]
    {
        for listing in &listings {
            println!(
                "{}  {:<9} {:>10} {}  {}",
                listing.id,
                listing.status.to_string(),
                listing.local_price,
                listing.currency,
                listing.translated_name,
            );
        }
        println!("{} of {total} listings", listings.len());
    }
    Ok(())
}

/// `id_or_url` may be a listing id or the original source URL.
pub async fn show(id_or_url: &str) -> Result<(), CliError> {
    let ctx = Context::connect().await?;
    let listing = match parse_listing_id(id_or_url) {
        Ok(listing_id) => ctx.store.get_listing(listing_id).await?,
        Err(_) => ctx.store.get_listing_by_source_url(id_or_url).await?,
    }
    .ok_or_else(|| CliError::InvalidArg(format!("no listing matching {id_or_url}")))?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&listing)?);
    }
    Ok(())
}

pub async fn add(
    name: String,
    price: Decimal,
    description: Option<String>,
    image_urls: Vec<String>,
) -> Result<(), CliError> {
    let ctx = Context::connect().await?;
    let listing = ctx
        .importer()
        .import_manual(ManualEntry {
            name,
            description,
            price,
            image_urls,
        })
        .await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{} {} [{}]", listing.id, listing.translated_name, listing.status);
    }
    Ok(())
}

pub async fn delete(id: &str) -> Result<(), CliError> {
    let listing_id = parse_listing_id(id)?;

    let ctx = Context::connect().await?;
    ctx.store.delete_listing(listing_id).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("Deleted listing {listing_id}");
    }
    Ok(())
}
