//! Recover command: re-download a listing's still-remote images.

use super::{CliError, Context, parse_listing_id};

pub async fn run(id: &str) -> Result<(), CliError> {
    let listing_id = parse_listing_id(id)?;

    let ctx = Context::connect().await?;
    let outcome = ctx.importer().recover_images(listing_id).await?;

    #[allow(clippy::print_stdout)]
    {
        println!(
            "Recovered {}/{} remote images for {listing_id}",
            outcome.recovered, outcome.attempted
        );
    }
    Ok(())
}
