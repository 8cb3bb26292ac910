//! Generate command: detail-page HTML for a staged listing.

use super::{CliError, Context, parse_listing_id};

pub async fn run(id: &str, print: bool) -> Result<(), CliError> {
    let listing_id = parse_listing_id(id)?;

    let ctx = Context::connect().await?;
    let importer = ctx.importer();

    let html = importer.generate_detail(listing_id).await?;
    importer.save_detail_content(listing_id, &html).await?;

    #[allow(clippy::print_stdout)]
    {
        if print {
            println!("{html}");
        } else {
            println!("Stored {} bytes of detail content for {listing_id}", html.len());
        }
    }
    Ok(())
}
