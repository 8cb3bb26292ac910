//! Publish command: staging listing to canonical product.

use super::{CliError, Context, parse_category_id, parse_listing_id};

pub async fn run(id: &str, category_id: Option<&str>) -> Result<(), CliError> {
    let listing_id = parse_listing_id(id)?;
    let category_id = category_id.map(parse_category_id).transpose()?;

    let ctx = Context::connect().await?;
    let product = ctx.publisher().publish(listing_id, category_id).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("Published product {} ({})", product.id, product.name);
    }
    Ok(())
}
