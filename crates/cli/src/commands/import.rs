//! Import command: scraped JSON document to staging listing.

use std::path::Path;

use clementine_sourcing::pipeline::ImportRequest;

use super::{CliError, Context};

pub async fn run(url: &str, file: &Path, name: Option<String>) -> Result<(), CliError> {
    let payload = serde_json::from_str(&tokio::fs::read_to_string(file).await?)?;

    let ctx = Context::connect().await?;
    let listing = ctx
        .importer()
        .import(ImportRequest {
            source_url: url.to_string(),
            payload,
            translated_name: name,
            translated_description: None,
        })
        .await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{} {} [{}]", listing.id, listing.translated_name, listing.status);
    }
    Ok(())
}
