//! Logs in and prints the first page of publishers and their placements.
//!
//! ```sh
//! APPNEXUS_USERNAME=... APPNEXUS_PASSWORD=... RUST_LOG=debug cargo run --example inventory
//! ```

use std::env;

use appnexus_client_sdk::{Client, ListOptions, SANDBOX_ENDPOINT};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let endpoint = env::var("APPNEXUS_ENDPOINT").unwrap_or_else(|_| SANDBOX_ENDPOINT.to_owned());
    let username = env::var("APPNEXUS_USERNAME")?;
    let password = env::var("APPNEXUS_PASSWORD")?;

    let client = Client::new(&endpoint)?;
    client.login(username, password).await?;

    let options = ListOptions::builder().num_elements(10).build();
    let publishers = client.publishers().list(options).await?;
    info!(count = ?publishers.pagination().map(|p| p.count), "publishers");

    for publisher in &publishers.items {
        let Some(id) = publisher.id else { continue };
        let placements = client.placements().list(id, options).await?;
        info!(publisher = %publisher.name, placements = placements.items.len());
    }

    info!(rate = ?client.rate(), "done");
    Ok(())
}
