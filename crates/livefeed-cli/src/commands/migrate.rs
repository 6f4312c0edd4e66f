// Schema migration command

use anyhow::{Context, Result};

use crate::services::connect_store;

pub async fn run(database_url: &str, quiet: bool) -> Result<()> {
    let store = connect_store(database_url).await?;
    store.migrate().await.context("Failed to run migrations")?;

    if !quiet {
        println!("Migrations applied");
    }
    Ok(())
}
