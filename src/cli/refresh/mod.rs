//! Refresh command - rebuilds the category registry once and exits
//!
//! Embeds every category through the shared cache, so a run against Redis
//! warms the entries every serving instance reads.

use tracing::info;

/// Rebuild the registry and report how many categories were embedded
pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let state = crate::create_app_state_with_config(&config).await?;

    let count = state.registry_service.refresh().await?;
    info!(categories = count, "Category registry rebuilt");
    println!("Embedded {} categories", count);

    Ok(())
}
