//! Insight report commands.
//!
//! Run the same aggregations the dashboard reads, straight against the
//! database.

use chrono::Utc;
use tabacaria_api::db::{PgStore, create_pool};
use tabacaria_api::services::InsightsService;

use super::{CommandError, database_url};

async fn connect() -> Result<PgStore, CommandError> {
    let url = database_url()?;
    Ok(PgStore::new(create_pool(&url).await?))
}

/// Log products projected to run out of stock, soonest first.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a query fails.
pub async fn stock_runout() -> Result<(), CommandError> {
    let store = connect().await?;
    let runout = InsightsService::new(&store).stock_runout(Utc::now()).await?;

    if runout.is_empty() {
        tracing::info!("No product projected to run out");
    }
    for product in &runout {
        tracing::info!(
            product_id = %product.product_id,
            name = %product.name,
            stock = product.stock_quantity,
            sold = product.sold_in_window,
            days_remaining = product.days_remaining,
            "Stock runout"
        );
    }
    Ok(())
}

/// Print the full report as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a query fails.
pub async fn report() -> Result<(), CommandError> {
    let store = connect().await?;
    let report = InsightsService::new(&store).report(Utc::now()).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
