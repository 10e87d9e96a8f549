//! Dashboard insights.
//!
//! Cross-sell and churn-risk rows come precomputed from database functions.
//! The stock runout projection is computed here: units sold over a trailing
//! window give a daily sales rate, and current stock divided by that rate gives
//! the days left before the product runs out.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, instrument};

use tabacaria_core::ProductId;

use crate::db::{InsightsRepository, RepositoryError};
use crate::models::{InsightsReport, ProductStock, SoldLine, StockRunout};

/// Length of the sales window, in days.
pub const RUNOUT_WINDOW_DAYS: i64 = 15;

/// Days reported for a product with no sales in the window.
pub const NO_SALES_DAYS_REMAINING: i64 = 999;

/// Products lasting this many days or more are not reported.
pub const RUNOUT_HORIZON_DAYS: i64 = 60;

/// Maximum number of products reported.
pub const RUNOUT_LIMIT: usize = 10;

/// Project when each product runs out of stock.
///
/// Returns the products with fewer than [`RUNOUT_HORIZON_DAYS`] days of stock
/// left, soonest first, at most [`RUNOUT_LIMIT`] of them.
#[must_use]
pub fn project_stock_runout(sales: &[SoldLine], products: &[ProductStock]) -> Vec<StockRunout> {
    let mut sold: BTreeMap<ProductId, i64> = BTreeMap::new();
    for line in sales {
        *sold.entry(line.product_id).or_default() += line.quantity;
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let mut projected: Vec<StockRunout> = products
        .iter()
        .map(|product| {
            let sold_in_window = sold.get(&product.id).copied().unwrap_or_default();
            let daily_rate = sold_in_window as f64 / RUNOUT_WINDOW_DAYS as f64;
            let days_remaining = if daily_rate > 0.0 {
                (product.stock_quantity as f64 / daily_rate).floor() as i64
            } else {
                NO_SALES_DAYS_REMAINING
            };

            StockRunout {
                product_id: product.id,
                name: product.name.clone(),
                stock_quantity: product.stock_quantity,
                sold_in_window,
                daily_rate,
                days_remaining,
            }
        })
        .filter(|runout| runout.days_remaining < RUNOUT_HORIZON_DAYS)
        .collect();

    projected.sort_by_key(|runout| (runout.days_remaining, runout.product_id));
    projected.truncate(RUNOUT_LIMIT);
    projected
}

/// Insights service.
pub struct InsightsService<'a> {
    insights: &'a dyn InsightsRepository,
}

impl<'a> InsightsService<'a> {
    /// Create a new insights service.
    #[must_use]
    pub const fn new(insights: &'a dyn InsightsRepository) -> Self {
        Self { insights }
    }

    /// Stock runout projection as of `now`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a query fails.
    #[instrument(skip(self))]
    pub async fn stock_runout(&self, now: DateTime<Utc>) -> Result<Vec<StockRunout>, RepositoryError> {
        let since = now - Duration::days(RUNOUT_WINDOW_DAYS);
        let sales = self.insights.units_sold_since(since).await?;

        let mut ids: Vec<ProductId> = sales.iter().map(|line| line.product_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let products = self.insights.product_stock(&ids).await?;
        let runout = project_stock_runout(&sales, &products);

        debug!(
            products_sold = ids.len(),
            at_risk = runout.len(),
            "Stock runout projected"
        );
        Ok(runout)
    }

    /// Full dashboard report as of `now`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a query fails.
    #[instrument(skip(self))]
    pub async fn report(&self, now: DateTime<Utc>) -> Result<InsightsReport, RepositoryError> {
        let cross_sell = self.insights.cross_sell_pairs().await?;
        let churn_risk = self.insights.churn_risk_customers().await?;
        let stock_runout = self.stock_runout(now).await?;

        Ok(InsightsReport {
            cross_sell,
            churn_risk,
            stock_runout,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;
    use crate::models::CrossSellPair;
    use rust_decimal::Decimal;

    fn product(id: i64, stock: i64) -> ProductStock {
        ProductStock {
            id: ProductId::new(id),
            name: format!("Produto {id}"),
            stock_quantity: stock,
        }
    }

    fn sale(id: i64, quantity: i64) -> SoldLine {
        SoldLine {
            product_id: ProductId::new(id),
            quantity,
        }
    }

    #[test]
    fn test_rate_and_days_remaining() {
        let runout = project_stock_runout(&[sale(1, 10), sale(1, 20)], &[product(1, 100)]);

        assert_eq!(runout.len(), 1);
        assert_eq!(runout[0].sold_in_window, 30);
        assert_eq!(runout[0].daily_rate, 2.0);
        assert_eq!(runout[0].days_remaining, 50);
    }

    #[test]
    fn test_days_remaining_is_floored() {
        // 7 sold -> rate 0.4666..., 10 / rate = 21.43
        let runout = project_stock_runout(&[sale(1, 7)], &[product(1, 10)]);
        assert_eq!(runout[0].days_remaining, 21);
    }

    #[test]
    fn test_zero_velocity_is_excluded() {
        let runout = project_stock_runout(&[], &[product(1, 3)]);
        assert!(runout.is_empty());
    }

    #[test]
    fn test_horizon_is_exclusive() {
        // 15 sold -> rate 1.0; 60 in stock -> exactly 60 days
        let runout = project_stock_runout(
            &[sale(1, 15), sale(2, 15)],
            &[product(1, 60), product(2, 59)],
        );
        assert_eq!(runout.len(), 1);
        assert_eq!(runout[0].product_id, ProductId::new(2));
        assert_eq!(runout[0].days_remaining, 59);
    }

    #[test]
    fn test_sorted_ascending_and_limited() {
        let sales: Vec<SoldLine> = (1..=12).map(|id| sale(id, 15)).collect();
        let products: Vec<ProductStock> = (1..=12).map(|id| product(id, 50 - id)).collect();

        let runout = project_stock_runout(&sales, &products);

        assert_eq!(runout.len(), RUNOUT_LIMIT);
        assert_eq!(runout[0].product_id, ProductId::new(12));
        assert_eq!(runout[0].days_remaining, 38);
        assert!(
            runout
                .windows(2)
                .all(|w| w[0].days_remaining <= w[1].days_remaining)
        );
    }

    #[tokio::test]
    async fn test_report_uses_trailing_window() {
        let now = Utc::now();
        let store = InMemoryStore::new()
            .with_product(ProductId::new(1), "Carvão de coco", Decimal::new(3000, 2), 100)
            .with_product(ProductId::new(2), "Rosh cerâmica", Decimal::new(4500, 2), 4)
            .with_sale(ProductId::new(1), 30, now - Duration::days(3))
            .with_sale(ProductId::new(2), 40, now - Duration::days(20))
            .with_cross_sell(vec![CrossSellPair {
                product_a: "Carvão de coco".to_string(),
                product_b: "Rosh cerâmica".to_string(),
                times_bought_together: 12,
            }]);

        let report = InsightsService::new(&store).report(now).await.unwrap();

        assert_eq!(report.cross_sell.len(), 1);
        assert!(report.churn_risk.is_empty());
        assert_eq!(report.stock_runout.len(), 1);
        assert_eq!(report.stock_runout[0].name, "Carvão de coco");
        assert_eq!(report.stock_runout[0].days_remaining, 50);
    }
}
