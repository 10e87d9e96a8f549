//! Insight aggregations for `PostgreSQL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::instrument;
use uuid::Uuid;

use tabacaria_core::{ProductId, UserId};

use super::{InsightsRepository, PgStore, RepositoryError};
use crate::models::{ChurnRiskCustomer, CrossSellPair, ProductStock, SoldLine};

#[derive(Debug, sqlx::FromRow)]
struct CrossSellRow {
    product_a: String,
    product_b: String,
    times_bought_together: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct ChurnRiskRow {
    user_id: Uuid,
    full_name: Option<String>,
    last_order_at: DateTime<Utc>,
    days_since_last_order: i32,
    total_spent: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct SoldLineRow {
    product_id: i64,
    quantity: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct ProductStockRow {
    id: i64,
    name: String,
    stock_quantity: i64,
}

impl From<CrossSellRow> for CrossSellPair {
    fn from(row: CrossSellRow) -> Self {
        Self {
            product_a: row.product_a,
            product_b: row.product_b,
            times_bought_together: row.times_bought_together,
        }
    }
}

impl From<ChurnRiskRow> for ChurnRiskCustomer {
    fn from(row: ChurnRiskRow) -> Self {
        Self {
            user_id: UserId::new(row.user_id),
            full_name: row.full_name,
            last_order_at: row.last_order_at,
            days_since_last_order: row.days_since_last_order,
            total_spent: row.total_spent,
        }
    }
}

#[async_trait]
impl InsightsRepository for PgStore {
    #[instrument(skip(self))]
    async fn cross_sell_pairs(&self) -> Result<Vec<CrossSellPair>, RepositoryError> {
        let rows = sqlx::query_as::<_, CrossSellRow>(
            r"
            SELECT product_a, product_b, times_bought_together::BIGINT AS times_bought_together
            FROM public.get_cross_sell_pairs()
            ",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn churn_risk_customers(&self) -> Result<Vec<ChurnRiskCustomer>, RepositoryError> {
        let rows = sqlx::query_as::<_, ChurnRiskRow>(
            r"
            SELECT user_id, full_name, last_order_at,
                   days_since_last_order::INT AS days_since_last_order, total_spent
            FROM public.get_churn_risk_customers()
            ",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn units_sold_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<SoldLine>, RepositoryError> {
        // Every order status counts, cancelled orders included.
        let rows = sqlx::query_as::<_, SoldLineRow>(
            r"
            SELECT oi.product_id, oi.quantity::BIGINT AS quantity
            FROM public.order_items oi
            JOIN public.orders o ON o.id = oi.order_id
            WHERE o.created_at >= $1 AND oi.product_id IS NOT NULL
            ",
        )
        .bind(since)
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| SoldLine {
                product_id: ProductId::new(row.product_id),
                quantity: row.quantity,
            })
            .collect())
    }

    #[instrument(skip(self), fields(count = ids.len()))]
    async fn product_stock(&self, ids: &[ProductId]) -> Result<Vec<ProductStock>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = ids.iter().map(ProductId::as_i64).collect();

        let rows = sqlx::query_as::<_, ProductStockRow>(
            r"
            SELECT id, name, stock_quantity::BIGINT AS stock_quantity
            FROM public.products
            WHERE id = ANY($1)
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ProductStock {
                id: ProductId::new(row.id),
                name: row.name,
                stock_quantity: row.stock_quantity,
            })
            .collect())
    }
}
