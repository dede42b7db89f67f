use async_trait::async_trait;
use secondhand_core::repository::{ProductGate, SaleRegistry};
use secondhand_core::{LedgerResult, ProductFacts};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::storage_error;

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    account_id: Uuid,
    name: String,
    price: i64,
    thumbnail: String,
    sold: bool,
    published: bool,
}

/// Read side of the listing catalogue plus the sold flag.
pub struct PgProductGate {
    pub pool: PgPool,
}

impl PgProductGate {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductGate for PgProductGate {
    async fn eligible_seller(&self, product_id: Uuid) -> LedgerResult<Option<Uuid>> {
        let owner: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT account_id FROM products
            WHERE id = $1 AND published AND NOT sold AND NOT deleted
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("check product eligibility", e))?;

        Ok(owner.map(|(id,)| id))
    }

    async fn find_product(&self, product_id: Uuid) -> LedgerResult<Option<ProductFacts>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, account_id, name, price, COALESCE(thumbnail, '') AS thumbnail, sold, published
            FROM products
            WHERE id = $1 AND NOT deleted
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("fetch product", e))?;

        Ok(row.map(|row| ProductFacts {
            id: row.id,
            owner_id: row.account_id,
            name: row.name,
            price: row.price,
            thumbnail: row.thumbnail,
            sold: row.sold,
            published: row.published,
        }))
    }
}

#[async_trait]
impl SaleRegistry for PgProductGate {
    async fn set_sold(&self, product_id: Uuid, sold: bool) -> LedgerResult<bool> {
        let result = sqlx::query(
            "UPDATE products SET sold = $2, updated_at = NOW() WHERE id = $1 AND NOT deleted",
        )
        .bind(product_id)
        .bind(sold)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("update product sale state", e))?;

        Ok(result.rows_affected() > 0)
    }
}
