use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secondhand_core::repository::OfferRepository;
use secondhand_core::{
    LedgerResult, OfferDetail, OfferRecord, OfferWithBuyer, OfferWithCounterparty,
    OfferWithProduct, ProductSummary, ProfileSummary, SellerScope,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::storage_error;

const OFFER_COLUMNS: &str =
    "id, product_id, buyer_id, seller_id, price_offer, accepted, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct OfferRow {
    id: Uuid,
    product_id: Uuid,
    buyer_id: Uuid,
    seller_id: Uuid,
    price_offer: i64,
    accepted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OfferRow> for OfferRecord {
    fn from(row: OfferRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            buyer_id: row.buyer_id,
            seller_id: row.seller_id,
            price_offer: row.price_offer,
            accepted: row.accepted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BuyerOfferRow {
    offer_id: Uuid,
    buyer_id: Uuid,
    buyer_name: String,
    buyer_city: String,
    buyer_image: String,
    price_offer: i64,
    accepted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ProductOfferRow {
    offer_id: Uuid,
    product_id: Uuid,
    product_name: String,
    product_price: i64,
    product_image: String,
    price_offer: i64,
    accepted: bool,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CounterpartyOfferRow {
    offer_id: Uuid,
    party_id: Uuid,
    party_name: String,
    party_city: String,
    party_image: String,
    product_id: Uuid,
    product_name: String,
    product_price: i64,
    product_image: String,
    price_offer: i64,
    accepted: bool,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct DetailRow {
    offer_id: Uuid,
    product_id: Uuid,
    product_name: String,
    product_price: i64,
    product_image: String,
    buyer_id: Uuid,
    buyer_name: String,
    buyer_city: String,
    buyer_image: String,
    seller_id: Uuid,
    seller_name: String,
    seller_city: String,
    seller_image: String,
    price_offer: i64,
    accepted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub struct PgOfferRepository {
    pub pool: PgPool,
}

impl PgOfferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Listing query shared by "received" and "placed"; `party` picks which
    /// side of the offer is the counterparty and `filter` which side is us.
    async fn with_counterparty(
        &self,
        party: &str,
        filter: &str,
        account_id: Uuid,
    ) -> LedgerResult<Vec<OfferWithCounterparty>> {
        let sql = format!(
            r#"
            SELECT o.id AS offer_id,
                   o.{party} AS party_id,
                   COALESCE(pf.name, '') AS party_name,
                   COALESCE(pf.city, '') AS party_city,
                   COALESCE(pf.image_url, '') AS party_image,
                   p.id AS product_id,
                   p.name AS product_name,
                   p.price AS product_price,
                   COALESCE(p.thumbnail, '') AS product_image,
                   o.price_offer, o.accepted, o.updated_at
            FROM offers o
            JOIN products p ON p.id = o.product_id
            LEFT JOIN profiles pf ON pf.id = o.{party}
            WHERE o.{filter} = $1 AND NOT o.deleted
            ORDER BY o.created_at, o.id
            "#
        );

        let rows = sqlx::query_as::<_, CounterpartyOfferRow>(&sql)
            .bind(account_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error("list offers", e))?;

        Ok(rows
            .into_iter()
            .map(|row| OfferWithCounterparty {
                offer_id: row.offer_id,
                counterparty: ProfileSummary {
                    id: row.party_id,
                    name: row.party_name,
                    city: row.party_city,
                    image: row.party_image,
                },
                product: ProductSummary {
                    id: row.product_id,
                    name: row.product_name,
                    price: row.product_price,
                    image: row.product_image,
                },
                price_offer: row.price_offer,
                accepted: row.accepted,
                updated_at: row.updated_at,
            })
            .collect())
    }
}

#[async_trait]
impl OfferRepository for PgOfferRepository {
    async fn insert_offer(&self, offer: &OfferRecord) -> LedgerResult<bool> {
        // FOR SHARE orders this insert against a concurrent `set_sold` on
        // the same product row.
        let result = sqlx::query(
            r#"
            INSERT INTO offers (id, product_id, buyer_id, seller_id, price_offer, accepted, created_at, updated_at)
            SELECT $1, p.id, $3, $4, $5, $6, $7, $8
            FROM products p
            WHERE p.id = $2 AND p.account_id = $4
              AND p.published AND NOT p.sold AND NOT p.deleted
            FOR SHARE
            "#,
        )
        .bind(offer.id)
        .bind(offer.product_id)
        .bind(offer.buyer_id)
        .bind(offer.seller_id)
        .bind(offer.price_offer)
        .bind(offer.accepted)
        .bind(offer.created_at)
        .bind(offer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("insert offer", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_offer(&self, id: Uuid) -> LedgerResult<Option<OfferRecord>> {
        let sql = format!("SELECT {OFFER_COLUMNS} FROM offers WHERE id = $1 AND NOT deleted");
        let row = sqlx::query_as::<_, OfferRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("fetch offer", e))?;

        Ok(row.map(OfferRecord::from))
    }

    async fn revise_price(
        &self,
        id: Uuid,
        buyer_id: Uuid,
        price: i64,
        at: DateTime<Utc>,
    ) -> LedgerResult<Option<OfferRecord>> {
        let sql = format!(
            r#"
            UPDATE offers
            SET price_offer = $3, updated_at = $4
            WHERE id = $1 AND buyer_id = $2 AND NOT accepted AND NOT deleted
            RETURNING {OFFER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, OfferRow>(&sql)
            .bind(id)
            .bind(buyer_id)
            .bind(price)
            .bind(at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("revise offer", e))?;

        Ok(row.map(OfferRecord::from))
    }

    async fn set_accepted(
        &self,
        id: Uuid,
        scope: SellerScope,
        target: bool,
        at: DateTime<Utc>,
    ) -> LedgerResult<Option<OfferRecord>> {
        // The sibling check only applies when accepting; the partial unique
        // index catches whatever slips between two concurrent statements.
        let sql = format!(
            r#"
            UPDATE offers o
            SET accepted = $2, updated_at = $3
            WHERE o.id = $1
              AND NOT o.deleted
              AND o.accepted = NOT $2
              AND ($4::uuid IS NULL OR o.seller_id = $4)
              AND (NOT $2 OR NOT EXISTS (
                    SELECT 1 FROM offers s
                    WHERE s.product_id = o.product_id
                      AND s.id <> o.id
                      AND s.accepted
                      AND NOT s.deleted))
            RETURNING {OFFER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, OfferRow>(&sql)
            .bind(id)
            .bind(target)
            .bind(at)
            .bind(scope.seller_id())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("update offer acceptance", e))?;

        Ok(row.map(OfferRecord::from))
    }

    async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> LedgerResult<bool> {
        let result = sqlx::query(
            "UPDATE offers SET deleted = TRUE, updated_at = $2 WHERE id = $1 AND NOT deleted",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("delete offer", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn retire_unaccepted(&self, product_id: Uuid, at: DateTime<Utc>) -> LedgerResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE offers SET deleted = TRUE, updated_at = $2
            WHERE product_id = $1 AND NOT accepted AND NOT deleted
            "#,
        )
        .bind(product_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("retire offers", e))?;

        Ok(result.rows_affected())
    }

    async fn offers_for_product(&self, product_id: Uuid) -> LedgerResult<Vec<OfferWithBuyer>> {
        let rows = sqlx::query_as::<_, BuyerOfferRow>(
            r#"
            SELECT o.id AS offer_id,
                   o.buyer_id,
                   COALESCE(pf.name, '') AS buyer_name,
                   COALESCE(pf.city, '') AS buyer_city,
                   COALESCE(pf.image_url, '') AS buyer_image,
                   o.price_offer, o.accepted, o.created_at, o.updated_at
            FROM offers o
            LEFT JOIN profiles pf ON pf.id = o.buyer_id
            WHERE o.product_id = $1 AND NOT o.deleted
            ORDER BY o.created_at, o.id
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("list offers for product", e))?;

        Ok(rows
            .into_iter()
            .map(|row| OfferWithBuyer {
                offer_id: row.offer_id,
                buyer: ProfileSummary {
                    id: row.buyer_id,
                    name: row.buyer_name,
                    city: row.buyer_city,
                    image: row.buyer_image,
                },
                price_offer: row.price_offer,
                accepted: row.accepted,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect())
    }

    async fn offers_by_buyer(
        &self,
        buyer_id: Uuid,
        seller_id: Uuid,
    ) -> LedgerResult<Vec<OfferWithProduct>> {
        let rows = sqlx::query_as::<_, ProductOfferRow>(
            r#"
            SELECT o.id AS offer_id,
                   p.id AS product_id,
                   p.name AS product_name,
                   p.price AS product_price,
                   COALESCE(p.thumbnail, '') AS product_image,
                   o.price_offer, o.accepted, o.updated_at
            FROM offers o
            JOIN products p ON p.id = o.product_id
            WHERE o.buyer_id = $1 AND o.seller_id = $2 AND NOT o.deleted
            ORDER BY o.created_at, o.id
            "#,
        )
        .bind(buyer_id)
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("list offers by buyer", e))?;

        Ok(rows
            .into_iter()
            .map(|row| OfferWithProduct {
                offer_id: row.offer_id,
                product: ProductSummary {
                    id: row.product_id,
                    name: row.product_name,
                    price: row.product_price,
                    image: row.product_image,
                },
                price_offer: row.price_offer,
                accepted: row.accepted,
                updated_at: row.updated_at,
            })
            .collect())
    }

    async fn offers_received(&self, seller_id: Uuid) -> LedgerResult<Vec<OfferWithCounterparty>> {
        self.with_counterparty("buyer_id", "seller_id", seller_id).await
    }

    async fn offers_placed(&self, buyer_id: Uuid) -> LedgerResult<Vec<OfferWithCounterparty>> {
        self.with_counterparty("seller_id", "buyer_id", buyer_id).await
    }

    async fn offer_detail(&self, id: Uuid) -> LedgerResult<Option<OfferDetail>> {
        let row = sqlx::query_as::<_, DetailRow>(
            r#"
            SELECT o.id AS offer_id,
                   p.id AS product_id,
                   p.name AS product_name,
                   p.price AS product_price,
                   COALESCE(p.thumbnail, '') AS product_image,
                   o.buyer_id,
                   COALESCE(b.name, '') AS buyer_name,
                   COALESCE(b.city, '') AS buyer_city,
                   COALESCE(b.image_url, '') AS buyer_image,
                   o.seller_id,
                   COALESCE(s.name, '') AS seller_name,
                   COALESCE(s.city, '') AS seller_city,
                   COALESCE(s.image_url, '') AS seller_image,
                   o.price_offer, o.accepted, o.created_at, o.updated_at
            FROM offers o
            JOIN products p ON p.id = o.product_id
            LEFT JOIN profiles b ON b.id = o.buyer_id
            LEFT JOIN profiles s ON s.id = o.seller_id
            WHERE o.id = $1 AND NOT o.deleted
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("fetch offer detail", e))?;

        Ok(row.map(|row| OfferDetail {
            offer_id: row.offer_id,
            product: ProductSummary {
                id: row.product_id,
                name: row.product_name,
                price: row.product_price,
                image: row.product_image,
            },
            buyer: ProfileSummary {
                id: row.buyer_id,
                name: row.buyer_name,
                city: row.buyer_city,
                image: row.buyer_image,
            },
            seller: ProfileSummary {
                id: row.seller_id,
                name: row.seller_name,
                city: row.seller_city,
                image: row.seller_image,
            },
            price_offer: row.price_offer,
            accepted: row.accepted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }
}
