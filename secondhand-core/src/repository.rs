use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::identity::SellerScope;
use crate::models::{
    OfferDetail, OfferRecord, OfferWithBuyer, OfferWithCounterparty, OfferWithProduct,
    ProductFacts, ProfileSummary,
};
use crate::LedgerResult;

/// Storage for offers.
///
/// Every read excludes soft-deleted rows. Mutations that return `Option` or
/// `bool` report "the guard predicate matched zero rows" as `None`/`false`
/// instead of an error; the ledger decides what that means.
#[async_trait]
pub trait OfferRepository: Send + Sync {
    /// Inserts only while the product is still published, unsold, not
    /// deleted and owned by `offer.seller_id`. Returns `false` otherwise.
    async fn insert_offer(&self, offer: &OfferRecord) -> LedgerResult<bool>;

    async fn find_offer(&self, id: Uuid) -> LedgerResult<Option<OfferRecord>>;

    /// `UPDATE .. WHERE id AND buyer_id AND NOT accepted AND NOT deleted`.
    async fn revise_price(
        &self,
        id: Uuid,
        buyer_id: Uuid,
        price: i64,
        at: DateTime<Utc>,
    ) -> LedgerResult<Option<OfferRecord>>;

    /// Sets `accepted = target` only when the row is live, admitted by
    /// `scope`, currently `!target` and, for `target = true`, no other live
    /// offer on the same product is accepted.
    async fn set_accepted(
        &self,
        id: Uuid,
        scope: SellerScope,
        target: bool,
        at: DateTime<Utc>,
    ) -> LedgerResult<Option<OfferRecord>>;

    async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> LedgerResult<bool>;

    /// Soft-deletes every live, unaccepted offer on a product.
    async fn retire_unaccepted(&self, product_id: Uuid, at: DateTime<Utc>) -> LedgerResult<u64>;

    async fn offers_for_product(&self, product_id: Uuid) -> LedgerResult<Vec<OfferWithBuyer>>;

    async fn offers_by_buyer(
        &self,
        buyer_id: Uuid,
        seller_id: Uuid,
    ) -> LedgerResult<Vec<OfferWithProduct>>;

    /// Offers on the seller's products; counterparty is the buyer.
    async fn offers_received(&self, seller_id: Uuid) -> LedgerResult<Vec<OfferWithCounterparty>>;

    /// Offers the buyer placed; counterparty is the seller.
    async fn offers_placed(&self, buyer_id: Uuid) -> LedgerResult<Vec<OfferWithCounterparty>>;

    async fn offer_detail(&self, id: Uuid) -> LedgerResult<Option<OfferDetail>>;
}

/// Ownership and eligibility facts about listings.
#[async_trait]
pub trait ProductGate: Send + Sync {
    /// Owner of a product that is published, unsold and not deleted.
    async fn eligible_seller(&self, product_id: Uuid) -> LedgerResult<Option<Uuid>>;

    /// Any non-deleted product, regardless of sale state.
    async fn find_product(&self, product_id: Uuid) -> LedgerResult<Option<ProductFacts>>;
}

/// Sale state writes, used by the orchestration layer only.
#[async_trait]
pub trait SaleRegistry: Send + Sync {
    /// Returns `false` when no live product matched.
    async fn set_sold(&self, product_id: Uuid, sold: bool) -> LedgerResult<bool>;
}

#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Name, city, address and phone number are all filled in.
    /// A missing profile counts as incomplete.
    async fn is_complete(&self, account_id: Uuid) -> LedgerResult<bool>;

    async fn profile_summary(&self, account_id: Uuid) -> LedgerResult<Option<ProfileSummary>>;
}
