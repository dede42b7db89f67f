use std::sync::Arc;

use chrono::Utc;
use secondhand_core::repository::{OfferRepository, ProductGate, ProfileDirectory};
use secondhand_core::{
    LedgerError, LedgerResult, OfferDetail, OfferRecord, OfferWithCounterparty, OfferWithProduct,
    ProductOffers, Requester, SellerScope,
};
use secondhand_shared::models::OfferEvent;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use crate::events::OfferTelemetry;
use crate::models::{AcceptanceChange, NewOffer, OfferStatus};
use crate::rules;

/// Owns the offer lifecycle: create, revise, accept, withdraw and the
/// read models around them.
///
/// Every mutation is a single guarded write against the repository; the
/// ledger holds no locks of its own and relies on the store for atomicity.
#[derive(Clone)]
pub struct OfferLedger {
    offers: Arc<dyn OfferRepository>,
    products: Arc<dyn ProductGate>,
    profiles: Arc<dyn ProfileDirectory>,
    telemetry: OfferTelemetry,
}

impl OfferLedger {
    pub fn new(
        offers: Arc<dyn OfferRepository>,
        products: Arc<dyn ProductGate>,
        profiles: Arc<dyn ProfileDirectory>,
    ) -> Self {
        Self {
            offers,
            products,
            profiles,
            telemetry: OfferTelemetry::default(),
        }
    }

    pub fn with_telemetry(mut self, telemetry: OfferTelemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OfferEvent> {
        self.telemetry.subscribe()
    }

    /// Open a new offer on a published, unsold listing.
    pub async fn create_offer(
        &self,
        buyer_id: Uuid,
        product_id: Uuid,
        price: i64,
    ) -> LedgerResult<OfferRecord> {
        rules::validate_price(price)?;

        let complete = self.profiles.is_complete(buyer_id).await?;
        rules::ensure_profile_complete(complete)?;

        // Ineligible (sold, unpublished, deleted) and missing look the same.
        let seller_id = self
            .products
            .eligible_seller(product_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("product", product_id))?;

        rules::ensure_distinct_parties(seller_id, buyer_id)?;

        let record = NewOffer {
            product_id,
            buyer_id,
            seller_id,
            price_offer: price,
        }
        .into_record(Utc::now());

        // The product may have been sold since the lookup above.
        if !self.offers.insert_offer(&record).await? {
            debug!("Product {} stopped taking offers before insert", product_id);
            return Err(LedgerError::not_found("product", product_id));
        }
        info!(
            "Offer {} created on product {} by buyer {} at {}",
            record.id, product_id, buyer_id, price
        );
        self.telemetry.log_offer_created(&record);

        Ok(record)
    }

    /// Change the price of an open offer. Only its buyer may do this.
    pub async fn revise_offer(
        &self,
        offer_id: Uuid,
        buyer_id: Uuid,
        new_price: i64,
    ) -> LedgerResult<OfferRecord> {
        rules::validate_price(new_price)?;

        let updated = self
            .offers
            .revise_price(offer_id, buyer_id, new_price, Utc::now())
            .await?;

        match updated {
            Some(offer) => {
                info!("Offer {} revised to {}", offer.id, offer.price_offer);
                self.telemetry.log_offer_revised(&offer);
                Ok(offer)
            }
            None => {
                // Missing, not this buyer's, or already accepted.
                debug!("Revision of offer {} by {} matched no open offer", offer_id, buyer_id);
                Err(LedgerError::not_found("offer", offer_id))
            }
        }
    }

    /// Move an offer into `target` acceptance state.
    ///
    /// Repeating a request that already took effect yields
    /// `AcceptanceChange::Unchanged` and fires no event.
    pub async fn set_acceptance(
        &self,
        offer_id: Uuid,
        scope: SellerScope,
        target: bool,
    ) -> LedgerResult<AcceptanceChange> {
        if let Some(offer) = self
            .offers
            .set_accepted(offer_id, scope, target, Utc::now())
            .await?
        {
            info!("Offer {} is now {}", offer.id, OfferStatus::of(&offer));
            self.telemetry.log_acceptance_changed(&offer);
            return Ok(AcceptanceChange::Changed(offer));
        }

        let current = self.visible_to_seller(offer_id, scope).await?;
        if current.accepted == target {
            debug!("Offer {} already {}", offer_id, OfferStatus::of(&current));
            return Ok(AcceptanceChange::Unchanged(current));
        }

        if target {
            Err(LedgerError::bad_request(
                "another offer on this product has already been accepted",
            ))
        } else {
            Err(LedgerError::bad_request(
                "offer changed while updating, try again",
            ))
        }
    }

    /// Flip acceptance and return the new state.
    pub async fn toggle_acceptance(&self, offer_id: Uuid, scope: SellerScope) -> LedgerResult<bool> {
        let current = self.visible_to_seller(offer_id, scope).await?;
        let target = OfferStatus::of(&current).toggled().accepted_flag();

        let change = self.set_acceptance(offer_id, scope, target).await?;
        Ok(change.accepted())
    }

    /// Soft-delete an offer on behalf of its buyer, its seller or an admin.
    pub async fn withdraw_offer(&self, offer_id: Uuid, requester: &Requester) -> LedgerResult<()> {
        let offer = self
            .offers
            .find_offer(offer_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("offer", offer_id))?;

        requester.authorize(
            &[offer.buyer_id, offer.seller_id],
            "only buyer, seller, and admin can withdraw an offer",
        )?;

        if !self.offers.soft_delete(offer_id, Utc::now()).await? {
            return Err(LedgerError::not_found("offer", offer_id));
        }

        info!("Offer {} withdrawn by {}", offer_id, requester.id);
        self.telemetry.log_offer_withdrawn(offer_id, requester.id);
        Ok(())
    }

    /// Soft-delete every unaccepted offer on a product, typically once it
    /// has been marked sold. Returns how many offers were retired.
    pub async fn retire_open_offers(&self, product_id: Uuid) -> LedgerResult<u64> {
        let retired = self.offers.retire_unaccepted(product_id, Utc::now()).await?;
        if retired > 0 {
            info!("Retired {} open offer(s) on product {}", retired, product_id);
            self.telemetry.log_offers_retired(product_id, retired);
        }
        Ok(retired)
    }

    /// Seller review screen for one product.
    pub async fn offers_for_product(
        &self,
        product_id: Uuid,
        requester: &Requester,
    ) -> LedgerResult<ProductOffers> {
        let product = self
            .products
            .find_product(product_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("product", product_id))?;

        requester.authorize(
            &[product.owner_id],
            "only the seller and admin can view offers on a product",
        )?;

        let offers = self.offers.offers_for_product(product_id).await?;
        Ok(ProductOffers {
            owner_id: product.owner_id,
            product: product.summary(),
            offers,
        })
    }

    pub async fn offers_by_buyer(
        &self,
        buyer_id: Uuid,
        seller_id: Uuid,
    ) -> LedgerResult<Vec<OfferWithProduct>> {
        self.offers.offers_by_buyer(buyer_id, seller_id).await
    }

    pub async fn offers_received(&self, seller_id: Uuid) -> LedgerResult<Vec<OfferWithCounterparty>> {
        self.offers.offers_received(seller_id).await
    }

    pub async fn offers_placed(&self, buyer_id: Uuid) -> LedgerResult<Vec<OfferWithCounterparty>> {
        self.offers.offers_placed(buyer_id).await
    }

    /// Full joined view. Unauthorized callers learn the offer exists.
    pub async fn offer_detail(&self, offer_id: Uuid, requester: &Requester) -> LedgerResult<OfferDetail> {
        let detail = self
            .offers
            .offer_detail(offer_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("offer", offer_id))?;

        requester.authorize(
            &[detail.buyer.id, detail.seller.id],
            "only buyer, seller, and admin can access",
        )?;

        Ok(detail)
    }

    async fn visible_to_seller(&self, offer_id: Uuid, scope: SellerScope) -> LedgerResult<OfferRecord> {
        self.offers
            .find_offer(offer_id)
            .await?
            .filter(|offer| scope.admits(offer.seller_id))
            .ok_or_else(|| LedgerError::not_found("offer", offer_id))
    }
}
