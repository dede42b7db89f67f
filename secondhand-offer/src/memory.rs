use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secondhand_core::repository::{OfferRepository, ProductGate, ProfileDirectory, SaleRegistry};
use secondhand_core::{
    LedgerResult, OfferDetail, OfferRecord, OfferWithBuyer, OfferWithCounterparty,
    OfferWithProduct, ProductFacts, ProductSummary, ProfileSummary, SellerScope,
};
use uuid::Uuid;

use crate::models::OfferStatus;

/// An account profile as the directory stores it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub address: String,
    pub phone_number: String,
    pub image_url: String,
}

impl ProfileRecord {
    /// A profile with every field the completeness check looks at.
    pub fn complete(id: Uuid, name: &str, city: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            city: city.to_string(),
            address: format!("Jl. {} No. 1", name),
            phone_number: "081234567890".to_string(),
            image_url: String::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.name.is_empty()
            && !self.city.is_empty()
            && !self.address.is_empty()
            && !self.phone_number.is_empty()
    }

    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            id: self.id,
            name: self.name.clone(),
            city: self.city.clone(),
            image: self.image_url.clone(),
        }
    }
}

/// An offer row including its soft-delete flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredOffer {
    pub record: OfferRecord,
    pub deleted: bool,
    seq: u64,
}

#[derive(Debug, Clone)]
struct StoredProduct {
    facts: ProductFacts,
    deleted: bool,
}

#[derive(Default)]
struct Inner {
    offers: HashMap<Uuid, StoredOffer>,
    products: HashMap<Uuid, StoredProduct>,
    profiles: HashMap<Uuid, ProfileRecord>,
    next_seq: u64,
}

impl Inner {
    fn profile_summary(&self, id: Uuid) -> ProfileSummary {
        self.profiles
            .get(&id)
            .map(ProfileRecord::summary)
            .unwrap_or_else(|| ProfileSummary {
                id,
                ..Default::default()
            })
    }

    fn product_summary(&self, id: Uuid) -> Option<ProductSummary> {
        self.products.get(&id).map(|p| p.facts.summary())
    }

    /// Live offers matching `pred`, in creation order.
    fn live_offers<F>(&self, pred: F) -> Vec<&OfferRecord>
    where
        F: Fn(&OfferRecord) -> bool,
    {
        let mut rows: Vec<&StoredOffer> = self
            .offers
            .values()
            .filter(|o| !o.deleted && pred(&o.record))
            .collect();
        rows.sort_by_key(|o| (o.record.created_at, o.seq));
        rows.into_iter().map(|o| &o.record).collect()
    }

    fn with_counterparty(&self, offer: &OfferRecord, counterparty: Uuid) -> Option<OfferWithCounterparty> {
        Some(OfferWithCounterparty {
            offer_id: offer.id,
            counterparty: self.profile_summary(counterparty),
            product: self.product_summary(offer.product_id)?,
            price_offer: offer.price_offer,
            accepted: offer.accepted,
            updated_at: offer.updated_at,
        })
    }
}

/// Process-local store implementing every collaborator trait.
///
/// Each trait call takes the mutex once, so a call behaves like a single SQL
/// statement: guard predicates and writes are evaluated together.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_product(&self, facts: ProductFacts) {
        self.lock().products.insert(
            facts.id,
            StoredProduct {
                facts,
                deleted: false,
            },
        );
    }

    pub fn delete_product(&self, id: Uuid) -> bool {
        match self.lock().products.get_mut(&id) {
            Some(product) => {
                product.deleted = true;
                true
            }
            None => false,
        }
    }

    pub fn set_published(&self, id: Uuid, published: bool) -> bool {
        match self.lock().products.get_mut(&id) {
            Some(product) => {
                product.facts.published = published;
                true
            }
            None => false,
        }
    }

    pub fn insert_profile(&self, profile: ProfileRecord) {
        self.lock().profiles.insert(profile.id, profile);
    }

    /// Raw row lookup that ignores the soft-delete flag.
    pub fn stored_offer(&self, id: Uuid) -> Option<StoredOffer> {
        self.lock().offers.get(&id).cloned()
    }
}

#[async_trait]
impl OfferRepository for MemoryStore {
    async fn insert_offer(&self, offer: &OfferRecord) -> LedgerResult<bool> {
        let mut inner = self.lock();
        let eligible = inner.products.get(&offer.product_id).is_some_and(|p| {
            !p.deleted && !p.facts.sold && p.facts.published && p.facts.owner_id == offer.seller_id
        });
        if !eligible {
            return Ok(false);
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.offers.insert(
            offer.id,
            StoredOffer {
                record: offer.clone(),
                deleted: false,
                seq,
            },
        );
        Ok(true)
    }

    async fn find_offer(&self, id: Uuid) -> LedgerResult<Option<OfferRecord>> {
        Ok(self
            .lock()
            .offers
            .get(&id)
            .filter(|o| !o.deleted)
            .map(|o| o.record.clone()))
    }

    async fn revise_price(
        &self,
        id: Uuid,
        buyer_id: Uuid,
        price: i64,
        at: DateTime<Utc>,
    ) -> LedgerResult<Option<OfferRecord>> {
        let mut inner = self.lock();
        let Some(stored) = inner.offers.get_mut(&id) else {
            return Ok(None);
        };
        if stored.deleted
            || !OfferStatus::of(&stored.record).is_revisable()
            || stored.record.buyer_id != buyer_id
        {
            return Ok(None);
        }

        stored.record.price_offer = price;
        stored.record.updated_at = at;
        Ok(Some(stored.record.clone()))
    }

    async fn set_accepted(
        &self,
        id: Uuid,
        scope: SellerScope,
        target: bool,
        at: DateTime<Utc>,
    ) -> LedgerResult<Option<OfferRecord>> {
        let mut inner = self.lock();
        let Some(stored) = inner.offers.get(&id) else {
            return Ok(None);
        };
        if stored.deleted || !scope.admits(stored.record.seller_id) || stored.record.accepted == target {
            return Ok(None);
        }

        let product_id = stored.record.product_id;
        if target {
            let sibling_accepted = inner.offers.values().any(|o| {
                !o.deleted && o.record.accepted && o.record.product_id == product_id && o.record.id != id
            });
            if sibling_accepted {
                return Ok(None);
            }
        }

        let Some(stored) = inner.offers.get_mut(&id) else {
            return Ok(None);
        };
        stored.record.accepted = target;
        stored.record.updated_at = at;
        Ok(Some(stored.record.clone()))
    }

    async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> LedgerResult<bool> {
        let mut inner = self.lock();
        match inner.offers.get_mut(&id) {
            Some(stored) if !stored.deleted => {
                stored.deleted = true;
                stored.record.updated_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn retire_unaccepted(&self, product_id: Uuid, at: DateTime<Utc>) -> LedgerResult<u64> {
        let mut inner = self.lock();
        let mut retired = 0;
        for stored in inner.offers.values_mut() {
            if !stored.deleted && !stored.record.accepted && stored.record.product_id == product_id {
                stored.deleted = true;
                stored.record.updated_at = at;
                retired += 1;
            }
        }
        Ok(retired)
    }

    async fn offers_for_product(&self, product_id: Uuid) -> LedgerResult<Vec<OfferWithBuyer>> {
        let inner = self.lock();
        if !inner.products.contains_key(&product_id) {
            return Ok(Vec::new());
        }
        Ok(inner
            .live_offers(|o| o.product_id == product_id)
            .into_iter()
            .map(|o| OfferWithBuyer {
                offer_id: o.id,
                buyer: inner.profile_summary(o.buyer_id),
                price_offer: o.price_offer,
                accepted: o.accepted,
                created_at: o.created_at,
                updated_at: o.updated_at,
            })
            .collect())
    }

    async fn offers_by_buyer(
        &self,
        buyer_id: Uuid,
        seller_id: Uuid,
    ) -> LedgerResult<Vec<OfferWithProduct>> {
        let inner = self.lock();
        Ok(inner
            .live_offers(|o| o.buyer_id == buyer_id && o.seller_id == seller_id)
            .into_iter()
            .filter_map(|o| {
                Some(OfferWithProduct {
                    offer_id: o.id,
                    product: inner.product_summary(o.product_id)?,
                    price_offer: o.price_offer,
                    accepted: o.accepted,
                    updated_at: o.updated_at,
                })
            })
            .collect())
    }

    async fn offers_received(&self, seller_id: Uuid) -> LedgerResult<Vec<OfferWithCounterparty>> {
        let inner = self.lock();
        Ok(inner
            .live_offers(|o| o.seller_id == seller_id)
            .into_iter()
            .filter_map(|o| inner.with_counterparty(o, o.buyer_id))
            .collect())
    }

    async fn offers_placed(&self, buyer_id: Uuid) -> LedgerResult<Vec<OfferWithCounterparty>> {
        let inner = self.lock();
        Ok(inner
            .live_offers(|o| o.buyer_id == buyer_id)
            .into_iter()
            .filter_map(|o| inner.with_counterparty(o, o.seller_id))
            .collect())
    }

    async fn offer_detail(&self, id: Uuid) -> LedgerResult<Option<OfferDetail>> {
        let inner = self.lock();
        let Some(stored) = inner.offers.get(&id).filter(|o| !o.deleted) else {
            return Ok(None);
        };
        let offer = &stored.record;
        let Some(product) = inner.product_summary(offer.product_id) else {
            return Ok(None);
        };

        Ok(Some(OfferDetail {
            offer_id: offer.id,
            product,
            buyer: inner.profile_summary(offer.buyer_id),
            seller: inner.profile_summary(offer.seller_id),
            price_offer: offer.price_offer,
            accepted: offer.accepted,
            created_at: offer.created_at,
            updated_at: offer.updated_at,
        }))
    }
}

#[async_trait]
impl ProductGate for MemoryStore {
    async fn eligible_seller(&self, product_id: Uuid) -> LedgerResult<Option<Uuid>> {
        Ok(self
            .lock()
            .products
            .get(&product_id)
            .filter(|p| !p.deleted && !p.facts.sold && p.facts.published)
            .map(|p| p.facts.owner_id))
    }

    async fn find_product(&self, product_id: Uuid) -> LedgerResult<Option<ProductFacts>> {
        Ok(self
            .lock()
            .products
            .get(&product_id)
            .filter(|p| !p.deleted)
            .map(|p| p.facts.clone()))
    }
}

#[async_trait]
impl SaleRegistry for MemoryStore {
    async fn set_sold(&self, product_id: Uuid, sold: bool) -> LedgerResult<bool> {
        match self.lock().products.get_mut(&product_id) {
            Some(product) if !product.deleted => {
                product.facts.sold = sold;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl ProfileDirectory for MemoryStore {
    async fn is_complete(&self, account_id: Uuid) -> LedgerResult<bool> {
        Ok(self
            .lock()
            .profiles
            .get(&account_id)
            .map(ProfileRecord::is_complete)
            .unwrap_or(false))
    }

    async fn profile_summary(&self, account_id: Uuid) -> LedgerResult<Option<ProfileSummary>> {
        Ok(self.lock().profiles.get(&account_id).map(ProfileRecord::summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(owner_id: Uuid) -> ProductFacts {
        ProductFacts {
            id: Uuid::new_v4(),
            owner_id,
            name: "Sepeda lipat".to_string(),
            price: 1_500_000,
            thumbnail: String::new(),
            sold: false,
            published: true,
        }
    }

    #[test]
    fn test_profile_completeness_requires_all_fields() {
        let mut profile = ProfileRecord::complete(Uuid::new_v4(), "Budi", "Bandung");
        assert!(profile.is_complete());

        profile.phone_number.clear();
        assert!(!profile.is_complete());
    }

    #[tokio::test]
    async fn test_gate_hides_sold_and_unpublished_products() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let listing = product(owner);
        let id = listing.id;
        store.insert_product(listing);

        assert_eq!(store.eligible_seller(id).await.unwrap(), Some(owner));

        store.set_sold(id, true).await.unwrap();
        assert_eq!(store.eligible_seller(id).await.unwrap(), None);
        assert!(store.find_product(id).await.unwrap().is_some());

        store.set_sold(id, false).await.unwrap();
        store.set_published(id, false);
        assert_eq!(store.eligible_seller(id).await.unwrap(), None);

        store.delete_product(id);
        assert!(store.find_product(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_requires_an_eligible_product() {
        let store = MemoryStore::new();
        let seller = Uuid::new_v4();
        let listing = product(seller);
        let product_id = listing.id;
        store.insert_product(listing);

        let offer = |seller_id| {
            crate::models::NewOffer {
                product_id,
                buyer_id: Uuid::new_v4(),
                seller_id,
                price_offer: 100,
            }
            .into_record(Utc::now())
        };

        // Owner mismatch
        let stale = offer(Uuid::new_v4());
        assert!(!store.insert_offer(&stale).await.unwrap());
        assert!(store.stored_offer(stale.id).is_none());

        store.set_sold(product_id, true).await.unwrap();
        let late = offer(seller);
        assert!(!store.insert_offer(&late).await.unwrap());
        assert!(store.stored_offer(late.id).is_none());

        store.set_sold(product_id, false).await.unwrap();
        assert!(store.insert_offer(&offer(seller)).await.unwrap());
    }

    #[tokio::test]
    async fn test_set_accepted_guards_sibling_offers() {
        let store = MemoryStore::new();
        let seller = Uuid::new_v4();
        let listing = product(seller);
        let product_id = listing.id;
        store.insert_product(listing);

        let now = Utc::now();
        let first = crate::models::NewOffer {
            product_id,
            buyer_id: Uuid::new_v4(),
            seller_id: seller,
            price_offer: 100,
        }
        .into_record(now);
        let second = crate::models::NewOffer {
            product_id,
            buyer_id: Uuid::new_v4(),
            seller_id: seller,
            price_offer: 120,
        }
        .into_record(now);
        assert!(store.insert_offer(&first).await.unwrap());
        assert!(store.insert_offer(&second).await.unwrap());

        let scope = SellerScope::Seller(seller);
        assert!(store.set_accepted(first.id, scope, true, now).await.unwrap().is_some());
        assert!(store.set_accepted(second.id, scope, true, now).await.unwrap().is_none());
        // Same-state write matches zero rows.
        assert!(store.set_accepted(first.id, scope, true, now).await.unwrap().is_none());

        let retired = store.retire_unaccepted(product_id, now).await.unwrap();
        assert_eq!(retired, 1);
        assert!(store.stored_offer(second.id).unwrap().deleted);
        assert!(!store.stored_offer(first.id).unwrap().deleted);
    }
}
