use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted offer row. Deleted rows never leave the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OfferRecord {
    pub id: Uuid,
    pub product_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub price_offer: i64,
    pub accepted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the product gate knows about a listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductFacts {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub price: i64,
    pub thumbnail: String,
    pub sold: bool,
    pub published: bool,
}

impl ProductFacts {
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id,
            name: self.name.clone(),
            price: self.price,
            image: self.thumbnail.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub image: String,
}

/// Public part of an account profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileSummary {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OfferWithBuyer {
    pub offer_id: Uuid,
    pub buyer: ProfileSummary,
    pub price_offer: i64,
    pub accepted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Seller review screen: one product and every live offer on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductOffers {
    pub owner_id: Uuid,
    pub product: ProductSummary,
    pub offers: Vec<OfferWithBuyer>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OfferWithProduct {
    pub offer_id: Uuid,
    pub product: ProductSummary,
    pub price_offer: i64,
    pub accepted: bool,
    pub updated_at: DateTime<Utc>,
}

/// Listing row for "offers I received" / "offers I placed".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OfferWithCounterparty {
    pub offer_id: Uuid,
    pub counterparty: ProfileSummary,
    pub product: ProductSummary,
    pub price_offer: i64,
    pub accepted: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OfferDetail {
    pub offer_id: Uuid,
    pub product: ProductSummary,
    pub buyer: ProfileSummary,
    pub seller: ProfileSummary,
    pub price_offer: i64,
    pub accepted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
