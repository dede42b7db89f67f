use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct OfferCreatedEvent {
    pub offer_id: Uuid,
    pub product_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub price_offer: i64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct OfferRevisedEvent {
    pub offer_id: Uuid,
    pub buyer_id: Uuid,
    pub price_offer: i64,
    pub timestamp: i64,
}

/// Fired once per real acceptance flip, never for a no-op.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct OfferAcceptanceEvent {
    pub offer_id: Uuid,
    pub product_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub price_offer: i64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct OfferWithdrawnEvent {
    pub offer_id: Uuid,
    pub withdrawn_by: Uuid,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct OffersRetiredEvent {
    pub product_id: Uuid,
    pub retired: u64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferEvent {
    Created(OfferCreatedEvent),
    Revised(OfferRevisedEvent),
    Accepted(OfferAcceptanceEvent),
    Unaccepted(OfferAcceptanceEvent),
    Withdrawn(OfferWithdrawnEvent),
    Retired(OffersRetiredEvent),
}

impl OfferEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OfferEvent::Created(_) => "offer_created",
            OfferEvent::Revised(_) => "offer_revised",
            OfferEvent::Accepted(_) => "offer_accepted",
            OfferEvent::Unaccepted(_) => "offer_unaccepted",
            OfferEvent::Withdrawn(_) => "offer_withdrawn",
            OfferEvent::Retired(_) => "offers_retired",
        }
    }
}
