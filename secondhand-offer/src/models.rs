use chrono::{DateTime, Utc};
use secondhand_core::OfferRecord;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where an offer sits in the negotiation.
///
/// `Deleted` is not represented: deleted offers are invisible to every read,
/// so a state can only ever be observed for a live row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferStatus {
    Open,
    Accepted,
}

impl OfferStatus {
    pub fn of(offer: &OfferRecord) -> Self {
        if offer.accepted {
            OfferStatus::Accepted
        } else {
            OfferStatus::Open
        }
    }

    /// Buyers may only change the price of an open offer.
    pub fn is_revisable(self) -> bool {
        self == OfferStatus::Open
    }

    pub fn toggled(self) -> Self {
        match self {
            OfferStatus::Open => OfferStatus::Accepted,
            OfferStatus::Accepted => OfferStatus::Open,
        }
    }

    pub fn accepted_flag(self) -> bool {
        self == OfferStatus::Accepted
    }
}

impl std::fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OfferStatus::Open => write!(f, "OPEN"),
            OfferStatus::Accepted => write!(f, "ACCEPTED"),
        }
    }
}

/// A price proposal waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOffer {
    pub product_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub price_offer: i64,
}

impl NewOffer {
    /// Materialize the row: fresh id, open, both timestamps equal.
    pub fn into_record(self, now: DateTime<Utc>) -> OfferRecord {
        OfferRecord {
            id: Uuid::new_v4(),
            product_id: self.product_id,
            buyer_id: self.buyer_id,
            seller_id: self.seller_id,
            price_offer: self.price_offer,
            accepted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Outcome of an acceptance write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptanceChange {
    /// This call flipped the flag.
    Changed(OfferRecord),
    /// The offer was already in the requested state; nothing was written.
    Unchanged(OfferRecord),
}

impl AcceptanceChange {
    pub fn offer(&self) -> &OfferRecord {
        match self {
            AcceptanceChange::Changed(offer) | AcceptanceChange::Unchanged(offer) => offer,
        }
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, AcceptanceChange::Changed(_))
    }

    pub fn accepted(&self) -> bool {
        self.offer().accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_offer() -> NewOffer {
        NewOffer {
            product_id: Uuid::new_v4(),
            buyer_id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            price_offer: 50_000,
        }
    }

    #[test]
    fn test_new_offer_starts_open() {
        let now = Utc::now();
        let record = new_offer().into_record(now);

        assert!(!record.accepted);
        assert_eq!(record.created_at, record.updated_at);
        assert_eq!(OfferStatus::of(&record), OfferStatus::Open);
        assert!(OfferStatus::of(&record).is_revisable());
    }

    #[test]
    fn test_status_toggle_cycle() {
        let status = OfferStatus::Open.toggled();
        assert_eq!(status, OfferStatus::Accepted);
        assert!(!status.is_revisable());
        assert!(status.accepted_flag());
        assert_eq!(status.toggled(), OfferStatus::Open);
    }
}
