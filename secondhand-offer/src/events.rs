use chrono::Utc;
use secondhand_core::OfferRecord;
use secondhand_shared::models::events::{
    OfferAcceptanceEvent, OfferCreatedEvent, OfferEvent, OfferRevisedEvent, OfferWithdrawnEvent,
    OffersRetiredEvent,
};
use tokio::sync::broadcast;
use uuid::Uuid;

/// In-process fan-out of ledger transitions.
///
/// Sending with no subscribers is not an error; events are simply dropped.
#[derive(Clone)]
pub struct OfferTelemetry {
    tx: broadcast::Sender<OfferEvent>,
}

impl OfferTelemetry {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OfferEvent> {
        self.tx.subscribe()
    }

    pub fn log_offer_created(&self, offer: &OfferRecord) {
        self.publish(OfferEvent::Created(OfferCreatedEvent {
            offer_id: offer.id,
            product_id: offer.product_id,
            buyer_id: offer.buyer_id,
            seller_id: offer.seller_id,
            price_offer: offer.price_offer,
            timestamp: offer.created_at.timestamp(),
        }));
    }

    pub fn log_offer_revised(&self, offer: &OfferRecord) {
        self.publish(OfferEvent::Revised(OfferRevisedEvent {
            offer_id: offer.id,
            buyer_id: offer.buyer_id,
            price_offer: offer.price_offer,
            timestamp: offer.updated_at.timestamp(),
        }));
    }

    pub fn log_acceptance_changed(&self, offer: &OfferRecord) {
        let event = OfferAcceptanceEvent {
            offer_id: offer.id,
            product_id: offer.product_id,
            buyer_id: offer.buyer_id,
            seller_id: offer.seller_id,
            price_offer: offer.price_offer,
            timestamp: offer.updated_at.timestamp(),
        };
        if offer.accepted {
            self.publish(OfferEvent::Accepted(event));
        } else {
            self.publish(OfferEvent::Unaccepted(event));
        }
    }

    pub fn log_offer_withdrawn(&self, offer_id: Uuid, withdrawn_by: Uuid) {
        self.publish(OfferEvent::Withdrawn(OfferWithdrawnEvent {
            offer_id,
            withdrawn_by,
            timestamp: Utc::now().timestamp(),
        }));
    }

    pub fn log_offers_retired(&self, product_id: Uuid, retired: u64) {
        self.publish(OfferEvent::Retired(OffersRetiredEvent {
            product_id,
            retired,
            timestamp: Utc::now().timestamp(),
        }));
    }

    fn publish(&self, event: OfferEvent) {
        let name = event.name();
        match self.tx.send(event) {
            Ok(receivers) => tracing::debug!("Published {} to {} subscriber(s)", name, receivers),
            Err(_) => tracing::trace!("No subscribers for {}", name),
        }
    }
}

impl Default for OfferTelemetry {
    fn default() -> Self {
        Self::new(100)
    }
}
